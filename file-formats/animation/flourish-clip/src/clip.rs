//! The immutable clip model and its loader

use crate::error::{ClipError, ReferenceKind, Result};
use crate::events::{AnimEvent, EventWindow};
use crate::model::ClipModel;
use crate::part::{AnimPart, ClipId, PartCurves, PartHandle};
use crate::sweep::SweepPointCollection;
use crate::types::Rect;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CLIP_ID: AtomicU64 = AtomicU64::new(1);

/// One exported, named, fixed-duration animation.
///
/// Immutable after construction and safe to share between renderers.
#[derive(Debug)]
pub struct AnimClip {
    id: ClipId,
    name: String,
    duration: f32,
    bounds: Rect,
    export_time_utc: Option<DateTime<Utc>>,
    parts: Vec<AnimPart>,
    events: Vec<AnimEvent>,
    sweeps: HashMap<PartHandle, Vec<SweepPointCollection>>,
}

impl AnimClip {
    /// Parse a clip from its JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let model: ClipModel = serde_json::from_str(json)?;
        Self::from_model(&model)
    }

    /// Parse a clip from a reader over its JSON document
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let model: ClipModel = serde_json::from_reader(reader)?;
        Self::from_model(&model)
    }

    /// Build a clip from an already deserialized document
    pub fn from_model(model: &ClipModel) -> Result<Self> {
        let id = ClipId(NEXT_CLIP_ID.fetch_add(1, Ordering::Relaxed));

        // Parts and the id map
        let mut parts = Vec::with_capacity(model.parts.len());
        let mut id_to_index: HashMap<i32, u32> = HashMap::with_capacity(model.parts.len());
        for (i, part) in model.parts.iter().enumerate() {
            let handle = PartHandle {
                clip: id,
                index: i as u32,
            };
            if id_to_index.insert(part.id, handle.index).is_some() {
                return Err(ClipError::DuplicatePartId(part.id));
            }

            let curves =
                PartCurves::from_model(part).map_err(|(property, e)| ClipError::InvalidCurve {
                    part_id: part.id,
                    property,
                    reason: e.to_string(),
                })?;

            parts.push(AnimPart {
                handle,
                id: part.id,
                path: part.path.clone(),
                custom_name: part.custom_name.clone(),
                texture_path: part.texture_path.clone(),
                transparent_by_default: part.transparent_by_default,
                parent: None,
                children: Vec::new(),
                split_draw_pivot: None,
                curves,
            });
        }

        // Parent, children and split draw pivot
        let resolve = |part_id: i32, referenced_id: i32, kind: ReferenceKind| {
            id_to_index
                .get(&referenced_id)
                .map(|&index| PartHandle { clip: id, index })
                .ok_or(ClipError::MissingPartReference {
                    part_id,
                    referenced_id,
                    kind,
                })
        };
        for (i, part) in model.parts.iter().enumerate() {
            if part.parent_id != 0 {
                let parent = resolve(part.id, part.parent_id, ReferenceKind::Parent)?;
                parts[i].parent = Some(parent);
                let child = parts[i].handle;
                parts[parent.index()].children.push(child);
            }
            if part.split_draw_pivot_part_id != 0 {
                parts[i].split_draw_pivot = Some(resolve(
                    part.id,
                    part.split_draw_pivot_part_id,
                    ReferenceKind::SplitDrawPivot,
                )?);
            }
        }
        check_acyclic(&parts)?;

        // Events, partial success
        let mut events = Vec::with_capacity(model.events.len());
        for e in &model.events {
            match AnimEvent::from_save_data(&e.data) {
                Ok(mut created) => {
                    created.time = e.time;
                    created.index = events.len();
                    events.push(created);
                }
                Err(err) => {
                    warn!(
                        "Failed to create event from data '{}' in clip '{}': {}",
                        e.data, model.name, err
                    );
                }
            }
        }

        // Sweep paths grouped by owner
        let mut sweeps: HashMap<PartHandle, Vec<SweepPointCollection>> = HashMap::new();
        for (part, dp) in model.parts.iter().zip(&parts) {
            for path in &part.sweep_paths {
                sweeps
                    .entry(dp.handle)
                    .or_default()
                    .push(SweepPointCollection::new(path.clone()));
            }
        }

        debug!(
            "Loaded clip '{}': {} parts, {} events, {} parts with sweeps",
            model.name,
            parts.len(),
            events.len(),
            sweeps.len()
        );

        Ok(Self {
            id,
            name: model.name.clone(),
            duration: model.length,
            bounds: model.bounds,
            export_time_utc: model.export_time_utc,
            parts,
            events,
            sweeps,
        })
    }

    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn export_time_utc(&self) -> Option<DateTime<Utc>> {
        self.export_time_utc
    }

    /// All parts, index-stable
    pub fn parts(&self) -> &[AnimPart] {
        &self.parts
    }

    /// Parts without a parent
    pub fn root_parts(&self) -> impl Iterator<Item = &AnimPart> {
        self.parts.iter().filter(|p| p.parent.is_none())
    }

    pub fn events(&self) -> &[AnimEvent] {
        &self.events
    }

    /// Check that a handle was issued by this clip
    pub fn check_handle(&self, handle: PartHandle) -> Result<()> {
        if handle.clip != self.id || handle.index() >= self.parts.len() {
            return Err(ClipError::ForeignPart {
                index: handle.index,
                handle_clip: handle.clip.value(),
                clip: self.id.value(),
            });
        }
        Ok(())
    }

    /// Look up a part by handle
    pub fn part(&self, handle: PartHandle) -> Result<&AnimPart> {
        self.check_handle(handle)?;
        Ok(&self.parts[handle.index()])
    }

    /// Part by index, for handles already validated against this clip
    pub(crate) fn part_unchecked(&self, handle: PartHandle) -> &AnimPart {
        &self.parts[handle.index()]
    }

    /// Find a part by display name (custom name or path)
    pub fn part_by_name(&self, name: &str) -> Option<&AnimPart> {
        let found = self.parts.iter().find(|p| p.name() == name);
        if found.is_none() {
            warn!("Failed to find part called '{}' in clip '{}'", name, self.name);
        }
        found
    }

    /// Index of the part with the given display name
    pub fn part_index_by_name(&self, name: &str) -> Option<usize> {
        self.part_by_name(name).map(AnimPart::index)
    }

    /// Sweep paths recorded for a part; empty for parts without any
    pub fn sweep_paths(&self, handle: PartHandle) -> &[SweepPointCollection] {
        self.sweeps.get(&handle).map_or(&[], Vec::as_slice)
    }

    /// Parts that own at least one sweep path
    pub fn parts_with_sweeps(&self) -> impl Iterator<Item = PartHandle> + '_ {
        self.sweeps.keys().copied()
    }

    /// Number of parts that own sweep paths
    pub fn sweep_data_count(&self) -> usize {
        self.sweeps.len()
    }

    /// Events whose time falls in the window.
    ///
    /// The upper bound is inclusive; the lower bound is exclusive except
    /// for events at time zero.
    pub fn events_in_window(&self, window: EventWindow) -> impl Iterator<Item = &AnimEvent> {
        self.events
            .iter()
            .filter(move |e| e.is_in_time_window(window))
    }

    /// Depth of a part in the hierarchy; roots are at depth 0
    pub fn depth_of(&self, handle: PartHandle) -> Result<usize> {
        let mut current = self.part(handle)?;
        let mut depth = 0;
        while let Some(parent) = current.parent {
            current = self.part_unchecked(parent);
            depth += 1;
        }
        Ok(depth)
    }
}

/// Walk every parent chain; a chain longer than the part count means a cycle.
fn check_acyclic(parts: &[AnimPart]) -> Result<()> {
    // 0 = unvisited, 1 = on the current chain, 2 = known to reach a root
    let mut state = vec![0u8; parts.len()];
    let mut chain = Vec::new();

    for start in 0..parts.len() {
        let mut current = Some(start);
        chain.clear();
        while let Some(i) = current {
            match state[i] {
                2 => break,
                1 => return Err(ClipError::CyclicHierarchy(parts[i].id)),
                _ => {
                    state[i] = 1;
                    chain.push(i);
                    current = parts[i].parent.map(PartHandle::index);
                }
            }
        }
        for &i in &chain {
            state[i] = 2;
        }
    }
    Ok(())
}
