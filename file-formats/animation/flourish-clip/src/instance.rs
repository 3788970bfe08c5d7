//! Renderer-owned evaluation context for one shared clip

use crate::clip::AnimClip;
use crate::error::Result;
use crate::events::{AnimEvent, EventWindow};
use crate::overrides::{NEUTRAL_OVERRIDE, PartOverride};
use crate::part::PartHandle;
use crate::snapshot::PartSnapshot;
use glam::Mat4;
use log::trace;
use std::sync::Arc;

/// One renderer's view of a clip.
///
/// Holds the per-part override side-table, mirroring flags, the external
/// root placement and the pose of the last evaluated frame. The clip itself
/// is shared and never mutated.
#[derive(Debug, Clone)]
pub struct ClipInstance {
    clip: Arc<AnimClip>,
    overrides: Vec<Option<PartOverride>>,
    pub mirror_horizontal: bool,
    pub mirror_vertical: bool,
    /// Placement of the whole animation in the world, supplied by the host
    pub root_transform: Mat4,
    pose: Vec<PartSnapshot>,
    pose_time: Option<f32>,
}

impl ClipInstance {
    pub fn new(clip: Arc<AnimClip>) -> Self {
        let count = clip.parts().len();
        Self {
            clip,
            overrides: vec![None; count],
            mirror_horizontal: false,
            mirror_vertical: false,
            root_transform: Mat4::IDENTITY,
            pose: Vec::with_capacity(count),
            pose_time: None,
        }
    }

    /// Builder-style mirroring
    pub fn with_mirror(mut self, horizontal: bool, vertical: bool) -> Self {
        self.mirror_horizontal = horizontal;
        self.mirror_vertical = vertical;
        self
    }

    /// Builder-style root placement
    pub fn with_root_transform(mut self, root_transform: Mat4) -> Self {
        self.root_transform = root_transform;
        self
    }

    pub fn clip(&self) -> &Arc<AnimClip> {
        &self.clip
    }

    /// Get or create the override for a part
    pub fn override_mut(&mut self, handle: PartHandle) -> Result<&mut PartOverride> {
        self.clip.check_handle(handle)?;
        Ok(self.overrides[handle.index()].get_or_insert_with(PartOverride::default))
    }

    /// The override of a part, if one was ever created
    pub fn override_for(&self, handle: PartHandle) -> Result<Option<&PartOverride>> {
        self.clip.check_handle(handle)?;
        Ok(self.overrides[handle.index()].as_ref())
    }

    /// Drop every override
    pub fn clear_overrides(&mut self) {
        self.overrides.iter_mut().for_each(|o| *o = None);
    }

    fn override_or_neutral(&self, handle: PartHandle) -> &PartOverride {
        self.overrides[handle.index()]
            .as_ref()
            .unwrap_or(&NEUTRAL_OVERRIDE)
    }

    /// Evaluate one part at `time`.
    ///
    /// The ancestor chain is sampled once for this call; nothing is cached.
    pub fn snapshot(&self, handle: PartHandle, time: f32) -> Result<PartSnapshot> {
        self.clip.check_handle(handle)?;

        // Walk up to the root, then compose downwards
        let mut chain = vec![handle];
        let mut current = self.clip.part_unchecked(handle);
        while let Some(parent) = current.parent() {
            chain.push(parent);
            current = self.clip.part_unchecked(parent);
        }

        let mut hierarchy = Mat4::IDENTITY;
        let mut parent_active = true;
        for &ancestor in chain[1..].iter().rev() {
            let s = PartSnapshot::sample(self.clip.part_unchecked(ancestor), time);
            hierarchy *= s.local_matrix;
            parent_active &= s.active;
        }

        let mut snap = PartSnapshot::sample(self.clip.part_unchecked(handle), time);
        hierarchy *= snap.local_matrix;
        snap.compose(
            hierarchy,
            parent_active,
            self.override_or_neutral(handle),
            self.mirror_horizontal,
            self.mirror_vertical,
            self.root_transform,
        );
        Ok(snap)
    }

    /// Evaluate every part at `time` into the frame pose.
    ///
    /// Parents are evaluated once each regardless of how many children
    /// they have.
    pub fn evaluate_all(&mut self, time: f32) -> &[PartSnapshot] {
        let parts = self.clip.parts();
        let mut hierarchy: Vec<Option<(Mat4, bool)>> = vec![None; parts.len()];
        let mut samples: Vec<PartSnapshot> =
            parts.iter().map(|p| PartSnapshot::sample(p, time)).collect();

        let mut stack = Vec::new();
        for i in 0..parts.len() {
            // Push the unresolved ancestors, resolve from the top down
            let mut cursor = Some(i);
            while let Some(c) = cursor {
                if hierarchy[c].is_some() {
                    break;
                }
                stack.push(c);
                cursor = parts[c].parent().map(PartHandle::index);
            }
            while let Some(c) = stack.pop() {
                let (parent_matrix, parent_active) = parts[c]
                    .parent()
                    .and_then(|p| hierarchy[p.index()])
                    .unwrap_or((Mat4::IDENTITY, true));
                let s = &samples[c];
                hierarchy[c] = Some((parent_matrix * s.local_matrix, parent_active && s.active));
            }
        }

        for (i, snap) in samples.iter_mut().enumerate() {
            let (matrix, _) = hierarchy[i].unwrap_or((snap.local_matrix, snap.active));
            let parent_active = parts[i]
                .parent()
                .and_then(|p| hierarchy[p.index()])
                .is_none_or(|(_, active)| active);
            snap.compose(
                matrix,
                parent_active,
                self.overrides[i].as_ref().unwrap_or(&NEUTRAL_OVERRIDE),
                self.mirror_horizontal,
                self.mirror_vertical,
                self.root_transform,
            );
        }

        trace!("Evaluated {} parts of '{}' at {:.3}s", samples.len(), self.clip.name(), time);
        self.pose = samples;
        self.pose_time = Some(time);
        &self.pose
    }

    /// Snapshot from the last `evaluate_all` call
    pub fn cached_snapshot(&self, handle: PartHandle) -> Result<Option<&PartSnapshot>> {
        self.clip.check_handle(handle)?;
        Ok(self.pose.get(handle.index()))
    }

    /// The last evaluated frame pose
    pub fn pose(&self) -> &[PartSnapshot] {
        &self.pose
    }

    /// Time of the last evaluated frame pose
    pub fn pose_time(&self) -> Option<f32> {
        self.pose_time
    }

    /// Events crossed when playback moves from `from` to `to`
    pub fn events_between(&self, from: f32, to: f32) -> impl Iterator<Item = &AnimEvent> {
        self.clip.events_in_window(EventWindow::between(from, to))
    }
}
