//! Resolution of the frame pose into backend-agnostic draw records

use crate::instance::ClipInstance;
use crate::overrides::{NEUTRAL_OVERRIDE, PartOverride};
use crate::part::PartHandle;
use crate::snapshot::PartSnapshot;
use crate::types::{Color, SplitDrawMode};
use glam::{Mat4, Vec2, Vec3};
use log::trace;
use std::f32::consts::{FRAC_1_SQRT_2, SQRT_2};

/// Depth offset of the second pass of a before-and-after split draw
pub const SPLIT_SECOND_PASS_OFFSET: f32 = -0.9;

/// Which material the backend should use for a part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialChoice {
    /// Split-cutoff shader, driven by [`SplitDrawParams`]
    SplitCutoff,
    /// Material substitution key from the override layer
    Override(String),
    Transparent,
    Cutout,
}

/// Shader parameters of one split draw pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitDrawParams {
    /// 1 for the part before the pivot, -1 for after
    pub polarity: f32,
    /// Cutoff angle in radians
    pub cutoff_angle: f32,
    /// Signed, scaled position of the pivot along the part
    pub distance: f32,
}

/// One draw call for the rendering backend
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub handle: PartHandle,
    pub texture: String,
    pub material: MaterialChoice,
    /// `root_transform · world`, plus the split pass offset
    pub matrix: Mat4,
    /// UV flips of the quad mesh
    pub mesh_flip_x: bool,
    pub mesh_flip_y: bool,
    pub color: Color,
    pub split: Option<SplitDrawParams>,
}

/// What a custom part renderer gets to see
#[derive(Debug)]
pub struct PartDrawArgs<'a> {
    pub snapshot: &'a PartSnapshot,
    pub override_data: &'a PartOverride,
    pub texture: &'a str,
    pub material: &'a MaterialChoice,
    pub matrix: Mat4,
    pub mesh_flip_x: bool,
    pub mesh_flip_y: bool,
}

impl ClipInstance {
    /// Resolve the last evaluated pose into draw records.
    ///
    /// Call [`ClipInstance::evaluate_all`] first; an empty pose yields no
    /// records.
    pub fn draw_items(&self) -> Vec<DrawItem> {
        let mut items = Vec::with_capacity(self.pose().len());

        for snap in self.pose() {
            let ov = self
                .override_for(snap.handle)
                .ok()
                .flatten()
                .unwrap_or(&NEUTRAL_OVERRIDE);

            if !snap.active || ov.prevent_draw || snap.final_color.a <= 0.0 {
                continue;
            }

            let Ok(part) = self.clip().part(snap.handle) else {
                continue;
            };
            let Some(texture) = ov
                .texture
                .clone()
                .or_else(|| snap.texture_path(part.texture_path()))
            else {
                continue;
            };

            let pivot = part
                .split_draw_pivot()
                .filter(|_| snap.split_draw_mode != SplitDrawMode::None);
            let material = if pivot.is_some() {
                MaterialChoice::SplitCutoff
            } else if let Some(key) = &ov.material {
                MaterialChoice::Override(key.clone())
            } else if ov.use_default_transparent
                || part.transparent_by_default()
                || snap.final_color.a < 1.0
            {
                MaterialChoice::Transparent
            } else {
                MaterialChoice::Cutout
            };

            let matrix = self.root_transform * snap.world_matrix;
            let mesh_flip_x = snap.effective_flip_x ^ self.mirror_horizontal;
            let mesh_flip_y = snap.effective_flip_y ^ self.mirror_vertical;

            if let Some(hook) = &ov.custom_renderer {
                let skip = hook.draw(&PartDrawArgs {
                    snapshot: snap,
                    override_data: ov,
                    texture: &texture,
                    material: &material,
                    matrix,
                    mesh_flip_x,
                    mesh_flip_y,
                });
                if skip {
                    trace!("Custom renderer replaced draw of part #{}", snap.handle.index());
                    continue;
                }
            }

            let pivot_snapshot = pivot.and_then(|p| self.pose().get(p.index()));
            let passes: &[SplitDrawMode] = match (pivot_snapshot, snap.split_draw_mode) {
                (Some(_), SplitDrawMode::BeforeAndAfter) => {
                    &[SplitDrawMode::Before, SplitDrawMode::After]
                }
                (Some(_), SplitDrawMode::Before) => &[SplitDrawMode::Before],
                (Some(_), SplitDrawMode::After) => &[SplitDrawMode::After],
                _ => &[SplitDrawMode::None],
            };

            for (pass, &mode) in passes.iter().enumerate() {
                let mut pass_matrix = matrix;
                if pass > 0 {
                    pass_matrix *= Mat4::from_translation(Vec3::new(0.0, SPLIT_SECOND_PASS_OFFSET, 0.0));
                }
                let split = pivot_snapshot.map(|pivot| {
                    split_params(snap, pivot, ov, self.root_transform, pass_matrix, mode, mesh_flip_x, mesh_flip_y)
                });

                items.push(DrawItem {
                    handle: snap.handle,
                    texture: texture.clone(),
                    material: material.clone(),
                    matrix: pass_matrix,
                    mesh_flip_x,
                    mesh_flip_y,
                    color: snap.final_color,
                    split,
                });
            }
        }

        items
    }
}

fn remap(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    to_min + (value - from_min) / (from_max - from_min) * (to_max - to_min)
}

fn flat(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

#[allow(clippy::too_many_arguments)]
fn split_params(
    snap: &PartSnapshot,
    pivot: &PartSnapshot,
    ov: &PartOverride,
    root_transform: Mat4,
    matrix: Mat4,
    mode: SplitDrawMode,
    flip_x: bool,
    flip_y: bool,
) -> SplitDrawParams {
    let texture_rot = ov.local_rotation.to_radians();
    let cutoff_angle = if flip_y { -texture_rot } else { texture_rot };
    let polarity = if mode == SplitDrawMode::Before { 1.0 } else { -1.0 };

    // Sprite length in world units, longest along the diagonal
    let diagonal = (texture_rot * 2.0).sin().abs();
    let length = matrix.x_axis.truncate().length() * remap(diagonal, 0.0, 1.0, 1.0, SQRT_2);
    let distance_scale = remap(diagonal, 0.0, 1.0, 0.5, FRAC_1_SQRT_2);

    let no_override = root_transform
        * snap.world_matrix_no_override
        * Mat4::from_scale(Vec3::new(ov.local_scale_factor.x, 1.0, ov.local_scale_factor.y));
    let along = flat(no_override.transform_vector3(Vec3::X)).normalize_or_zero();

    let rendered = flat(matrix.transform_point3(Vec3::ZERO));
    let start = rendered - along * length * 0.5;
    let end = rendered + along * length * 0.5;
    let base = flat(pivot.world_position(Vec3::ZERO));

    let ab = end - start;
    let denom = ab.dot(ab);
    let mut lerp = if denom > 0.0 { (base - start).dot(ab) / denom } else { 0.5 };
    if !flip_x {
        lerp = 1.0 - lerp;
    }

    SplitDrawParams {
        polarity,
        cutoff_angle,
        distance: distance_scale * (-1.0 + lerp * 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::AnimClip;
    use crate::model::{ClipModel, PartModel};
    use crate::overrides::CustomPartRenderer;
    use crate::part::channel;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn clip() -> Arc<AnimClip> {
        let mut body = PartModel {
            id: 1,
            path: "Body".into(),
            texture_path: Some("Body".into()),
            ..Default::default()
        };
        body.default_values.insert(channel::POS_X.into(), 1.0);

        let mut sword = PartModel {
            id: 2,
            path: "Body/Sword".into(),
            parent_id: 1,
            texture_path: Some("Sword".into()),
            split_draw_pivot_part_id: 1,
            ..Default::default()
        };
        sword.default_values.insert(channel::SPLIT_DRAW_MODE.into(), 3.0);
        sword.default_values.insert(channel::FRAME_INDEX.into(), 2.0);

        let untextured = PartModel {
            id: 3,
            path: "Anchor".into(),
            ..Default::default()
        };
        let mut faded = PartModel {
            id: 4,
            path: "Faded".into(),
            texture_path: Some("Faded".into()),
            ..Default::default()
        };
        faded.default_values.insert(channel::COLOR_A.into(), 0.5);

        Arc::new(
            AnimClip::from_model(&ClipModel {
                name: "Draw".into(),
                parts: vec![body, sword, untextured, faded],
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_materials_and_passes() {
        let clip = clip();
        let mut instance = ClipInstance::new(clip);
        instance.evaluate_all(0.0);
        let items = instance.draw_items();

        // Body, two sword passes, faded; the untextured anchor is skipped
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].material, MaterialChoice::Cutout);
        assert_eq!(items[1].texture, "Sword2");
        assert_eq!(items[1].material, MaterialChoice::SplitCutoff);
        assert_eq!(items[1].split.unwrap().polarity, 1.0);
        assert_eq!(items[2].split.unwrap().polarity, -1.0);
        assert!((items[2].matrix.w_axis.y - SPLIT_SECOND_PASS_OFFSET).abs() < 1e-6);
        assert_eq!(items[3].material, MaterialChoice::Transparent);
    }

    #[test]
    fn test_override_material_and_prevent_draw() {
        let clip = clip();
        let mut instance = ClipInstance::new(clip.clone());
        let body = clip.parts()[0].handle();
        let faded = clip.parts()[3].handle();

        instance.override_mut(body).unwrap().material = Some("Metal".into());
        instance.override_mut(faded).unwrap().prevent_draw = true;
        instance.evaluate_all(0.0);
        let items = instance.draw_items();

        assert_eq!(items[0].material, MaterialChoice::Override("Metal".into()));
        assert!(items.iter().all(|i| i.handle != faded));
    }

    #[test]
    fn test_mesh_flip_combines_mirror() {
        let clip = clip();
        let mut instance = ClipInstance::new(clip.clone()).with_mirror(true, false);
        instance.override_mut(clip.parts()[0].handle()).unwrap().flip_y = true;
        instance.evaluate_all(0.0);
        let items = instance.draw_items();

        assert!(items[0].mesh_flip_x);
        assert!(items[0].mesh_flip_y);
        // Mirrored body sits at -1 on X
        assert!((items[0].matrix.w_axis.x + 1.0).abs() < 1e-6);
    }

    #[derive(Debug, Default)]
    struct CountingRenderer(AtomicUsize);

    impl CustomPartRenderer for CountingRenderer {
        fn draw(&self, args: &PartDrawArgs<'_>) -> bool {
            assert_eq!(args.texture, "Body");
            self.0.fetch_add(1, Ordering::Relaxed);
            true
        }
    }

    #[test]
    fn test_custom_renderer_can_skip() {
        let clip = clip();
        let mut instance = ClipInstance::new(clip.clone());
        let hook = Arc::new(CountingRenderer::default());
        instance.override_mut(clip.parts()[0].handle()).unwrap().custom_renderer = Some(hook.clone());
        instance.evaluate_all(0.0);
        let items = instance.draw_items();

        assert_eq!(hook.0.load(Ordering::Relaxed), 1);
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.texture != "Body"));
    }
}
