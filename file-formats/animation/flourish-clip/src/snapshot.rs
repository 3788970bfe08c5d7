//! Per-time evaluation of one part
//!
//! A [`PartSnapshot`] is a plain value: the sampled local state of a part
//! plus the matrices derived from its parent chain, override and the
//! renderer's mirroring. It is produced by
//! [`ClipInstance`](crate::instance::ClipInstance) and never cached across
//! frames unless the caller asks for the frame pose.

use crate::curve::{evaluate_flag, evaluate_or};
use crate::overrides::PartOverride;
use crate::part::{AnimPart, PartHandle};
use crate::types::{Color, Rot4, SplitDrawMode};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use std::fmt;

/// Build a local transform `T(position) · R(euler) · S(scale)`.
///
/// Euler angles are in degrees and applied Z first, then X, then Y.
pub fn trs(position: Vec3, euler_degrees: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, euler_rotation(euler_degrees), position)
}

/// Rotation of Euler angles in degrees, applied Z, X, then Y
pub fn euler_rotation(euler_degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler_degrees.y.to_radians(),
        euler_degrees.x.to_radians(),
        euler_degrees.z.to_radians(),
    )
}

/// Diagonal mirror matrix applied on both sides of the composed hierarchy
pub fn mirror_matrix(mirror_x: bool, mirror_y: bool) -> Mat4 {
    Mat4::from_scale(Vec3::new(
        if mirror_x { -1.0 } else { 1.0 },
        1.0,
        if mirror_y { -1.0 } else { 1.0 },
    ))
}

/// Override adjust transform inserted between hierarchy and mirroring.
///
/// `flip_x` and `flip_y` are the effective flips (curve XOR override).
pub fn adjust_matrix(ov: &PartOverride, flip_x: bool, flip_y: bool) -> Mat4 {
    let off = Vec2::new(
        if flip_x { -ov.local_offset.x } else { ov.local_offset.x },
        if flip_y { -ov.local_offset.y } else { ov.local_offset.y },
    );
    let rot = if flip_x ^ flip_y {
        -ov.local_rotation
    } else {
        ov.local_rotation
    };

    trs(
        Vec3::new(off.x, 0.0, off.y),
        Vec3::new(0.0, rot, 0.0),
        Vec3::new(ov.local_scale_factor.x, 1.0, ov.local_scale_factor.y),
    )
}

/// Evaluated state of one part at one time, for one renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartSnapshot {
    pub handle: PartHandle,
    pub time: f32,

    pub local_position: Vec3,
    /// Euler degrees
    pub local_rotation: Vec3,
    pub local_scale: Vec3,
    /// Authored tint
    pub color: Color,
    pub data_a: f32,
    pub data_b: f32,
    pub data_c: f32,
    /// Curve-driven flips, without the override toggles
    pub flip_x: bool,
    pub flip_y: bool,
    /// Hierarchical active flag: this part and every ancestor
    pub active: bool,
    pub direction: Rot4,
    pub frame_index: i32,
    pub split_draw_mode: SplitDrawMode,

    pub local_matrix: Mat4,
    pub world_matrix: Mat4,
    pub world_matrix_no_override: Mat4,

    /// Final color after override tint or replacement
    pub final_color: Color,
    /// Effective flips (curve XOR override)
    pub effective_flip_x: bool,
    pub effective_flip_y: bool,

    pub(crate) root_transform: Mat4,
    pub(crate) mirror_x: bool,
    pub(crate) mirror_y: bool,
}

impl PartSnapshot {
    /// Sample the curves of a part; world data is left at the local values.
    pub(crate) fn sample(part: &AnimPart, time: f32) -> Self {
        let c = part.curves();
        let eval = |curve: &Option<crate::curve::Curve>, fallback: f32| {
            evaluate_or(curve.as_ref(), time, fallback)
        };

        let local_position = Vec3::new(eval(&c.pos_x, 0.0), eval(&c.pos_y, 0.0), eval(&c.pos_z, 0.0));
        let local_rotation = Vec3::new(eval(&c.rot_x, 0.0), eval(&c.rot_y, 0.0), eval(&c.rot_z, 0.0));
        // Absent scale and tint channels are neutral
        let local_scale = Vec3::new(eval(&c.scale_x, 1.0), eval(&c.scale_y, 1.0), eval(&c.scale_z, 1.0));
        let color = Color::new(
            eval(&c.color_r, 1.0),
            eval(&c.color_g, 1.0),
            eval(&c.color_b, 1.0),
            eval(&c.color_a, 1.0),
        );
        let flip_x = evaluate_flag(c.flip_x.as_ref(), time);
        let flip_y = evaluate_flag(c.flip_y.as_ref(), time);
        // Parts without an active channel are visible
        let active = c
            .active
            .as_ref()
            .is_none_or(|a| evaluate_flag(Some(a), time));

        let local_matrix = trs(local_position, local_rotation, local_scale);

        Self {
            handle: part.handle(),
            time,
            local_position,
            local_rotation,
            local_scale,
            color,
            data_a: eval(&c.data_a, 0.0),
            data_b: eval(&c.data_b, 0.0),
            data_c: eval(&c.data_c, 0.0),
            flip_x,
            flip_y,
            active,
            direction: Rot4::from_curve_value(eval(&c.direction, 0.0)),
            frame_index: eval(&c.frame_index, 0.0) as i32,
            split_draw_mode: SplitDrawMode::from_curve_value(eval(&c.split_draw_mode, 0.0)),
            local_matrix,
            world_matrix: local_matrix,
            world_matrix_no_override: local_matrix,
            final_color: color,
            effective_flip_x: flip_x,
            effective_flip_y: flip_y,
            root_transform: Mat4::IDENTITY,
            mirror_x: false,
            mirror_y: false,
        }
    }

    /// Compose world matrices from the hierarchy matrix of this part.
    ///
    /// `hierarchy` is the un-mirrored, un-overridden parent chain product
    /// ending in this part's local matrix.
    pub(crate) fn compose(
        &mut self,
        hierarchy: Mat4,
        parent_active: bool,
        ov: &PartOverride,
        mirror_x: bool,
        mirror_y: bool,
        root_transform: Mat4,
    ) {
        self.effective_flip_x = self.flip_x ^ ov.flip_x;
        self.effective_flip_y = self.flip_y ^ ov.flip_y;

        let mirror = mirror_matrix(mirror_x, mirror_y);
        let adjust = adjust_matrix(ov, self.effective_flip_x, self.effective_flip_y);

        self.active = self.active && parent_active;
        self.world_matrix = mirror * hierarchy * adjust * mirror;
        self.world_matrix_no_override = mirror * hierarchy * mirror;
        self.final_color = ov.color_override.unwrap_or(self.color * ov.color_tint);
        self.root_transform = root_transform;
        self.mirror_x = mirror_x;
        self.mirror_y = mirror_y;
    }

    /// Part texture with the frame index appended when it is above zero
    pub fn texture_path(&self, base: Option<&str>) -> Option<String> {
        let base = base?;
        if self.frame_index > 0 {
            Some(format!("{}{}", base, self.frame_index))
        } else {
            Some(base.to_string())
        }
    }

    /// Height of the part origin in clip space, used for draw ordering
    pub fn depth(&self) -> f32 {
        self.world_matrix.w_axis.y
    }

    /// World position of a point local to the part
    pub fn world_position(&self, local: Vec3) -> Vec3 {
        (self.root_transform * self.world_matrix).transform_point3(local)
    }

    /// World position ignoring the override layer
    pub fn world_position_no_override(&self, local: Vec3) -> Vec3 {
        (self.root_transform * self.world_matrix_no_override).transform_point3(local)
    }

    /// Facing direction after the renderer's mirroring
    pub fn world_direction(&self) -> Rot4 {
        self.direction.mirrored(self.mirror_x, self.mirror_y)
    }

    /// Yaw of `root_transform · world` in degrees, in `[0, 360)`
    pub fn world_rotation(&self) -> f32 {
        let (_, rotation, _) = (self.root_transform * self.world_matrix).to_scale_rotation_translation();
        let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
        let degrees = yaw.to_degrees().rem_euclid(360.0);
        if degrees >= 360.0 { 0.0 } else { degrees }
    }

    /// Right direction of the part on the ground plane, mirroring applied
    pub fn world_right(&self) -> Vec3 {
        let right = (self.root_transform * self.world_matrix).transform_vector3(Vec3::X);
        Vec3::new(right.x, 0.0, right.z).normalize_or_zero()
    }
}

impl fmt::Display for PartSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}s] part #{}", self.time, self.handle.index())
    }
}
