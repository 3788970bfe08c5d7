//! Run-time per-part customization layered on top of authored curves

use crate::draw::PartDrawArgs;
use crate::types::Color;
use glam::Vec2;
use std::fmt;
use std::sync::Arc;

/// Custom per-part draw hook.
///
/// Called for each visible part that carries the hook, before the regular
/// draw record is emitted.
pub trait CustomPartRenderer: Send + Sync + fmt::Debug {
    /// Return true to skip the regular draw of this part
    fn draw(&self, args: &PartDrawArgs<'_>) -> bool;

    /// Trail tint to use instead of the override's own, if any
    fn override_trail_tint(&self) -> Option<Color> {
        None
    }
}

/// Mutable, renderer-owned data for one part
#[derive(Debug, Clone)]
pub struct PartOverride {
    /// Texture substitution key, resolved by the rendering backend
    pub texture: Option<String>,
    /// Material substitution key
    pub material: Option<String>,
    pub prevent_draw: bool,
    /// Offset on the part's ground plane (x, z)
    pub local_offset: Vec2,
    /// Extra rotation around the vertical axis, in degrees
    pub local_rotation: f32,
    /// Non-uniform scale on the ground plane (x, z)
    pub local_scale_factor: Vec2,
    /// Multiplied with the authored tint
    pub color_tint: Color,
    /// Replaces the final color entirely when set
    pub color_override: Option<Color>,
    /// Toggles the curve-driven flip, never replaces it
    pub flip_x: bool,
    pub flip_y: bool,
    pub use_default_transparent: bool,
    pub custom_renderer: Option<Arc<dyn CustomPartRenderer>>,
    pub trail_tint: Option<Color>,
}

impl Default for PartOverride {
    fn default() -> Self {
        NEUTRAL_OVERRIDE.clone()
    }
}

/// Neutral override used for parts nobody has customized
pub(crate) static NEUTRAL_OVERRIDE: PartOverride = PartOverride {
    texture: None,
    material: None,
    prevent_draw: false,
    local_offset: Vec2::ZERO,
    local_rotation: 0.0,
    local_scale_factor: Vec2::ONE,
    color_tint: Color::WHITE,
    color_override: None,
    flip_x: false,
    flip_y: false,
    use_default_transparent: false,
    custom_renderer: None,
    trail_tint: None,
};

impl PartOverride {
    /// Effective trail tint: the hook's, then the override's own, then white
    pub fn effective_trail_tint(&self) -> Color {
        self.custom_renderer
            .as_ref()
            .and_then(|r| r.override_trail_tint())
            .or(self.trail_tint)
            .unwrap_or(Color::WHITE)
    }

    /// True when this override changes nothing
    pub fn is_neutral(&self) -> bool {
        self.texture.is_none()
            && self.material.is_none()
            && !self.prevent_draw
            && self.local_offset == Vec2::ZERO
            && self.local_rotation == 0.0
            && self.local_scale_factor == Vec2::ONE
            && self.color_tint == Color::WHITE
            && self.color_override.is_none()
            && !self.flip_x
            && !self.flip_y
            && !self.use_default_transparent
            && self.custom_renderer.is_none()
            && self.trail_tint.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct RedTrail;

    impl CustomPartRenderer for RedTrail {
        fn draw(&self, _args: &PartDrawArgs<'_>) -> bool {
            true
        }

        fn override_trail_tint(&self) -> Option<Color> {
            Some(Color::new(1.0, 0.0, 0.0, 1.0))
        }
    }

    #[test]
    fn test_default_is_neutral() {
        assert!(PartOverride::default().is_neutral());
        assert!(NEUTRAL_OVERRIDE.is_neutral());

        let ov = PartOverride {
            flip_x: true,
            ..Default::default()
        };
        assert!(!ov.is_neutral());
    }

    #[test]
    fn test_trail_tint_precedence() {
        let mut ov = PartOverride::default();
        assert_eq!(ov.effective_trail_tint(), Color::WHITE);

        ov.trail_tint = Some(Color::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(ov.effective_trail_tint().g, 1.0);

        ov.custom_renderer = Some(Arc::new(RedTrail));
        assert_eq!(ov.effective_trail_tint(), Color::new(1.0, 0.0, 0.0, 1.0));
    }
}
