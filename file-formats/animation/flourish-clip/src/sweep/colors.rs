//! Trail edge coloring

use crate::types::Color;
use serde::{Deserialize, Serialize};

/// Inputs for coloring one ribbon edge line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailColorArgs {
    /// Time of the line
    pub time: f32,
    /// Current playback time of the ribbon
    pub last_time: f32,
    /// Outer edge speed
    pub up_velocity: f32,
    /// Inner edge speed
    pub down_velocity: f32,
    /// Per-part tint from the override layer
    pub tint: Color,
}

/// Chooses the inner and outer colors of a ribbon line
pub trait TrailColorProvider {
    /// Returns `(inner, outer)` colors
    fn trail_colors(&self, args: &TrailColorArgs) -> (Color, Color);
}

/// Fades with age and scales alpha by edge speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicTrailColors {
    pub color: Color,
    /// Seconds until a line is fully faded
    pub length: f32,
    /// Speed at or below which the trail is invisible
    pub min_velocity: f32,
    /// Speed at or above which the trail is fully opaque
    pub max_velocity: f32,
}

impl Default for BasicTrailColors {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            length: 0.15,
            min_velocity: 1.0,
            max_velocity: 2.0,
        }
    }
}

fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        return if value >= b { 1.0 } else { 0.0 };
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

impl TrailColorProvider for BasicTrailColors {
    fn trail_colors(&self, args: &TrailColorArgs) -> (Color, Color) {
        let age = args.last_time - args.time;
        if age > self.length || self.length <= 0.0 {
            return (Color::CLEAR, Color::CLEAR);
        }

        let color = self.color * args.tint;
        let fade = (1.0 - age / self.length).clamp(0.0, 1.0);
        let inner = inverse_lerp(self.min_velocity, self.max_velocity, args.down_velocity);
        let outer = inverse_lerp(self.min_velocity, self.max_velocity, args.up_velocity);

        (color.with_alpha(fade * inner), color.with_alpha(fade * outer))
    }
}
