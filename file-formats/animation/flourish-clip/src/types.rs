//! Small value types shared by clips, snapshots and overrides

use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Trait for types that can be linearly interpolated
pub trait Lerp: Clone {
    /// Linear interpolation between self and other
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// RGBA color with float components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Opaque white, the neutral multiply tint
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// All components zero
    pub const CLEAR: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a new color
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

impl Mul for Color {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(
            self.r * rhs.r,
            self.g * rhs.g,
            self.b * rhs.b,
            self.a * rhs.a,
        )
    }
}

impl Lerp for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::new(
            self.r.lerp(&other.r, t),
            self.g.lerp(&other.g, t),
            self.b.lerp(&other.b, t),
            self.a.lerp(&other.a, t),
        )
    }
}

/// Axis-aligned rectangle on the ground plane (authored clip bounds)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    #[serde(alias = "X", default)]
    pub x: f32,
    #[serde(alias = "Y", default)]
    pub y: f32,
    #[serde(alias = "Width", default)]
    pub width: f32,
    #[serde(alias = "Height", default)]
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x_max(&self) -> f32 {
        self.x + self.width
    }

    pub fn y_max(&self) -> f32 {
        self.y + self.height
    }
}

/// Four-way facing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rot4 {
    #[default]
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Rot4 {
    /// Convert a sampled curve value into a direction.
    ///
    /// The value is truncated and wrapped into the four directions so that
    /// a malformed curve never produces an invalid facing.
    pub fn from_curve_value(value: f32) -> Self {
        match (value as i32).rem_euclid(4) {
            0 => Self::North,
            1 => Self::East,
            2 => Self::South,
            _ => Self::West,
        }
    }

    /// Integer form, North = 0 clockwise to West = 3
    pub fn as_int(self) -> u8 {
        self as u8
    }

    /// The direction as seen under horizontal (X) and vertical (Z) mirroring
    pub fn mirrored(self, mirror_x: bool, mirror_y: bool) -> Self {
        match self {
            Self::North if mirror_y => Self::South,
            Self::South if mirror_y => Self::North,
            Self::East if mirror_x => Self::West,
            Self::West if mirror_x => Self::East,
            other => other,
        }
    }
}

/// How a part is split around its pivot part when drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SplitDrawMode {
    #[default]
    None = 0,
    Before = 1,
    After = 2,
    BeforeAndAfter = 3,
}

impl SplitDrawMode {
    /// Convert a sampled curve value; unknown values fall back to `None`
    pub fn from_curve_value(value: f32) -> Self {
        match value as i32 {
            1 => Self::Before,
            2 => Self::After,
            3 => Self::BeforeAndAfter,
            _ => Self::None,
        }
    }
}
