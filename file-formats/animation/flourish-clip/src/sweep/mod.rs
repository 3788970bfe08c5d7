//! Weapon sweep trails
//!
//! Clips store sweep paths as captured tip samples. [`SweepPointCollection`]
//! derives edge velocities from them, [`SweepRibbon`] turns them into a
//! trail mesh at playback time and [`SweepCapture`] records new paths from
//! an animated part.

mod capture;
mod colors;
mod point;
mod ribbon;

pub use capture::{
    PartTipSampler, SweepCapture, SweepParameters, TipSample, TipSampler, drop_repeated_gaps,
};
pub use colors::{BasicTrailColors, TrailColorArgs, TrailColorProvider};
pub use point::{SweepPoint, SweepPointCollection};
pub use ribbon::{RibbonLine, RibbonMesh, SweepRibbon};
