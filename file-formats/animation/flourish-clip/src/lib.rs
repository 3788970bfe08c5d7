//! Loader and runtime evaluator for exported part-based animation clips.
//!
//! A clip is a flat list of parts, each driven by keyframed curves and
//! linked into a hierarchy by parent references. Clips are loaded once
//! (optionally through a [`ClipCache`]) and shared behind an `Arc`; every
//! renderer evaluates them through its own [`ClipInstance`], which carries
//! per-part overrides, mirroring and the frame pose.
//!
//! # Example
//!
//! ```
//! use flourish_clip::{AnimClip, ClipInstance};
//! use std::sync::Arc;
//!
//! let json = r#"{
//!     "Name": "Swing",
//!     "Length": 1.0,
//!     "Parts": [
//!         { "ID": 1, "Path": "Root",
//!           "Curves": { "Transform.m_LocalPosition.x": { "Keyframes": [
//!               { "time": 0, "value": 0 }, { "time": 1, "value": 2 } ] } } },
//!         { "ID": 2, "Path": "Root/Hand", "ParentID": 1,
//!           "DefaultValues": { "Transform.m_LocalPosition.x": 5 } }
//!     ]
//! }"#;
//!
//! let clip = Arc::new(AnimClip::from_json_str(json).unwrap());
//! let hand = clip.part_by_name("Root/Hand").unwrap().handle();
//!
//! let instance = ClipInstance::new(clip);
//! let snapshot = instance.snapshot(hand, 1.0).unwrap();
//! assert!((snapshot.world_matrix.w_axis.x - 7.0).abs() < 1e-5);
//! ```

pub mod cache;
pub mod clip;
pub mod curve;
pub mod draw;
pub mod error;
pub mod events;
pub mod instance;
pub mod model;
pub mod overrides;
pub mod part;
pub mod snapshot;
pub mod sweep;
pub mod types;

// Re-export common types
pub use cache::{CacheStatistics, ClipCache};
pub use clip::AnimClip;
pub use curve::{Curve, Keyframe};
pub use draw::{DrawItem, MaterialChoice, PartDrawArgs, SplitDrawParams};
pub use error::{ClipError, Result};
pub use events::{AnimEvent, EventPayload, EventTiming, EventWindow, WorkerRegistry};
pub use instance::ClipInstance;
pub use model::ClipModel;
pub use overrides::{CustomPartRenderer, PartOverride};
pub use part::{AnimPart, ClipId, PartHandle};
pub use snapshot::PartSnapshot;
pub use sweep::{SweepCapture, SweepParameters, SweepPoint, SweepPointCollection, SweepRibbon};
pub use types::{Color, Rect, Rot4, SplitDrawMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
