use std::io;
use thiserror::Error;

/// Which kind of part reference failed to resolve during loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// The `ParentID` of a part
    Parent,
    /// The `SplitDrawPivotPartID` of a part
    SplitDrawPivot,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parent => write!(f, "parent"),
            Self::SplitDrawPivot => write!(f, "split draw pivot"),
        }
    }
}

/// Error types for clip loading, evaluation and event encoding
#[derive(Error, Debug)]
pub enum ClipError {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The clip document is not valid JSON or does not match the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A part references an id that no part in the clip has
    #[error("Part {part_id} references missing {kind} part id {referenced_id}")]
    MissingPartReference {
        part_id: i32,
        referenced_id: i32,
        kind: ReferenceKind,
    },

    /// Two parts share the same authoring id
    #[error("Duplicate part id {0}")]
    DuplicatePartId(i32),

    /// The parent links form a cycle
    #[error("Cyclic part hierarchy detected at part id {0}")]
    CyclicHierarchy(i32),

    /// A curve could not be built from its keyframes
    #[error("Invalid curve for '{property}' on part {part_id}: {reason}")]
    InvalidCurve {
        part_id: i32,
        property: String,
        reason: String,
    },

    /// A part handle was used against a clip that did not issue it
    #[error("Part handle #{index} belongs to clip {handle_clip}, not clip {clip}")]
    ForeignPart {
        index: u32,
        handle_clip: u64,
        clip: u64,
    },

    /// The save data of an event names no known event kind
    #[error("Unknown event identifier '{0}'")]
    UnknownEvent(String),

    /// The save data of a known event kind could not be parsed
    #[error("Failed to decode event '{id}': {reason}")]
    EventDecode { id: String, reason: String },

    /// An event field cannot be represented in the save data
    #[error("Failed to encode event '{id}': {reason}")]
    EventEncode { id: String, reason: String },

    /// Sweep capture parameters that would never terminate or are out of range
    #[error("Invalid sweep parameters: {0}")]
    InvalidSweepParameters(String),
}

/// Result type using ClipError
pub type Result<T> = std::result::Result<T, ClipError>;
