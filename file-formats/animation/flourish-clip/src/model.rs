//! Serde model of the exported clip document
//!
//! Field names follow the exporter's PascalCase JSON. Unknown keys are
//! ignored so newer exports still load.

use crate::curve::Keyframe;
use crate::sweep::SweepPoint;
use crate::types::Rect;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root of a clip document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClipModel {
    #[serde(default)]
    pub name: String,
    /// Duration in seconds
    #[serde(default)]
    pub length: f32,
    #[serde(default)]
    pub bounds: Rect,
    #[serde(
        rename = "ExportTimeUTC",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub export_time_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parts: Vec<PartModel>,
    #[serde(default)]
    pub events: Vec<EventModel>,
}

/// One exported part
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartModel {
    /// Authoring id, stable within an animation set. Never 0.
    #[serde(rename = "ID")]
    pub id: i32,
    /// Hierarchical path of the part within the animation
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    /// Parent id, 0 when the part is a root
    #[serde(rename = "ParentID", default)]
    pub parent_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_path: Option<String>,
    #[serde(default)]
    pub transparent_by_default: bool,
    /// Property name to animated curve
    #[serde(default)]
    pub curves: HashMap<String, CurveModel>,
    /// Property name to constant value, used when no curve is authored
    #[serde(default)]
    pub default_values: HashMap<String, f32>,
    /// Split draw pivot id, 0 when absent
    #[serde(rename = "SplitDrawPivotPartID", default)]
    pub split_draw_pivot_part_id: i32,
    #[serde(default)]
    pub sweep_paths: Vec<Vec<SweepPoint>>,
}

/// Keyframes of one channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurveModel {
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

/// A timed event in save-data form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventModel {
    #[serde(default)]
    pub time: f32,
    /// `;`-separated save data, identifier first
    #[serde(default)]
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document() {
        let model: ClipModel = serde_json::from_str(r#"{"Name": "Empty", "Length": 1.5}"#).unwrap();
        assert_eq!(model.name, "Empty");
        assert_eq!(model.length, 1.5);
        assert!(model.parts.is_empty());
        assert!(model.export_time_utc.is_none());
    }

    #[test]
    fn test_part_document() {
        let json = r#"{
            "ID": 7,
            "Path": "Root/ItemA",
            "ParentID": 3,
            "TexturePath": "Weapons/Sword",
            "Curves": {
                "Transform.m_LocalPosition.x": {
                    "Keyframes": [{"time": 0, "value": 1, "inTangent": 0, "outTangent": 0}],
                    "PreWrapMode": 8
                }
            },
            "DefaultValues": {"GameObject.m_IsActive": 1},
            "SweepPaths": [[{"Time": 0, "X": 1, "Z": 2, "DX": 1, "DZ": 0, "Disable": false}]]
        }"#;

        let part: PartModel = serde_json::from_str(json).unwrap();
        assert_eq!(part.id, 7);
        assert_eq!(part.parent_id, 3);
        assert_eq!(part.split_draw_pivot_part_id, 0);
        assert_eq!(part.custom_name, None);
        assert_eq!(part.curves.len(), 1);
        assert_eq!(part.default_values["GameObject.m_IsActive"], 1.0);
        assert_eq!(part.sweep_paths[0][0].z, 2.0);
    }

    #[test]
    fn test_export_time() {
        let model: ClipModel = serde_json::from_str(
            r#"{"Name": "T", "Length": 1, "ExportTimeUTC": "2023-04-05T06:07:08Z"}"#,
        )
        .unwrap();
        let time = model.export_time_utc.unwrap();
        assert_eq!(time.to_rfc3339(), "2023-04-05T06:07:08+00:00");
    }
}
