//! Part descriptors: one rigid element of a clip and its curve channels

use crate::curve::{Curve, CurveError};
use crate::model::PartModel;

/// Exporter property names of the curve channels
pub mod channel {
    pub const ACTIVE: &str = "GameObject.m_IsActive";
    pub const DIRECTION: &str = "PawnBody.Direction";

    pub const POS_X: &str = "Transform.m_LocalPosition.x";
    pub const POS_Y: &str = "Transform.m_LocalPosition.y";
    pub const POS_Z: &str = "Transform.m_LocalPosition.z";

    pub const ROT_X: &str = "Transform.localEulerAnglesRaw.x";
    pub const ROT_Y: &str = "Transform.localEulerAnglesRaw.y";
    pub const ROT_Z: &str = "Transform.localEulerAnglesRaw.z";

    pub const SCALE_X: &str = "Transform.m_LocalScale.x";
    pub const SCALE_Y: &str = "Transform.m_LocalScale.y";
    pub const SCALE_Z: &str = "Transform.m_LocalScale.z";

    pub const DATA_A: &str = "AnimatedPart.DataA";
    pub const DATA_B: &str = "AnimatedPart.DataB";
    pub const DATA_C: &str = "AnimatedPart.DataC";

    pub const COLOR_R: &str = "AnimatedPart.Tint.r";
    pub const COLOR_G: &str = "AnimatedPart.Tint.g";
    pub const COLOR_B: &str = "AnimatedPart.Tint.b";
    pub const COLOR_A: &str = "AnimatedPart.Tint.a";

    pub const FLIP_X: &str = "AnimatedPart.FlipX";
    pub const FLIP_Y: &str = "AnimatedPart.FlipY";

    pub const SPLIT_DRAW_MODE: &str = "AnimatedPart.SplitDrawMode";
    pub const FRAME_INDEX: &str = "AnimatedPart.FrameIndex";
}

/// Process-unique identity of a loaded clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(pub(crate) u64);

impl ClipId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Stable handle of a part inside the clip that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartHandle {
    pub(crate) clip: ClipId,
    pub(crate) index: u32,
}

impl PartHandle {
    /// The clip this handle belongs to
    pub fn clip(self) -> ClipId {
        self.clip
    }

    /// Index into the clip's part array
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// All curve channels of a part. `None` means the channel is absent.
#[derive(Debug, Clone, Default)]
pub struct PartCurves {
    pub active: Option<Curve>,
    pub direction: Option<Curve>,
    pub pos_x: Option<Curve>,
    pub pos_y: Option<Curve>,
    pub pos_z: Option<Curve>,
    pub rot_x: Option<Curve>,
    pub rot_y: Option<Curve>,
    pub rot_z: Option<Curve>,
    pub scale_x: Option<Curve>,
    pub scale_y: Option<Curve>,
    pub scale_z: Option<Curve>,
    pub data_a: Option<Curve>,
    pub data_b: Option<Curve>,
    pub data_c: Option<Curve>,
    pub color_r: Option<Curve>,
    pub color_g: Option<Curve>,
    pub color_b: Option<Curve>,
    pub color_a: Option<Curve>,
    pub flip_x: Option<Curve>,
    pub flip_y: Option<Curve>,
    pub split_draw_mode: Option<Curve>,
    pub frame_index: Option<Curve>,
}

impl PartCurves {
    /// Resolve every channel of a part model.
    ///
    /// An authored curve wins over a default value; a default value becomes
    /// a one-key curve; anything else is absent.
    pub fn from_model(model: &PartModel) -> Result<Self, (String, CurveError)> {
        let get = |prop: &str| -> Result<Option<Curve>, (String, CurveError)> {
            if let Some(found) = model.curves.get(prop) {
                return Curve::from_keyframes(found.keyframes.clone())
                    .map(Some)
                    .map_err(|e| (prop.to_string(), e));
            }
            Ok(model.default_values.get(prop).map(|&v| Curve::constant(v)))
        };

        Ok(Self {
            active: get(channel::ACTIVE)?,
            direction: get(channel::DIRECTION)?,
            pos_x: get(channel::POS_X)?,
            pos_y: get(channel::POS_Y)?,
            pos_z: get(channel::POS_Z)?,
            rot_x: get(channel::ROT_X)?,
            rot_y: get(channel::ROT_Y)?,
            rot_z: get(channel::ROT_Z)?,
            scale_x: get(channel::SCALE_X)?,
            scale_y: get(channel::SCALE_Y)?,
            scale_z: get(channel::SCALE_Z)?,
            data_a: get(channel::DATA_A)?,
            data_b: get(channel::DATA_B)?,
            data_c: get(channel::DATA_C)?,
            color_r: get(channel::COLOR_R)?,
            color_g: get(channel::COLOR_G)?,
            color_b: get(channel::COLOR_B)?,
            color_a: get(channel::COLOR_A)?,
            flip_x: get(channel::FLIP_X)?,
            flip_y: get(channel::FLIP_Y)?,
            split_draw_mode: get(channel::SPLIT_DRAW_MODE)?,
            frame_index: get(channel::FRAME_INDEX)?,
        })
    }

    /// Number of channels that are present
    pub fn channel_count(&self) -> usize {
        [
            &self.active,
            &self.direction,
            &self.pos_x,
            &self.pos_y,
            &self.pos_z,
            &self.rot_x,
            &self.rot_y,
            &self.rot_z,
            &self.scale_x,
            &self.scale_y,
            &self.scale_z,
            &self.data_a,
            &self.data_b,
            &self.data_c,
            &self.color_r,
            &self.color_g,
            &self.color_b,
            &self.color_a,
            &self.flip_x,
            &self.flip_y,
            &self.split_draw_mode,
            &self.frame_index,
        ]
        .iter()
        .filter(|c| c.is_some())
        .count()
    }
}

/// One rigid, flat element of a clip
#[derive(Debug, Clone)]
pub struct AnimPart {
    pub(crate) handle: PartHandle,
    pub(crate) id: i32,
    pub(crate) path: String,
    pub(crate) custom_name: Option<String>,
    pub(crate) texture_path: Option<String>,
    pub(crate) transparent_by_default: bool,
    pub(crate) parent: Option<PartHandle>,
    pub(crate) children: Vec<PartHandle>,
    pub(crate) split_draw_pivot: Option<PartHandle>,
    pub(crate) curves: PartCurves,
}

impl AnimPart {
    pub fn handle(&self) -> PartHandle {
        self.handle
    }

    /// Stable index into the clip's part array
    pub fn index(&self) -> usize {
        self.handle.index()
    }

    /// Authoring id
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Custom name if one was given, otherwise the hierarchy path
    pub fn name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    pub fn texture_path(&self) -> Option<&str> {
        self.texture_path.as_deref()
    }

    pub fn transparent_by_default(&self) -> bool {
        self.transparent_by_default
    }

    pub fn parent(&self) -> Option<PartHandle> {
        self.parent
    }

    /// Back-references to the parts whose parent is this part
    pub fn children(&self) -> &[PartHandle] {
        &self.children
    }

    pub fn split_draw_pivot(&self) -> Option<PartHandle> {
        self.split_draw_pivot
    }

    pub fn curves(&self) -> &PartCurves {
        &self.curves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Keyframe;
    use crate::model::CurveModel;

    #[test]
    fn test_curve_beats_default_value() {
        let mut model = PartModel {
            id: 1,
            path: "Root".into(),
            ..Default::default()
        };
        model.default_values.insert(channel::POS_X.into(), 3.0);
        model.curves.insert(
            channel::POS_X.into(),
            CurveModel {
                keyframes: vec![Keyframe::new(0.0, 9.0)],
            },
        );
        model.default_values.insert(channel::POS_Y.into(), 4.0);

        let curves = PartCurves::from_model(&model).unwrap();
        assert_eq!(curves.pos_x.as_ref().unwrap().evaluate(0.0), 9.0);
        assert_eq!(curves.pos_y.as_ref().unwrap().evaluate(100.0), 4.0);
        assert!(curves.pos_z.is_none());
        assert_eq!(curves.channel_count(), 2);
    }

    #[test]
    fn test_empty_curve_names_property() {
        let mut model = PartModel {
            id: 1,
            ..Default::default()
        };
        model
            .curves
            .insert(channel::ROT_Y.into(), CurveModel::default());

        let (prop, err) = PartCurves::from_model(&model).unwrap_err();
        assert_eq!(prop, channel::ROT_Y);
        assert_eq!(err, CurveError::Empty);
    }
}
