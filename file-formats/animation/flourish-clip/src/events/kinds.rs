//! The supported event kinds and their field layouts

use super::codec::FieldCursor;
use crate::types::Color;
use glam::{Vec2, Vec3};

/// Plays a sound at a point local to the animation
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEvent {
    pub audio_def_name: String,
    pub local_position: Vec3,
    pub volume_factor: f32,
    pub pitch_factor: f32,
    pub on_camera: bool,
}

impl Default for AudioEvent {
    fn default() -> Self {
        Self {
            audio_def_name: String::new(),
            local_position: Vec3::ZERO,
            volume_factor: 1.0,
            pitch_factor: 1.0,
            on_camera: false,
        }
    }
}

impl AudioEvent {
    fn expose(&mut self, c: &mut FieldCursor<'_>) {
        c.look("AudioDefName", &mut self.audio_def_name);
        c.look("LocalPosition", &mut self.local_position);
        c.look("VolumeFactor", &mut self.volume_factor);
        c.look("PitchFactor", &mut self.pitch_factor);
        c.look("OnCamera", &mut self.on_camera);
    }
}

/// Shakes the camera when it is close enough
#[derive(Debug, Clone, PartialEq)]
pub struct CamShakeEvent {
    pub magnitude: f32,
    pub max_distance: f32,
    pub max_zoom: f32,
}

impl Default for CamShakeEvent {
    fn default() -> Self {
        Self {
            magnitude: 3.0,
            max_distance: 20.0,
            max_zoom: 5.0,
        }
    }
}

impl CamShakeEvent {
    fn expose(&mut self, c: &mut FieldCursor<'_>) {
        c.look("Magnitude", &mut self.magnitude);
        c.look("MaxDistance", &mut self.max_distance);
        c.look("MaxZoom", &mut self.max_zoom);
    }
}

/// Visual damage flash on one participant
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DamageEffectEvent {
    pub pawn_index: i32,
    pub offset: Vec3,
}

impl DamageEffectEvent {
    fn expose(&mut self, c: &mut FieldCursor<'_>) {
        c.look("PawnIndex", &mut self.pawn_index);
        c.look("Offset", &mut self.offset);
    }
}

/// Marks a section boundary of a duel; timed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DuelEvent;

/// Blood splatter around a participant
#[derive(Debug, Clone, PartialEq)]
pub struct GoreSplashEvent {
    pub around_pawn_index: i32,
    pub count: i32,
    pub radius: f32,
}

impl Default for GoreSplashEvent {
    fn default() -> Self {
        Self {
            around_pawn_index: 1,
            count: 5,
            radius: 0.5,
        }
    }
}

impl GoreSplashEvent {
    fn expose(&mut self, c: &mut FieldCursor<'_>) {
        c.look("AroundPawnIndex", &mut self.around_pawn_index);
        c.look("Count", &mut self.count);
        c.look("Radius", &mut self.radius);
    }
}

/// One participant kills another
#[derive(Debug, Clone, PartialEq)]
pub struct KillPawnEvent {
    pub killer_index: i32,
    pub victim_index: i32,
    pub target_body_part: String,
    pub damage_def: String,
    pub battle_log_def: String,
    pub prevent_damage_mote: bool,
}

impl Default for KillPawnEvent {
    fn default() -> Self {
        Self {
            killer_index: 0,
            victim_index: 1,
            target_body_part: "Heart".into(),
            damage_def: "Cut".into(),
            battle_log_def: "AM_Execution_Generic".into(),
            prevent_damage_mote: true,
        }
    }
}

impl KillPawnEvent {
    fn expose(&mut self, c: &mut FieldCursor<'_>) {
        c.look("KillerIndex", &mut self.killer_index);
        c.look("VictimIndex", &mut self.victim_index);
        c.look("TargetBodyPart", &mut self.target_body_part);
        c.look("DamageDef", &mut self.damage_def);
        c.look("BattleLogDef", &mut self.battle_log_def);
        c.look("PreventDamageMote", &mut self.prevent_damage_mote);
    }
}

/// Spawns a particle mote, optionally attached to a part
#[derive(Debug, Clone, PartialEq)]
pub struct MoteEvent {
    pub mote_def: String,
    pub part_name: String,
    pub with_offset: Vec3,
    /// All-zero means "use the mote's own color"
    pub custom_color: Color,
    pub start_rotation_speed: Vec2,
    pub start_velocity_magnitude: Vec2,
    pub start_velocity_angle: Vec2,
    pub start_scale: Vec2,
}

impl Default for MoteEvent {
    fn default() -> Self {
        Self {
            mote_def: "DustPuffThick".into(),
            part_name: String::new(),
            with_offset: Vec3::ZERO,
            custom_color: Color::CLEAR,
            start_rotation_speed: Vec2::ZERO,
            start_velocity_magnitude: Vec2::new(1.0, 2.0),
            start_velocity_angle: Vec2::ZERO,
            start_scale: Vec2::ONE,
        }
    }
}

impl MoteEvent {
    fn expose(&mut self, c: &mut FieldCursor<'_>) {
        c.look("MoteDef", &mut self.mote_def);
        c.look("PartName", &mut self.part_name);
        c.look("WithOffset", &mut self.with_offset);
        c.look("CustomColor", &mut self.custom_color);
        c.look("StartRotationSpeed", &mut self.start_rotation_speed);
        c.look("StartVelocityMagnitude", &mut self.start_velocity_magnitude);
        c.look("StartVelocityAngle", &mut self.start_velocity_angle);
        c.look("StartScale", &mut self.start_scale);
    }
}

/// Knocks a participant sideways
#[derive(Debug, Clone, PartialEq)]
pub struct PuntPawnEvent {
    pub pawn_index: i32,
    pub right: bool,
}

impl Default for PuntPawnEvent {
    fn default() -> Self {
        Self {
            pawn_index: 0,
            right: true,
        }
    }
}

impl PuntPawnEvent {
    fn expose(&mut self, c: &mut FieldCursor<'_>) {
        c.look("PawnIndex", &mut self.pawn_index);
        c.look("Right", &mut self.right);
    }
}

/// Floating text near a part
#[derive(Debug, Clone, PartialEq)]
pub struct TextMoteEvent {
    pub text: String,
    pub part_name: String,
    pub offset: Vec3,
    pub color: Color,
    /// Negative means the mote's default
    pub time_before_fade_start: f32,
}

impl Default for TextMoteEvent {
    fn default() -> Self {
        Self {
            text: String::new(),
            part_name: String::new(),
            offset: Vec3::ZERO,
            color: Color::WHITE,
            time_before_fade_start: -1.0,
        }
    }
}

impl TextMoteEvent {
    fn expose(&mut self, c: &mut FieldCursor<'_>) {
        c.look("Text", &mut self.text);
        c.look("PartName", &mut self.part_name);
        c.look("Offset", &mut self.offset);
        c.look("Color", &mut self.color);
        c.look("TimeBeforeFadeStart", &mut self.time_before_fade_start);
    }
}

/// Weapon clash sound at the point of contact
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeaponClashEvent;

/// Payload of an event, tagged by its identifier
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Audio(AudioEvent),
    CamShake(CamShakeEvent),
    DamageEffect(DamageEffectEvent),
    Duel(DuelEvent),
    GoreSplash(GoreSplashEvent),
    KillPawn(KillPawnEvent),
    Mote(MoteEvent),
    PuntPawn(PuntPawnEvent),
    TextMote(TextMoteEvent),
    WeaponClash(WeaponClashEvent),
}

impl EventPayload {
    /// Identifiers of every supported kind
    pub const IDENTIFIERS: &'static [&'static str] = &[
        "Audio",
        "CamShakeEvent",
        "DamageEffect",
        "DuelEvent",
        "GoreSplash",
        "KillPawn",
        "Mote",
        "PuntPawn",
        "TextMote",
        "WeaponClash",
    ];

    /// Default payload for an identifier
    pub fn default_for(identifier: &str) -> Option<Self> {
        Some(match identifier {
            "Audio" => Self::Audio(AudioEvent::default()),
            "CamShakeEvent" => Self::CamShake(CamShakeEvent::default()),
            "DamageEffect" => Self::DamageEffect(DamageEffectEvent::default()),
            "DuelEvent" => Self::Duel(DuelEvent),
            "GoreSplash" => Self::GoreSplash(GoreSplashEvent::default()),
            "KillPawn" => Self::KillPawn(KillPawnEvent::default()),
            "Mote" => Self::Mote(MoteEvent::default()),
            "PuntPawn" => Self::PuntPawn(PuntPawnEvent::default()),
            "TextMote" => Self::TextMote(TextMoteEvent::default()),
            "WeaponClash" => Self::WeaponClash(WeaponClashEvent),
            _ => return None,
        })
    }

    /// The identifier written as the first save-data field
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Audio(_) => "Audio",
            Self::CamShake(_) => "CamShakeEvent",
            Self::DamageEffect(_) => "DamageEffect",
            Self::Duel(_) => "DuelEvent",
            Self::GoreSplash(_) => "GoreSplash",
            Self::KillPawn(_) => "KillPawn",
            Self::Mote(_) => "Mote",
            Self::PuntPawn(_) => "PuntPawn",
            Self::TextMote(_) => "TextMote",
            Self::WeaponClash(_) => "WeaponClash",
        }
    }

    /// Kinds that carry a `Now | AtEnd` timing field
    pub fn is_timed(&self) -> bool {
        matches!(self, Self::Duel(_))
    }

    /// Read or write the payload fields in declaration order
    pub fn expose(&mut self, c: &mut FieldCursor<'_>) {
        match self {
            Self::Audio(e) => e.expose(c),
            Self::CamShake(e) => e.expose(c),
            Self::DamageEffect(e) => e.expose(c),
            Self::GoreSplash(e) => e.expose(c),
            Self::KillPawn(e) => e.expose(c),
            Self::Mote(e) => e.expose(c),
            Self::PuntPawn(e) => e.expose(c),
            Self::TextMote(e) => e.expose(c),
            Self::Duel(_) | Self::WeaponClash(_) => {}
        }
    }
}
