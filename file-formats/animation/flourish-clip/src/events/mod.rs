//! Timed animation events
//!
//! Events are stored in clips as `;`-separated save data with the kind
//! identifier first. Decoding produces an [`AnimEvent`] whose payload is a
//! tagged [`EventPayload`]; running an event is the job of a worker
//! registered in a [`WorkerRegistry`].
//!
//! # Example
//!
//! ```
//! use flourish_clip::events::{AnimEvent, EventPayload, EventWindow};
//!
//! let mut event = AnimEvent::from_save_data("PuntPawn;1;False").unwrap();
//! event.time = 0.5;
//!
//! assert!(matches!(event.payload, EventPayload::PuntPawn(ref p) if !p.right));
//! assert!(event.is_in_time_window(EventWindow::new(0.4, 0.6)));
//! assert_eq!(event.to_save_data().unwrap(), "PuntPawn;1;False");
//! ```

mod codec;
mod dispatch;
mod kinds;

pub use codec::{FieldCursor, FieldValue};
pub use dispatch::{DispatchOutcome, DispatchSummary, EventWorker, WorkerRegistry};
pub use kinds::*;

use crate::error::{ClipError, Result};
use std::fmt;
use std::str::FromStr;

/// When a timed event takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventTiming {
    /// As soon as playback crosses the event
    #[default]
    Now,
    /// When the clip finishes
    AtEnd,
}

impl fmt::Display for EventTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Now => write!(f, "Now"),
            Self::AtEnd => write!(f, "AtEnd"),
        }
    }
}

impl FromStr for EventTiming {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("now") {
            Ok(Self::Now)
        } else if s.eq_ignore_ascii_case("atend") {
            Ok(Self::AtEnd)
        } else {
            Err(format!("invalid event timing '{s}'"))
        }
    }
}

/// A playback time window `(start, end]`, closed at the start for events
/// at time zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventWindow {
    pub start: f32,
    pub end: f32,
}

impl EventWindow {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Window between two times in either order
    pub fn between(a: f32, b: f32) -> Self {
        if a <= b { Self::new(a, b) } else { Self::new(b, a) }
    }

    /// Whether an event at `time` falls in the window
    pub fn contains(&self, time: f32) -> bool {
        let after_start = if time == 0.0 {
            time >= self.start
        } else {
            time > self.start
        };
        after_start && time <= self.end
    }
}

/// A decoded event of a clip
#[derive(Debug, Clone, PartialEq)]
pub struct AnimEvent {
    /// Seconds from clip start
    pub time: f32,
    /// Position in the clip's event list
    pub index: usize,
    /// Set for timed kinds only
    pub timing: Option<EventTiming>,
    pub payload: EventPayload,
}

impl AnimEvent {
    /// Event at time zero; timed kinds start as [`EventTiming::Now`]
    pub fn new(payload: EventPayload) -> Self {
        Self {
            time: 0.0,
            index: 0,
            timing: payload.is_timed().then_some(EventTiming::Now),
            payload,
        }
    }

    pub fn identifier(&self) -> &'static str {
        self.payload.identifier()
    }

    pub fn is_in_time_window(&self, window: EventWindow) -> bool {
        window.contains(self.time)
    }

    /// Decode an event from its save data.
    ///
    /// Time and index are not part of the save data and stay zero.
    pub fn from_save_data(data: &str) -> Result<Self> {
        let fields: Vec<&str> = data.split(codec::FIELD_SEPARATOR).collect();
        let id = fields[0].trim();

        let payload = EventPayload::default_for(id)
            .ok_or_else(|| ClipError::UnknownEvent(id.to_string()))?;
        let mut event = Self::new(payload);
        let decode_err = |reason: String| ClipError::EventDecode {
            id: id.to_string(),
            reason,
        };

        let mut rest = &fields[1..];
        if event.payload.is_timed()
            && let Some((timing, tail)) = rest.split_first()
        {
            event.timing = Some(timing.parse().map_err(decode_err)?);
            rest = tail;
        }

        let mut cursor = FieldCursor::reader(rest);
        event.payload.expose(&mut cursor);
        cursor.finish().map_err(decode_err)?;
        Ok(event)
    }

    /// Encode the event into save data
    pub fn to_save_data(&self) -> Result<String> {
        let mut prefix = self.identifier().to_string();
        if self.payload.is_timed() {
            prefix.push(codec::FIELD_SEPARATOR);
            prefix.push_str(&self.timing.unwrap_or_default().to_string());
        }

        // `expose` needs `&mut` for reading; writing only looks at the copy
        let mut payload = self.payload.clone();
        let mut cursor = FieldCursor::writer(prefix);
        payload.expose(&mut cursor);
        cursor.finish().map_err(|reason| ClipError::EventEncode {
            id: self.identifier().to_string(),
            reason,
        })
    }
}

impl fmt::Display for AnimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}s] {}", self.time, self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use glam::{Vec2, Vec3};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(0.0, 0.0, 1.0, true ; "zero event at zero start")]
    #[test_case(0.0, 0.0, 0.0, true ; "zero event in empty zero window")]
    #[test_case(0.5, 0.4, 0.6, true ; "inside")]
    #[test_case(0.5, 0.5, 0.5, false ; "exclusive lower bound")]
    #[test_case(0.5, 0.4, 0.5, true ; "inclusive upper bound")]
    #[test_case(0.7, 0.4, 0.6, false ; "after window")]
    #[test_case(0.0, 0.1, 1.0, false ; "zero event after start")]
    fn test_time_window(time: f32, start: f32, end: f32, expected: bool) {
        assert_eq!(EventWindow::new(start, end).contains(time), expected);
    }

    #[test]
    fn test_window_between_orders() {
        assert_eq!(EventWindow::between(2.0, 1.0), EventWindow::new(1.0, 2.0));
    }

    #[test]
    fn test_round_trip_every_field_type() {
        let events = vec![
            EventPayload::Audio(AudioEvent {
                audio_def_name: "Slash".into(),
                local_position: Vec3::new(0.25, -1.0, 3.5),
                volume_factor: 0.75,
                pitch_factor: 1.25,
                on_camera: true,
            }),
            EventPayload::KillPawn(KillPawnEvent {
                killer_index: 2,
                victim_index: -1,
                target_body_part: "Neck".into(),
                damage_def: String::new(),
                battle_log_def: "Log".into(),
                prevent_damage_mote: false,
            }),
            EventPayload::Mote(MoteEvent {
                mote_def: "Smoke".into(),
                part_name: "ItemA".into(),
                with_offset: Vec3::new(1.0, 2.0, 3.0),
                custom_color: Color::new(0.1, 0.2, 0.3, 0.4),
                start_rotation_speed: Vec2::new(-5.0, 5.0),
                start_velocity_magnitude: Vec2::new(0.5, 0.75),
                start_velocity_angle: Vec2::new(10.0, 20.0),
                start_scale: Vec2::new(2.0, 3.0),
            }),
            EventPayload::TextMote(TextMoteEvent {
                text: "Parry!".into(),
                part_name: "Body".into(),
                offset: Vec3::new(0.0, 0.0, 0.5),
                color: Color::new(1.0, 0.5, 0.0, 1.0),
                time_before_fade_start: 0.3,
            }),
            EventPayload::CamShake(CamShakeEvent::default()),
            EventPayload::GoreSplash(GoreSplashEvent {
                around_pawn_index: 0,
                count: 12,
                radius: 1.5,
            }),
            EventPayload::DamageEffect(DamageEffectEvent {
                pawn_index: 1,
                offset: Vec3::new(0.1, 0.0, -0.1),
            }),
            EventPayload::PuntPawn(PuntPawnEvent {
                pawn_index: 1,
                right: false,
            }),
            EventPayload::WeaponClash(WeaponClashEvent),
        ];

        for payload in events {
            let event = AnimEvent::new(payload);
            let data = event.to_save_data().unwrap();
            let decoded = AnimEvent::from_save_data(&data).unwrap();
            assert_eq!(decoded, event, "save data was '{data}'");
        }
    }

    #[test]
    fn test_timed_event_phase() {
        let mut event = AnimEvent::new(EventPayload::Duel(DuelEvent));
        event.timing = Some(EventTiming::AtEnd);

        let data = event.to_save_data().unwrap();
        assert_eq!(data, "DuelEvent;AtEnd");
        assert_eq!(AnimEvent::from_save_data(&data).unwrap().timing, Some(EventTiming::AtEnd));
        assert_eq!(AnimEvent::from_save_data("DuelEvent").unwrap().timing, Some(EventTiming::Now));
    }

    #[test]
    fn test_missing_trailing_fields_use_defaults() {
        let event = AnimEvent::from_save_data("CamShakeEvent;7").unwrap();
        match event.payload {
            EventPayload::CamShake(shake) => {
                assert_eq!(shake.magnitude, 7.0);
                assert_eq!(shake.max_distance, 20.0);
                assert_eq!(shake.max_zoom, 5.0);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            AnimEvent::from_save_data("Teleport;1"),
            Err(ClipError::UnknownEvent(id)) if id == "Teleport"
        ));
        assert!(matches!(
            AnimEvent::from_save_data("PuntPawn;one"),
            Err(ClipError::EventDecode { .. })
        ));
        assert!(matches!(
            AnimEvent::from_save_data("DuelEvent;Later"),
            Err(ClipError::EventDecode { .. })
        ));
    }

    #[test]
    fn test_separator_in_text_cannot_encode() {
        let event = AnimEvent::new(EventPayload::TextMote(TextMoteEvent {
            text: "a;b".into(),
            ..Default::default()
        }));
        assert!(matches!(event.to_save_data(), Err(ClipError::EventEncode { .. })));
    }
}
