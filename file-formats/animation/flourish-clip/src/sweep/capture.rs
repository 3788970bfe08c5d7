//! Adaptive capture of sweep paths
//!
//! Walks a clip from time zero and places samples so the weapon tip moves
//! roughly [`SweepParameters::target_distance`] between consecutive samples,
//! however fast the underlying curves are.

use super::point::SweepPoint;
use crate::error::{ClipError, Result};
use crate::instance::ClipInstance;
use crate::part::PartHandle;
use glam::Vec3;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

/// Lookahead at which a warning is logged
const FAR_LOOKAHEAD: f32 = 1.0;
/// Lookahead at which an error is logged
const VERY_FAR_LOOKAHEAD: f32 = 3.0;

/// Tunables of [`SweepCapture`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParameters {
    /// Initial lookahead in seconds
    pub base_time_step: f32,
    /// Lookahead multiplier applied on every rejection
    pub time_step_coefficient: f32,
    /// Lookahead increment applied on every rejection
    pub time_step_offset: f32,
    /// Wanted planar distance between samples
    pub target_distance: f32,
    /// Accepted deviation as a fraction of the target distance
    pub target_tolerance: f32,
    /// Binary search stops when the interval is narrower than this
    pub quit_time: f32,
    pub max_binary_iterations: u32,
    /// Half-width of the tip edge
    pub radius: f32,
}

impl Default for SweepParameters {
    fn default() -> Self {
        Self {
            base_time_step: 1.0 / 60.0,
            time_step_coefficient: 2.0,
            time_step_offset: 0.0,
            target_distance: 0.1,
            target_tolerance: 0.1,
            quit_time: 0.00001,
            max_binary_iterations: 50,
            radius: 1.0,
        }
    }
}

impl SweepParameters {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Err(ClipError::InvalidSweepParameters(reason.to_string()));

        if !(self.base_time_step > 0.0) {
            return invalid("base_time_step must be positive");
        }
        if !(self.time_step_coefficient >= 1.0) {
            return invalid("time_step_coefficient must be at least 1");
        }
        if !(self.time_step_offset >= 0.0) {
            return invalid("time_step_offset must not be negative");
        }
        if self.time_step_coefficient == 1.0 && self.time_step_offset == 0.0 {
            return invalid("lookahead never grows with coefficient 1 and offset 0");
        }
        if !(self.target_distance > 0.0) {
            return invalid("target_distance must be positive");
        }
        if !(0.0..=1.0).contains(&self.target_tolerance) {
            return invalid("target_tolerance must be within [0, 1]");
        }
        if !(self.quit_time > 0.0) {
            return invalid("quit_time must be positive");
        }
        if self.max_binary_iterations == 0 {
            return invalid("max_binary_iterations must be at least 1");
        }
        if !(self.radius > 0.0) {
            return invalid("radius must be positive");
        }
        Ok(())
    }

    fn tolerance(&self) -> f32 {
        self.target_distance * self.target_tolerance
    }
}

/// Tip state at one time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipSample {
    pub position: Vec3,
    /// Right direction; only X and Z are stored in sweep points
    pub right: Vec3,
    pub active: bool,
}

/// Source of tip samples for capture
pub trait TipSampler {
    /// Length of the sampled animation in seconds
    fn duration(&self) -> f32;

    fn sample(&mut self, time: f32) -> Result<TipSample>;
}

/// Samples the origin of one part of a loaded clip
#[derive(Debug, Clone)]
pub struct PartTipSampler {
    instance: ClipInstance,
    handle: PartHandle,
}

impl PartTipSampler {
    pub fn new(instance: ClipInstance, handle: PartHandle) -> Result<Self> {
        instance.clip().check_handle(handle)?;
        Ok(Self { instance, handle })
    }
}

impl TipSampler for PartTipSampler {
    fn duration(&self) -> f32 {
        self.instance.clip().duration()
    }

    fn sample(&mut self, time: f32) -> Result<TipSample> {
        let snapshot = self.instance.snapshot(self.handle, time)?;
        Ok(TipSample {
            position: snapshot.world_position(Vec3::ZERO),
            right: snapshot.world_right(),
            active: snapshot.active,
        })
    }
}

/// Edge points of a tip sample and the sweep point it stands for
#[derive(Debug, Clone, Copy)]
struct Probe {
    a: Vec3,
    b: Vec3,
    point: SweepPoint,
}

impl Probe {
    /// Larger planar displacement of the two edge points
    fn distance_to(&self, other: &Probe) -> f32 {
        let planar = |v: Vec3| glam::Vec2::new(v.x, v.z);
        let da = planar(self.a).distance(planar(other.a));
        let db = planar(self.b).distance(planar(other.b));
        da.max(db)
    }
}

/// Adaptive sweep path capture over a [`TipSampler`]
#[derive(Debug)]
pub struct SweepCapture<S> {
    sampler: S,
    params: SweepParameters,
}

impl<S: TipSampler> SweepCapture<S> {
    pub fn new(sampler: S, params: SweepParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { sampler, params })
    }

    pub fn params(&self) -> &SweepParameters {
        &self.params
    }

    pub fn into_sampler(self) -> S {
        self.sampler
    }

    fn probe(&mut self, time: f32) -> Result<Probe> {
        let tip = self.sampler.sample(time)?;
        let edge = tip.right * self.params.radius;
        Ok(Probe {
            a: tip.position + edge,
            b: tip.position - edge,
            point: SweepPoint::new(time, tip.position, tip.right.x, tip.right.z, !tip.active),
        })
    }

    /// Capture raw samples, starting with one at time zero
    pub fn capture(&mut self) -> Result<Vec<SweepPoint>> {
        let duration = self.sampler.duration();
        let base = self.params.base_time_step;
        let mut lookahead = base;

        let mut current = self.probe(0.0)?;
        let mut samples = vec![current.point];

        while current.point.time + lookahead <= duration {
            let time = current.point.time;
            match self.find_at_distance(&current, time + lookahead)? {
                Some(found) => {
                    samples.push(found.point);
                    current = found;
                    lookahead = base;
                }
                None => {
                    let old = lookahead;
                    lookahead = lookahead * self.params.time_step_coefficient
                        + self.params.time_step_offset;

                    if lookahead >= VERY_FAR_LOOKAHEAD {
                        error!("Searching very far ahead: {time} + {old} -> {lookahead}");
                    } else if lookahead >= FAR_LOOKAHEAD {
                        warn!("Searching far ahead: {time} + {old} -> {lookahead}");
                    }
                }
            }
        }

        debug!("Captured {} sweep samples over {}s", samples.len(), duration);
        Ok(samples)
    }

    /// Capture and drop leading and repeated gap samples
    pub fn capture_with_post_processing(&mut self) -> Result<Vec<SweepPoint>> {
        Ok(drop_repeated_gaps(self.capture()?))
    }

    /// Find a sample in `(start, end]` whose distance from `start` is within
    /// tolerance of the target
    fn find_at_distance(&mut self, start: &Probe, end_time: f32) -> Result<Option<Probe>> {
        let target = self.params.target_distance;
        let tolerance = self.params.tolerance();

        let end = self.probe(end_time)?;
        let end_distance = start.distance_to(&end);
        if (end_distance - target).abs() <= tolerance {
            return Ok(Some(end));
        }
        if end_distance < target {
            return Ok(None);
        }

        let mut low = start.point.time;
        let mut high = end_time;
        for _ in 0..self.params.max_binary_iterations {
            let mid_time = (low + high) * 0.5;
            let mid = self.probe(mid_time)?;
            let distance = start.distance_to(&mid);

            if (distance - target).abs() <= tolerance {
                return Ok(Some(mid));
            }
            if (mid_time - high).abs() < self.params.quit_time {
                break;
            }
            if distance > target {
                high = mid_time;
            } else {
                low = mid_time;
            }
        }

        debug!(
            "No sample at distance {} between {}s and {}s, dropped",
            target, start.point.time, end_time
        );
        Ok(None)
    }
}

/// Remove gap samples that start the path or follow another gap
pub fn drop_repeated_gaps(points: Vec<SweepPoint>) -> Vec<SweepPoint> {
    let mut last_was_gap = true;
    points
        .into_iter()
        .filter(|p| {
            let keep = !(p.disable && last_was_gap);
            if keep {
                last_was_gap = p.disable;
            }
            keep
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Tip moving along X with a speed that changes halfway
    struct Linear {
        duration: f32,
        inactive: Option<(f32, f32)>,
    }

    impl TipSampler for Linear {
        fn duration(&self) -> f32 {
            self.duration
        }

        fn sample(&mut self, time: f32) -> Result<TipSample> {
            let x = if time < 0.5 { time } else { 0.5 + (time - 0.5) * 4.0 };
            let active = self.inactive.is_none_or(|(a, b)| time < a || time > b);
            Ok(TipSample {
                position: Vec3::new(x, 0.0, 0.0),
                right: Vec3::Z,
                active,
            })
        }
    }

    fn params() -> SweepParameters {
        SweepParameters {
            target_distance: 0.05,
            ..Default::default()
        }
    }

    #[test]
    fn test_samples_are_evenly_spaced() {
        let mut capture = SweepCapture::new(Linear { duration: 1.0, inactive: None }, params()).unwrap();
        let samples = capture.capture().unwrap();

        assert_eq!(samples[0].time, 0.0);
        assert!(samples.len() > 10);
        for pair in samples.windows(2) {
            let d = (pair[1].x - pair[0].x).abs();
            assert!((d - 0.05).abs() <= 0.005 + 1e-5, "distance {d}");
            assert!(pair[1].time > pair[0].time);
        }
        // Faster second half needs fewer seconds per sample
        let slow = samples.iter().filter(|p| p.time < 0.5).count();
        let fast = samples.iter().filter(|p| p.time >= 0.5).count();
        assert!(fast > slow);
    }

    #[test]
    fn test_gap_samples_are_collapsed() {
        let sampler = Linear {
            duration: 1.0,
            inactive: Some((0.2, 0.6)),
        };
        let mut capture = SweepCapture::new(sampler, params()).unwrap();
        let samples = capture.capture_with_post_processing().unwrap();

        for pair in samples.windows(2) {
            assert!(!(pair[0].disable && pair[1].disable));
        }
        assert!(samples.iter().any(|p| p.disable));
    }

    #[test]
    fn test_drop_repeated_gaps() {
        let point = |time: f32, disable: bool| SweepPoint::new(time, Vec3::ZERO, 0.0, 1.0, disable);
        let points = vec![
            point(0.0, true),
            point(0.1, false),
            point(0.2, true),
            point(0.3, true),
            point(0.4, false),
        ];
        let times: Vec<f32> = drop_repeated_gaps(points).iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0.1, 0.2, 0.4]);
    }

    #[test]
    fn test_static_tip_terminates() {
        struct Still;
        impl TipSampler for Still {
            fn duration(&self) -> f32 {
                2.0
            }
            fn sample(&mut self, _time: f32) -> Result<TipSample> {
                Ok(TipSample {
                    position: Vec3::ONE,
                    right: Vec3::X,
                    active: true,
                })
            }
        }

        let samples = SweepCapture::new(Still, SweepParameters::default())
            .unwrap()
            .capture()
            .unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        let bad = [
            SweepParameters { base_time_step: 0.0, ..Default::default() },
            SweepParameters { time_step_coefficient: 1.0, ..Default::default() },
            SweepParameters { target_tolerance: 1.5, ..Default::default() },
            SweepParameters { max_binary_iterations: 0, ..Default::default() },
            SweepParameters { radius: -1.0, ..Default::default() },
        ];
        for params in bad {
            assert!(matches!(
                SweepCapture::new(Linear { duration: 1.0, inactive: None }, params),
                Err(ClipError::InvalidSweepParameters(_))
            ));
        }
    }

    #[test]
    fn test_parameters_from_json() {
        let params: SweepParameters = serde_json::from_str(r#"{"radius": 0.5}"#).unwrap();
        assert_eq!(params.radius, 0.5);
        assert_eq!(params.max_binary_iterations, 50);
    }
}
