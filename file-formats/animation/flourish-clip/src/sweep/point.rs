use crate::types::Lerp;
use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

/// A captured weapon-tip sample on the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepPoint {
    #[serde(rename = "Time")]
    pub time: f32,
    #[serde(rename = "X")]
    pub x: f32,
    #[serde(rename = "Z")]
    pub z: f32,
    /// Right direction, X component
    #[serde(rename = "DX")]
    pub dx: f32,
    /// Right direction, Z component
    #[serde(rename = "DZ")]
    pub dz: f32,
    /// Gap marker: the trail must not bridge across this sample
    #[serde(rename = "Disable", default)]
    pub disable: bool,
    /// Speed of the outer edge, derived
    #[serde(skip)]
    pub velocity_top: f32,
    /// Speed of the inner edge, derived
    #[serde(skip)]
    pub velocity_bottom: f32,
}

impl SweepPoint {
    pub fn new(time: f32, position: Vec3, dx: f32, dz: f32, disable: bool) -> Self {
        Self {
            time,
            x: position.x,
            z: position.z,
            dx,
            dz,
            disable,
            velocity_top: 0.0,
            velocity_bottom: 0.0,
        }
    }

    /// Planar position (y = 0)
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }

    /// Planar right direction (y = 0)
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.dx, 0.0, self.dz)
    }

    /// Inner and outer extrusion points.
    ///
    /// Inner is `position - right * down_distance`, outer is
    /// `position + right * up_distance`.
    pub fn end_points(&self, down_distance: f32, up_distance: f32) -> (Vec3, Vec3) {
        let pos = self.position();
        let right = self.right();
        (pos - right * down_distance, pos + right * up_distance)
    }

    fn set_zero_velocity(&mut self) {
        self.velocity_top = 0.0;
        self.velocity_bottom = 0.0;
    }
}

impl Lerp for SweepPoint {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            time: self.time.lerp(&other.time, t),
            x: self.x.lerp(&other.x, t),
            z: self.z.lerp(&other.z, t),
            dx: self.dx.lerp(&other.dx, t),
            dz: self.dz.lerp(&other.dz, t),
            disable: if t >= 0.5 { other.disable } else { self.disable },
            velocity_top: self.velocity_top.lerp(&other.velocity_top, t),
            velocity_bottom: self.velocity_bottom.lerp(&other.velocity_bottom, t),
        }
    }
}

/// An immutable, time-ordered sweep path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepPointCollection {
    points: Vec<SweepPoint>,
}

impl SweepPointCollection {
    pub fn new(points: Vec<SweepPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time span covered by the samples
    pub fn time_range(&self) -> Option<(f32, f32)> {
        Some((self.points.first()?.time, self.points.last()?.time))
    }

    /// Copy of the samples with inner and outer edge velocities filled in.
    ///
    /// The first sample, gap samples and samples directly after a gap get
    /// zero velocity. A non-positive time delta also yields zero.
    pub fn clone_with_velocities(&self, down_distance: f32, up_distance: f32) -> Vec<SweepPoint> {
        let mut clone = self.points.clone();

        let mut prev: Option<(Vec3, Vec3, f32, bool)> = None;
        for point in &mut clone {
            let (inner, outer) = point.end_points(down_distance, up_distance);
            point.set_zero_velocity();

            if let Some((prev_inner, prev_outer, prev_time, prev_gap)) = prev
                && !point.disable
                && !prev_gap
            {
                let dt = point.time - prev_time;
                if dt > 0.0 {
                    point.velocity_bottom = prev_inner.distance(inner) / dt;
                    point.velocity_top = prev_outer.distance(outer) / dt;
                } else {
                    warn!(
                        "Bad sweep time delta {} at sample time {}, using zero velocity",
                        dt, point.time
                    );
                }
            }

            prev = Some((inner, outer, point.time, point.disable));
        }

        clone
    }

    /// Contiguous runs of non-gap samples.
    ///
    /// Each run is a slice a trail may be drawn through without bridging a
    /// gap. Runs with fewer than two samples are skipped.
    pub fn segments(points: &[SweepPoint]) -> impl Iterator<Item = &[SweepPoint]> {
        points
            .split(|p| p.disable)
            .filter(|run| run.len() >= 2)
    }

    /// Interpolated sample at `time`, clamped to the path ends
    pub fn sample_at(points: &[SweepPoint], time: f32) -> Option<SweepPoint> {
        let first = points.first()?;
        let last = points.last()?;
        if time <= first.time {
            return Some(*first);
        }
        if time >= last.time {
            return Some(*last);
        }

        let next = points.partition_point(|p| p.time <= time);
        let a = &points[next - 1];
        let b = &points[next];
        let span = b.time - a.time;
        let t = if span > 0.0 { (time - a.time) / span } else { 1.0 };
        Some(a.lerp(b, t))
    }
}

impl From<Vec<SweepPoint>> for SweepPointCollection {
    fn from(points: Vec<SweepPoint>) -> Self {
        Self::new(points)
    }
}
