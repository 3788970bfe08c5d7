//! Incremental trail ribbon built from a sweep path

use super::colors::{TrailColorArgs, TrailColorProvider};
use super::point::{SweepPoint, SweepPointCollection};
use crate::types::{Color, Lerp};
use glam::Vec3;

/// Playback times closer than this count as the same frame
const SAME_TIME_EPSILON: f32 = 0.0001;

/// No interpolated edge is added this close to a real sample
const INTERPOLATION_EPSILON: f32 = 0.001;

/// One edge line across the ribbon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonLine {
    pub inner: Vec3,
    pub outer: Vec3,
    pub time: f32,
    pub velocity_top: f32,
    pub velocity_bottom: f32,
    /// Trail continuity breaks at this line
    pub gap: bool,
}

/// Two-sided triangle mesh of a ribbon
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RibbonMesh {
    pub vertices: Vec<Vec3>,
    pub colors: Vec<Color>,
    pub indices: Vec<u32>,
}

impl RibbonMesh {
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    fn push_quad(&mut self, a: &RibbonLine, b: &RibbonLine, colors: [(Color, Color); 2]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend([a.outer, a.inner, b.inner, b.outer]);
        self.colors
            .extend([colors[0].1, colors[0].0, colors[1].0, colors[1].1]);
        // Front and back faces
        self.indices.extend([
            base,
            base + 1,
            base + 2,
            base,
            base + 2,
            base + 3,
            base,
            base + 2,
            base + 1,
            base,
            base + 3,
            base + 2,
        ]);
    }
}

/// Incrementally built trail of one sweep path
#[derive(Debug, Clone)]
pub struct SweepRibbon {
    points: Vec<SweepPoint>,
    down_distance: f32,
    up_distance: f32,
    mirror_horizontal: bool,
    lines: Vec<RibbonLine>,
    interpolated: Option<RibbonLine>,
    last_index: Option<usize>,
    last_time: Option<f32>,
}

impl SweepRibbon {
    /// Ribbon over a sweep path, extruded `down_distance` inwards and
    /// `up_distance` outwards along the right direction
    pub fn new(path: &SweepPointCollection, down_distance: f32, up_distance: f32) -> Self {
        Self {
            points: path.clone_with_velocities(down_distance, up_distance),
            down_distance,
            up_distance,
            mirror_horizontal: false,
            lines: Vec::new(),
            interpolated: None,
            last_index: None,
            last_time: None,
        }
    }

    /// Change horizontal mirroring; the ribbon is rebuilt on the next update
    pub fn set_mirror_horizontal(&mut self, mirror: bool) {
        if mirror != self.mirror_horizontal {
            self.mirror_horizontal = mirror;
            self.last_time = None;
            self.clear();
        }
    }

    /// Samples with derived velocities
    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    /// Lines crossed so far, plus the interpolated head if any
    pub fn lines(&self) -> impl Iterator<Item = &RibbonLine> {
        self.lines.iter().chain(self.interpolated.as_ref())
    }

    pub fn last_time(&self) -> Option<f32> {
        self.last_time
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.interpolated = None;
        self.last_index = None;
    }

    fn line(&self, point: &SweepPoint, time: f32) -> RibbonLine {
        let (mut inner, mut outer) = point.end_points(self.down_distance, self.up_distance);
        if self.mirror_horizontal {
            inner.x = -inner.x;
            outer.x = -outer.x;
        }
        RibbonLine {
            inner,
            outer,
            time,
            velocity_top: point.velocity_top,
            velocity_bottom: point.velocity_bottom,
            gap: point.disable,
        }
    }

    /// Advance the ribbon to playback `time`.
    ///
    /// Moving backwards rebuilds from the start. Returns false when `time`
    /// is the frame already built.
    pub fn update(&mut self, time: f32) -> bool {
        if let Some(last) = self.last_time {
            if (time - last).abs() < SAME_TIME_EPSILON {
                return false;
            }
            if time < last {
                self.clear();
            }
        }

        let start = self.last_index.map_or(0, |i| i + 1);
        for i in start..self.points.len() {
            let point = self.points[i];
            if point.time > time {
                break;
            }
            let line = self.line(&point, point.time);
            self.lines.push(line);
            self.last_index = Some(i);
        }

        self.interpolated = self.interpolated_line(time);
        self.last_time = Some(time);
        true
    }

    fn interpolated_line(&self, time: f32) -> Option<RibbonLine> {
        let index = self.last_index?;
        let last = self.points.get(index)?;
        let next = self.points.get(index + 1)?;
        if (last.time - time).abs() < INTERPOLATION_EPSILON {
            return None;
        }

        let span = next.time - last.time;
        let t = if span > 0.0 {
            ((time - last.time) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Some(self.line(&last.lerp(next, t), time))
    }

    /// Build the mesh of the current ribbon; no quad bridges a gap line
    pub fn build_mesh(&self, colors: &dyn TrailColorProvider, tint: Color) -> RibbonMesh {
        let mut mesh = RibbonMesh::default();
        let last_time = self.last_time.unwrap_or(0.0);
        let color_of = |line: &RibbonLine| {
            colors.trail_colors(&TrailColorArgs {
                time: line.time,
                last_time,
                up_velocity: line.velocity_top,
                down_velocity: line.velocity_bottom,
                tint,
            })
        };

        let lines: Vec<&RibbonLine> = self.lines().collect();
        for pair in lines.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.gap || b.gap {
                continue;
            }
            mesh.push_quad(a, b, [color_of(a), color_of(b)]);
        }
        mesh
    }
}
