//! Interpolation paths through tween waypoints.
//!
//! A path maps eased progress `t` in `[0, 1]` onto a list of control points
//! for one component: `[start, waypoint₁, …, waypointₙ, target]`. The points
//! are split into equal-length segments by index.

use serde::{Deserialize, Serialize};

/// Curve followed between start, waypoints and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenPath {
    /// Straight segments between consecutive points.
    Linear,
    /// Catmull-Rom spline through every point.
    #[default]
    CatmullRom,
}

impl TweenPath {
    /// Value of the path at progress `t`.
    pub fn compute(&self, t: f32, points: &[f32]) -> f32 {
        match points {
            [] => 0.0,
            [only] => *only,
            [from, to] => lerp(*from, *to, t),
            _ => {
                let (segment, local) = locate(t, points.len());
                match self {
                    Self::Linear => lerp(points[segment], points[segment + 1], local),
                    Self::CatmullRom => {
                        let at = |i: isize| points[i.clamp(0, points.len() as isize - 1) as usize];
                        let s = segment as isize;
                        catmull_rom(at(s - 1), at(s), at(s + 1), at(s + 2), local)
                    }
                }
            }
        }
    }
}

#[inline]
pub(crate) fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Segment index and progress inside it. `count` must be at least 2.
fn locate(t: f32, count: usize) -> (usize, f32) {
    let span = (count - 1) as f32;
    let segment = ((span * t).floor().max(0.0) as usize).min(count - 2);
    (segment, span * t - segment as f32)
}

/// Hermite form of the Catmull-Rom spline between `b` and `c`.
fn catmull_rom(a: f32, b: f32, c: f32, d: f32, t: f32) -> f32 {
    let t1 = (c - a) * 0.5;
    let t2 = (d - b) * 0.5;

    let t2_sq = t * t;
    let t3 = t2_sq * t;
    let h1 = 2.0 * t3 - 3.0 * t2_sq + 1.0;
    let h2 = -2.0 * t3 + 3.0 * t2_sq;
    let h3 = t3 - 2.0 * t2_sq + t;
    let h4 = t3 - t2_sq;

    b * h1 + c * h2 + t1 * h3 + t2 * h4
}
