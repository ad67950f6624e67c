//! Easing functions applied to normalized iteration progress.
//!
//! Two families are provided:
//! - CSS timing functions: `Linear`, `Ease`, `EaseIn`, `EaseOut`,
//!   `EaseInOut`, `CubicBezier` and `Steps`
//! - Robert Penner's equations: quad, cubic, quart, quint, sine, expo, circ,
//!   back, bounce and elastic, each with `In`, `Out` and `InOut` variants
//!
//! # Usage
//!
//! ```
//! use kinetic_core::easing::{EasingFunction, StepPosition};
//!
//! assert_eq!(EasingFunction::QuadInOut.evaluate(0.5), 0.5);
//!
//! let material = EasingFunction::cubic_bezier(0.4, 0.0, 0.2, 1.0);
//! assert!(material.evaluate(0.5) > 0.5);
//!
//! let ticks = EasingFunction::steps(4, StepPosition::End);
//! assert_eq!(ticks.evaluate(0.3), 0.25);
//! ```

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Where the jumps of a [`EasingFunction::Steps`] curve fall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// `jump-start`: the first jump happens immediately.
    Start,
    /// `jump-end`: the last jump happens at the end.
    #[default]
    End,
    /// `jump-both`: an extra jump at each end.
    Both,
    /// `jump-none`: holds the first and last levels.
    None,
}

/// Curve applied to iteration progress.
///
/// Maps linear progress in `[0, 1]` to eased progress. Back and elastic
/// curves overshoot outside that range in the middle of the curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    /// Identity.
    Linear,

    /// CSS `ease`, equivalent to `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    #[default]
    Ease,
    /// CSS `ease-in`, equivalent to `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,
    /// CSS `ease-out`, equivalent to `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,
    /// CSS `ease-in-out`, equivalent to `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,

    /// Any CSS `cubic-bezier`. Build it with [`EasingFunction::cubic_bezier`].
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },

    /// CSS `steps`. Build it with [`EasingFunction::steps`].
    Steps { count: u32, position: StepPosition },

    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    QuintIn,
    QuintOut,
    QuintInOut,
    SineIn,
    SineOut,
    SineInOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    CircIn,
    CircOut,
    CircInOut,
    /// Overshoots backwards before moving forwards.
    BackIn,
    BackOut,
    BackInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
}

impl EasingFunction {
    /// Every Penner curve, in declaration order.
    pub const PENNER: [EasingFunction; 30] = [
        Self::QuadIn,
        Self::QuadOut,
        Self::QuadInOut,
        Self::CubicIn,
        Self::CubicOut,
        Self::CubicInOut,
        Self::QuartIn,
        Self::QuartOut,
        Self::QuartInOut,
        Self::QuintIn,
        Self::QuintOut,
        Self::QuintInOut,
        Self::SineIn,
        Self::SineOut,
        Self::SineInOut,
        Self::ExpoIn,
        Self::ExpoOut,
        Self::ExpoInOut,
        Self::CircIn,
        Self::CircOut,
        Self::CircInOut,
        Self::BackIn,
        Self::BackOut,
        Self::BackInOut,
        Self::BounceIn,
        Self::BounceOut,
        Self::BounceInOut,
        Self::ElasticIn,
        Self::ElasticOut,
        Self::ElasticInOut,
    ];

    /// Eased value of `t`, which is clamped to `[0, 1]` first.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Steps { count, position } => stepped(*count, *position, t),

            Self::QuadIn => t * t,
            Self::QuadOut => -t * (t - 2.0),
            Self::QuadInOut => in_out(t, |t| t * t),
            Self::CubicIn => t * t * t,
            Self::CubicOut => out_of(t, |t| t * t * t),
            Self::CubicInOut => in_out(t, |t| t * t * t),
            Self::QuartIn => t.powi(4),
            Self::QuartOut => out_of(t, |t| t.powi(4)),
            Self::QuartInOut => in_out(t, |t| t.powi(4)),
            Self::QuintIn => t.powi(5),
            Self::QuintOut => out_of(t, |t| t.powi(5)),
            Self::QuintInOut => in_out(t, |t| t.powi(5)),
            Self::SineIn => 1.0 - (t * FRAC_PI_2).cos(),
            Self::SineOut => (t * FRAC_PI_2).sin(),
            Self::SineInOut => -0.5 * ((PI * t).cos() - 1.0),
            Self::ExpoIn => expo_in(t),
            Self::ExpoOut => expo_out(t),
            Self::ExpoInOut => in_out(t, expo_in),
            Self::CircIn => circ_in(t),
            Self::CircOut => out_of(t, circ_in),
            Self::CircInOut => in_out(t, circ_in),
            Self::BackIn => back_in(t, BACK_OVERSHOOT),
            Self::BackOut => out_of(t, |t| back_in(t, BACK_OVERSHOOT)),
            Self::BackInOut => in_out(t, |t| back_in(t, BACK_OVERSHOOT * 1.525)),
            Self::BounceIn => out_of(t, bounce_out),
            Self::BounceOut => bounce_out(t),
            Self::BounceInOut => in_out(t, |t| out_of(t, bounce_out)),
            Self::ElasticIn => elastic_in(t, 0.3),
            Self::ElasticOut => out_of(t, |t| elastic_in(t, 0.3)),
            Self::ElasticInOut => in_out(t, |t| elastic_in(t, 0.45)),
        }
    }

    /// A CSS `cubic-bezier(x1, y1, x2, y2)` curve.
    ///
    /// # Panics
    /// When `x1` or `x2` lies outside `[0, 1]`, which would make the curve
    /// non-monotonic in time.
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2),
            "cubic bezier control x must lie in [0, 1]"
        );
        Self::CubicBezier { x1, y1, x2, y2 }
    }

    /// A CSS `steps(count, position)` curve.
    ///
    /// # Panics
    /// When `count` is zero.
    pub fn steps(count: u32, position: StepPosition) -> Self {
        assert!(count > 0, "step count must be positive");
        Self::Steps { count, position }
    }
}

const BACK_OVERSHOOT: f32 = 1.70158;

/// Mirror an ease-in curve into its ease-out counterpart.
#[inline]
fn out_of(t: f32, ease_in: impl Fn(f32) -> f32) -> f32 {
    1.0 - ease_in(1.0 - t)
}

/// Ease-in on the first half, mirrored ease-out on the second half.
#[inline]
fn in_out(t: f32, ease_in: impl Fn(f32) -> f32) -> f32 {
    if t < 0.5 {
        0.5 * ease_in(2.0 * t)
    } else {
        1.0 - 0.5 * ease_in(2.0 - 2.0 * t)
    }
}

fn expo_in(t: f32) -> f32 {
    if t <= 0.0 {
        0.0
    } else {
        2.0_f32.powf(10.0 * (t - 1.0))
    }
}

fn expo_out(t: f32) -> f32 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2.0_f32.powf(-10.0 * t)
    }
}

fn circ_in(t: f32) -> f32 {
    1.0 - (1.0 - t * t).max(0.0).sqrt()
}

fn back_in(t: f32, s: f32) -> f32 {
    t * t * ((s + 1.0) * t - s)
}

fn bounce_out(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

/// Elastic ease-in with amplitude 1 and the given period.
fn elastic_in(t: f32, period: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let s = period / 4.0;
    let t = t - 1.0;
    -(2.0_f32.powf(10.0 * t) * ((t - s) * (2.0 * PI) / period).sin())
}

fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, progress: f32) -> f32 {
    if progress <= 0.0 || progress >= 1.0 {
        return progress.clamp(0.0, 1.0);
    }
    let x = Cubic::new(x1, x2);
    let y = Cubic::new(y1, y2);
    y.sample(x.solve(progress))
}

/// One coordinate of a bezier with end points 0 and 1, in polynomial form
/// `((a·s + b)·s + c)·s`.
struct Cubic {
    a: f32,
    b: f32,
    c: f32,
}

impl Cubic {
    fn new(p1: f32, p2: f32) -> Self {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        Self { a: 1.0 - c - b, b, c }
    }

    fn sample(&self, s: f32) -> f32 {
        ((self.a * s + self.b) * s + self.c) * s
    }

    fn slope(&self, s: f32) -> f32 {
        (3.0 * self.a * s + 2.0 * self.b) * s + self.c
    }

    /// Parameter `s` at which the curve reaches `value`. Newton steps first,
    /// bisection when the slope flattens out.
    fn solve(&self, value: f32) -> f32 {
        const TOLERANCE: f32 = 1e-6;

        let mut s = value;
        for _ in 0..8 {
            let error = self.sample(s) - value;
            if error.abs() < TOLERANCE {
                return s;
            }
            let slope = self.slope(s);
            if slope.abs() < TOLERANCE {
                break;
            }
            s = (s - error / slope).clamp(0.0, 1.0);
        }

        let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
        s = value;
        for _ in 0..32 {
            let current = self.sample(s);
            if (current - value).abs() < TOLERANCE {
                break;
            }
            if current < value {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) * 0.5;
        }
        s
    }
}

fn stepped(count: u32, position: StepPosition, t: f32) -> f32 {
    let n = count.max(1) as f32;
    let jumps = match position {
        StepPosition::Start => (t * n).ceil(),
        StepPosition::End => (t * n).floor(),
        StepPosition::Both => (t * (n + 1.0)).floor(),
        StepPosition::None if count == 1 => return 0.5,
        StepPosition::None => (t * n).floor(),
    };
    let levels = match position {
        StepPosition::None => n - 1.0,
        _ => n,
    };
    (jumps / levels).min(1.0)
}
