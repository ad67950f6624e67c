//! Ready-made animatable values and their accessors.

use serde::{Deserialize, Serialize};

use crate::accessor::TweenAccessor;

/// A single animatable float.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MutableFloat(pub f32);

impl MutableFloat {
    pub fn new(value: f32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn set(&mut self, value: f32) {
        self.0 = value;
    }
}

/// Accessor for [`MutableFloat`]. The tween type is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutableFloatAccessor;

impl TweenAccessor<MutableFloat> for MutableFloatAccessor {
    fn get_values(&self, target: &MutableFloat, _tween_type: i32, values: &mut [f32]) -> usize {
        values[0] = target.0;
        1
    }

    fn set_values(&self, target: &mut MutableFloat, _tween_type: i32, values: &[f32]) {
        target.0 = values[0];
    }
}

/// An animatable 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MutableVec2 {
    pub x: f32,
    pub y: f32,
}

impl MutableVec2 {
    /// Animate `x` only.
    pub const X: i32 = 1;
    /// Animate `y` only.
    pub const Y: i32 = 2;
    /// Animate both components.
    pub const XY: i32 = 3;

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Accessor for [`MutableVec2`], keyed by [`MutableVec2::X`],
/// [`MutableVec2::Y`] or [`MutableVec2::XY`]. Unknown types read nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutableVec2Accessor;

impl TweenAccessor<MutableVec2> for MutableVec2Accessor {
    fn get_values(&self, target: &MutableVec2, tween_type: i32, values: &mut [f32]) -> usize {
        match tween_type {
            MutableVec2::X => {
                values[0] = target.x;
                1
            }
            MutableVec2::Y => {
                values[0] = target.y;
                1
            }
            MutableVec2::XY => {
                values[0] = target.x;
                values[1] = target.y;
                2
            }
            _ => 0,
        }
    }

    fn set_values(&self, target: &mut MutableVec2, tween_type: i32, values: &[f32]) {
        match tween_type {
            MutableVec2::X => target.x = values[0],
            MutableVec2::Y => target.y = values[0],
            MutableVec2::XY => {
                target.x = values[0];
                target.y = values[1];
            }
            _ => {}
        }
    }
}
