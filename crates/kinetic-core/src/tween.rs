//! Leaf nodes: tweens that write interpolated values through an accessor.
//!
//! Bound tweens are created by [`TweenEngine`](crate::TweenEngine), which
//! resolves the accessor for the target's type. [`Tween::call`] and
//! [`Tween::mark`] need no target and can be built directly.
//!
//! # Usage
//!
//! ```ignore
//! let position = shared(MutableVec2::new(0.0, 0.0));
//! let tween = engine
//!     .to(&position, MutableVec2::XY, 1.0)?
//!     .target(&[100.0, 50.0])?
//!     .ease(EasingFunction::BackOut)
//!     .delay(0.25)?
//!     .repeat_auto_reverse(1, 0.5)?;
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use kinetic_config::EngineConfig;

use crate::accessor::{self, Binding, Bound, Shared, TweenAccessor};
use crate::callbacks::{EventMask, TweenCallback, TweenEvent};
use crate::control::TweenHandle;
use crate::easing::EasingFunction;
use crate::error::{Result, TweenError};
use crate::lifecycle::{Hook, Lifecycle, Step};
use crate::path::{TweenPath, lerp};

/// Size of the scratch buffer used to count an accessor's components.
pub const MAX_COMBINED_ATTRIBUTES: usize = 16;

/// Iterations shorter than this always write their target values.
const DURATION_EPSILON: f32 = 1e-6;

/// A leaf node animating one target.
pub struct Tween {
    pub(crate) life: Lifecycle,
    pub(crate) values: TweenValues,
}

pub(crate) struct TweenValues {
    binding: Option<Box<dyn Binding>>,
    count: usize,
    waypoints_limit: usize,
    is_from: bool,
    is_relative: bool,
    easing: EasingFunction,
    path: TweenPath,
    target: Vec<f32>,
    // Flattened, `count` values per waypoint.
    waypoints: Vec<f32>,

    initialized: bool,
    start_values: Vec<f32>,
    end_values: Vec<f32>,
    way_values: Vec<f32>,
    points: Vec<f32>,
    buffer: Vec<f32>,
}

impl Tween {
    pub(crate) fn bound<T: Send + 'static>(
        target: &Shared<T>,
        tween_type: i32,
        accessor: Arc<dyn TweenAccessor<T>>,
        duration: f32,
        limits: &EngineConfig,
        is_from: bool,
    ) -> Result<Self> {
        if duration < 0.0 {
            return Err(TweenError::NegativeDuration(duration));
        }

        let mut scratch = vec![0.0; limits.combined_attributes_limit.max(MAX_COMBINED_ATTRIBUTES)];
        let count = accessor.get_values(&target.lock(), tween_type, &mut scratch);
        if count > limits.combined_attributes_limit {
            return Err(TweenError::CombinedAttributesLimit {
                count,
                limit: limits.combined_attributes_limit,
            });
        }

        let binding = Bound::new(Arc::clone(target), tween_type, accessor);
        Ok(Self::with_values(
            duration,
            TweenValues::new(Some(Box::new(binding)), count, limits.waypoints_limit, is_from),
        ))
    }

    /// A zero-duration tween that invokes `handler` when it starts.
    pub fn call(handler: impl FnMut(TweenEvent, &Lifecycle) + Send + 'static) -> Self {
        let mut tween = Self::mark();
        tween.life.add_callback(TweenCallback::on(EventMask::START, handler));
        tween
    }

    /// An empty zero-duration tween. Used as a placeholder or pause.
    pub fn mark() -> Self {
        Self::with_values(0.0, TweenValues::new(None, 0, 0, false))
    }

    fn with_values(duration: f32, values: TweenValues) -> Self {
        Self {
            life: Lifecycle::new(duration),
            values,
        }
    }

    /// Set absolute target values (start values for `from` tweens).
    pub fn target(mut self, values: &[f32]) -> Result<Self> {
        self.set_target(values, false)?;
        Ok(self)
    }

    /// Set target values relative to the values read at BEGIN.
    pub fn target_relative(mut self, values: &[f32]) -> Result<Self> {
        self.set_target(values, true)?;
        Ok(self)
    }

    fn set_target(&mut self, values: &[f32], relative: bool) -> Result<()> {
        self.life.ensure_unstarted()?;
        self.values.check_arity(values)?;
        self.values.target.copy_from_slice(values);
        self.values.is_relative = relative;
        Ok(())
    }

    /// Add an intermediate point the values pass through.
    pub fn waypoint(mut self, values: &[f32]) -> Result<Self> {
        self.life.ensure_unstarted()?;
        self.values.check_arity(values)?;
        let count = self.waypoint_count() + 1;
        if count > self.values.waypoints_limit {
            return Err(TweenError::WaypointsLimit {
                count,
                limit: self.values.waypoints_limit,
            });
        }
        self.values.waypoints.extend_from_slice(values);
        Ok(self)
    }

    pub fn path(mut self, path: TweenPath) -> Self {
        self.values.path = path;
        self
    }

    pub fn ease(mut self, easing: EasingFunction) -> Self {
        self.values.easing = easing;
        self
    }

    /// Add to the start delay.
    pub fn delay(mut self, seconds: f32) -> Result<Self> {
        self.life.add_delay(seconds)?;
        Ok(self)
    }

    /// Repeat `count` more times (`-1` forever), restarting from the start.
    pub fn repeat(mut self, count: i32, delay: f32) -> Result<Self> {
        self.life.set_repeat(count, delay, false)?;
        Ok(self)
    }

    /// Repeat `count` more times (`-1` forever), alternating direction.
    pub fn repeat_auto_reverse(mut self, count: i32, delay: f32) -> Result<Self> {
        self.life.set_repeat(count, delay, true)?;
        Ok(self)
    }

    pub fn add_callback(mut self, callback: TweenCallback) -> Self {
        self.life.add_callback(callback);
        self
    }

    /// Drop every listener added so far.
    pub fn clear_callbacks(mut self) -> Self {
        self.life.clear_callbacks();
        self
    }

    /// Run `action` at the start of every update, before any event fires.
    pub fn on_update_start(mut self, action: impl FnMut(&Lifecycle) + Send + 'static) -> Self {
        self.life.set_update_start(Box::new(action));
        self
    }

    /// Run `action` at the end of every update, after values were written.
    pub fn on_update_end(mut self, action: impl FnMut(&Lifecycle) + Send + 'static) -> Self {
        self.life.set_update_end(Box::new(action));
        self
    }

    pub fn user_data(mut self, data: impl Any + Send) -> Self {
        self.life.set_user_data(Box::new(data));
        self
    }

    // Driving

    pub fn start(&mut self) -> Result<()> {
        self.life.start()
    }

    /// Advance as a root node. Overflow past either end is kept locally.
    pub fn update(&mut self, delta: f32) -> Result<()> {
        let leftover = self.advance(delta)?;
        if leftover != 0.0 {
            self.life.absorb(leftover);
        }
        self.life.control().flush_write();
        Ok(())
    }

    pub(crate) fn advance(&mut self, delta: f32) -> Result<f32> {
        self.life.advance(&mut self.values, delta)
    }

    /// Back to its unstarted state. Configuration and callbacks are kept.
    pub fn reset(&mut self) {
        self.life.reset();
        self.values.initialized = false;
    }

    pub(crate) fn rewind(&mut self, forwards: bool) {
        self.life.rewind(forwards);
        // An auto-reversed last iteration ends on the start values.
        self.values.write_endpoint(forwards || self.life.is_flipped());
    }

    /// Write the start or target values without moving time. Does nothing
    /// before the start values have been captured.
    pub fn set_values(&mut self, use_start: bool) {
        self.values.write_endpoint(use_start);
    }

    // Queries

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.life
    }

    pub fn handle(&self) -> TweenHandle {
        self.life.handle()
    }

    /// Number of components the accessor reads and writes.
    pub fn combined_attributes_count(&self) -> usize {
        self.values.count
    }

    pub fn waypoint_count(&self) -> usize {
        if self.values.count == 0 {
            0
        } else {
            self.values.waypoints.len() / self.values.count
        }
    }

    pub fn target_values(&self) -> &[f32] {
        &self.values.target
    }

    pub fn easing(&self) -> EasingFunction {
        self.values.easing
    }

    pub fn tween_type(&self) -> Option<i32> {
        self.values.binding.as_ref().map(|b| b.tween_type())
    }

    pub fn is_from(&self) -> bool {
        self.values.is_from
    }

    pub fn contains_target<T>(&self, target: &Shared<T>) -> bool {
        self.values
            .binding
            .as_ref()
            .is_some_and(|b| b.target_id() == accessor::target_id(target))
    }

    pub fn contains_target_type<T>(&self, target: &Shared<T>, tween_type: i32) -> bool {
        self.contains_target(target) && self.tween_type() == Some(tween_type)
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("life", &self.life)
            .field("tween_type", &self.tween_type())
            .field("easing", &self.values.easing)
            .field("target", &self.values.target)
            .finish_non_exhaustive()
    }
}

impl TweenValues {
    fn new(binding: Option<Box<dyn Binding>>, count: usize, waypoints_limit: usize, is_from: bool) -> Self {
        Self {
            binding,
            count,
            waypoints_limit,
            is_from,
            is_relative: false,
            easing: EasingFunction::QuadInOut,
            path: TweenPath::default(),
            target: vec![0.0; count],
            waypoints: Vec::new(),
            initialized: false,
            start_values: vec![0.0; count],
            end_values: vec![0.0; count],
            way_values: Vec::new(),
            points: Vec::new(),
            buffer: vec![0.0; count],
        }
    }

    fn check_arity(&self, values: &[f32]) -> Result<()> {
        if values.len() != self.count {
            return Err(TweenError::TargetValueCount {
                expected: self.count,
                got: values.len(),
            });
        }
        Ok(())
    }

    fn write_endpoint(&mut self, use_start: bool) {
        if self.initialized {
            self.apply(if use_start { 0.0 } else { 1.0 });
        }
    }

    fn apply(&mut self, progress: f32) {
        let Some(binding) = &self.binding else {
            return;
        };
        let count = self.count;
        let ways = if count == 0 { 0 } else { self.way_values.len() / count };

        for i in 0..count {
            self.buffer[i] = if ways == 0 {
                lerp(self.start_values[i], self.end_values[i], progress)
            } else {
                self.points.clear();
                self.points.push(self.start_values[i]);
                self.points.extend((0..ways).map(|w| self.way_values[w * count + i]));
                self.points.push(self.end_values[i]);
                self.path.compute(progress, &self.points)
            };
        }
        binding.write(&self.buffer);
    }
}

impl Hook for TweenValues {
    fn initialize(&mut self, _node: &Lifecycle) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        if let Some(binding) = &self.binding {
            binding.read(&mut self.start_values);
            self.end_values.copy_from_slice(&self.target);
            self.way_values.clone_from(&self.waypoints);

            if self.is_relative {
                let start = &self.start_values;
                for (i, value) in self.end_values.iter_mut().enumerate() {
                    *value += start[i];
                }
                for (i, value) in self.way_values.iter_mut().enumerate() {
                    *value += start[i % self.count];
                }
            }

            if self.is_from {
                std::mem::swap(&mut self.start_values, &mut self.end_values);
            }
        }
        self.initialized = true;
        Ok(())
    }

    fn animate(&mut self, node: &Lifecycle, step: Step) -> Result<()> {
        if step == Step::Idle || !self.initialized || node.is_in_delay() {
            return Ok(());
        }
        let progress = if node.duration() <= DURATION_EPSILON {
            1.0
        } else {
            let t = (node.current_time() / node.duration()).clamp(0.0, 1.0);
            self.easing.evaluate(t)
        };
        self.apply(progress);
        Ok(())
    }

    fn rewind(&mut self, _forwards: bool) -> Result<()> {
        Ok(())
    }
}
