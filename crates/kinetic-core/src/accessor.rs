//! The bridge between tweens and the objects they animate.
//!
//! A [`TweenAccessor`] reads and writes a fixed number of `f32` components
//! of a target, selected by an integer tween type. Targets are shared with
//! the tween as [`Shared<T>`] so that application code keeps its own handle
//! to the animated object.

use parking_lot::Mutex;
use std::sync::Arc;

/// Target shared between application code and the tweens animating it.
pub type Shared<T> = Arc<Mutex<T>>;

/// Wrap a value so it can be targeted by tweens.
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Reads and writes the animatable components of `T`.
///
/// ```ignore
/// struct Opacity;
///
/// impl TweenAccessor<Sprite> for Opacity {
///     fn get_values(&self, sprite: &Sprite, _tween_type: i32, values: &mut [f32]) -> usize {
///         values[0] = sprite.alpha;
///         1
///     }
///
///     fn set_values(&self, sprite: &mut Sprite, _tween_type: i32, values: &[f32]) {
///         sprite.alpha = values[0];
///     }
/// }
/// ```
pub trait TweenAccessor<T>: Send + Sync {
    /// Write the current components into `values` and return how many were
    /// written.
    fn get_values(&self, target: &T, tween_type: i32, values: &mut [f32]) -> usize;

    /// Apply interpolated components to the target.
    fn set_values(&self, target: &mut T, tween_type: i32, values: &[f32]);
}

/// Type-erased target, tween type and accessor held by a tween.
pub(crate) trait Binding: Send {
    fn read(&self, values: &mut [f32]) -> usize;
    fn write(&self, values: &[f32]);
    /// Address of the shared target, used for identity comparisons.
    fn target_id(&self) -> usize;
    fn tween_type(&self) -> i32;
}

pub(crate) struct Bound<T> {
    target: Shared<T>,
    tween_type: i32,
    accessor: Arc<dyn TweenAccessor<T>>,
}

impl<T> Bound<T> {
    pub(crate) fn new(target: Shared<T>, tween_type: i32, accessor: Arc<dyn TweenAccessor<T>>) -> Self {
        Self {
            target,
            tween_type,
            accessor,
        }
    }
}

pub(crate) fn target_id<T>(target: &Shared<T>) -> usize {
    Arc::as_ptr(target) as *const () as usize
}

impl<T: Send + 'static> Binding for Bound<T> {
    fn read(&self, values: &mut [f32]) -> usize {
        let target = self.target.lock();
        self.accessor.get_values(&target, self.tween_type, values)
    }

    fn write(&self, values: &[f32]) {
        let mut target = self.target.lock();
        self.accessor.set_values(&mut target, self.tween_type, values);
    }

    fn target_id(&self) -> usize {
        target_id(&self.target)
    }

    fn tween_type(&self) -> i32 {
        self.tween_type
    }
}
