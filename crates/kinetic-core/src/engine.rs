//! Tween factory with a registry of accessors keyed by target type.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use kinetic_config::EngineConfig;

use crate::accessor::{Shared, TweenAccessor};
use crate::callbacks::TweenEvent;
use crate::error::{Result, TweenError};
use crate::lifecycle::Lifecycle;
use crate::primitives::{MutableFloat, MutableFloatAccessor, MutableVec2, MutableVec2Accessor};
use crate::tween::Tween;

/// Builds tweens for registered target types.
///
/// ```ignore
/// let mut engine = TweenEngine::from_config(&config.engine);
/// engine.register_accessor::<Sprite>(SpriteAccessor);
///
/// let fade = engine.to(&sprite, SpriteAccessor::ALPHA, 0.5)?.target(&[0.0])?;
/// ```
pub struct TweenEngine {
    // TypeId of T -> Arc<dyn TweenAccessor<T>>
    accessors: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    limits: EngineConfig,
}

impl TweenEngine {
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            accessors: HashMap::new(),
            limits: config.clone(),
        }
    }

    /// Register the accessors for [`MutableFloat`] and [`MutableVec2`].
    pub fn with_primitives(mut self) -> Self {
        self.register_accessor::<MutableFloat>(MutableFloatAccessor);
        self.register_accessor::<MutableVec2>(MutableVec2Accessor);
        self
    }

    /// Use `accessor` for every target of type `T`, replacing any previous one.
    pub fn register_accessor<T: 'static>(&mut self, accessor: impl TweenAccessor<T> + 'static) {
        let accessor: Arc<dyn TweenAccessor<T>> = Arc::new(accessor);
        if self
            .accessors
            .insert(TypeId::of::<T>(), Arc::new(accessor))
            .is_some()
        {
            debug!(target_type = type_name::<T>(), "accessor replaced");
        }
    }

    pub fn has_accessor<T: 'static>(&self) -> bool {
        self.accessors.contains_key(&TypeId::of::<T>())
    }

    fn accessor<T: 'static>(&self) -> Result<Arc<dyn TweenAccessor<T>>> {
        self.accessors
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn TweenAccessor<T>>>())
            .cloned()
            .ok_or(TweenError::NoAccessor(type_name::<T>()))
    }

    /// Animate `target` from its current values to the values set with
    /// [`Tween::target`].
    pub fn to<T: Send + 'static>(&self, target: &Shared<T>, tween_type: i32, duration: f32) -> Result<Tween> {
        Tween::bound(target, tween_type, self.accessor()?, duration, &self.limits, false)
    }

    /// Animate `target` from the values set with [`Tween::target`] to its
    /// current values.
    pub fn from<T: Send + 'static>(&self, target: &Shared<T>, tween_type: i32, duration: f32) -> Result<Tween> {
        Tween::bound(target, tween_type, self.accessor()?, duration, &self.limits, true)
    }

    /// Snap `target` to the values set with [`Tween::target`] once started.
    pub fn set<T: Send + 'static>(&self, target: &Shared<T>, tween_type: i32) -> Result<Tween> {
        self.to(target, tween_type, 0.0)
    }

    pub fn call(&self, handler: impl FnMut(TweenEvent, &Lifecycle) + Send + 'static) -> Tween {
        Tween::call(handler)
    }

    pub fn mark(&self) -> Tween {
        Tween::mark()
    }

    pub fn limits(&self) -> &EngineConfig {
        &self.limits
    }
}

impl Default for TweenEngine {
    fn default() -> Self {
        Self::new()
    }
}
