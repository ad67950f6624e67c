//! Tween and timeline animation engine.
//!
//! Tweens interpolate the `f32` components of any target through a
//! [`TweenAccessor`]. Timelines compose tweens and other timelines in
//! sequence or in parallel. Both run the same phase state machine
//! ([`Lifecycle`]): optional start delay, repeats with optional delay,
//! auto-reverse, and full reversibility when driven with negative deltas.
//!
//! ```ignore
//! use kinetic_core::{shared, MutableFloat, Timeline, TweenEngine, TweenManager};
//!
//! let engine = TweenEngine::new().with_primitives();
//! let value = shared(MutableFloat::new(0.0));
//!
//! let timeline = Timeline::sequence()
//!     .push(engine.to(&value, 0, 1.0)?.target(&[10.0])?)?
//!     .push_pause(0.5)?
//!     .push(engine.to(&value, 0, 1.0)?.target(&[0.0])?)?
//!     .repeat_auto_reverse(1, 0.0)?
//!     .build()?;
//!
//! let mut manager = TweenManager::new();
//! manager.add(timeline)?;
//! manager.update(0.016)?;
//! ```

pub mod accessor;
pub mod callbacks;
pub mod control;
pub mod easing;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod node;
pub mod path;
pub mod primitives;
pub mod timeline;
pub mod tween;

pub use accessor::{Shared, TweenAccessor, shared};
pub use callbacks::{EventMask, TweenCallback, TweenEvent, UpdateAction};
pub use control::{NodeId, TweenHandle};
pub use easing::EasingFunction;
pub use engine::TweenEngine;
pub use error::{Result, TweenError};
pub use kinetic_config::EngineConfig;
pub use lifecycle::{Lifecycle, Phase};
pub use manager::TweenManager;
pub use node::Node;
pub use path::TweenPath;
pub use primitives::{MutableFloat, MutableFloatAccessor, MutableVec2, MutableVec2Accessor};
pub use timeline::{Mode, Timeline, TimelineBuilder};
pub use tween::Tween;
