//! Error types for tween construction and advancement.

use thiserror::Error;

use crate::lifecycle::Phase;

/// Result type for tween operations.
pub type Result<T> = std::result::Result<T, TweenError>;

/// Errors raised by node configuration, composition and advancement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweenError {
    /// Repeat count below -1.
    #[error("repeat count must be -1 (infinite) or >= 0, got {0}")]
    InvalidRepeatCount(i32),

    /// Negative delay between repeat iterations.
    #[error("repeat delay must be >= 0, got {0}")]
    NegativeRepeatDelay(f32),

    /// Negative start delay.
    #[error("delay must be >= 0, got {0}")]
    NegativeDelay(f32),

    /// Negative pause pushed into a timeline.
    #[error("pause duration must be >= 0, got {0}")]
    NegativePause(f32),

    /// Negative iteration length.
    #[error("duration must be >= 0, got {0}")]
    NegativeDuration(f32),

    /// A sequence or parallel block was closed (or built) without children.
    #[error("timeline block has no children")]
    EmptyTimeline,

    /// A child with infinite repeats was added to a timeline.
    #[error("nodes repeating forever cannot be nested inside a timeline")]
    InfiniteRepeatInTimeline,

    /// `end()` was called with no open nested block.
    #[error("no open timeline block to end")]
    NothingToEnd,

    /// `build()` was called with nested blocks still open.
    #[error("{0} timeline block(s) still open")]
    UnclosedTimeline(usize),

    /// The accessor reported more components than the engine allows.
    #[error("accessor returned {count} components, limit is {limit}")]
    CombinedAttributesLimit { count: usize, limit: usize },

    /// More waypoints than the engine allows.
    #[error("tween has {count} waypoints, limit is {limit}")]
    WaypointsLimit { count: usize, limit: usize },

    /// Target or waypoint arity does not match the accessor.
    #[error("expected {expected} values, got {got}")]
    TargetValueCount { expected: usize, got: usize },

    /// No accessor registered for the target type.
    #[error("no accessor registered for {0}")]
    NoAccessor(&'static str),

    /// Advancing a node that was never started.
    #[error("node has not been started")]
    NotStarted,

    /// Starting or reconfiguring a node that already started.
    #[error("node has already been started")]
    AlreadyStarted,

    /// Progress outside the unit interval.
    #[error("progress must lie in [0, 1], got {0}")]
    ProgressOutOfRange(f32),

    /// Progress asked of a node that repeats forever.
    #[error("nodes repeating forever have no progress")]
    UnboundedProgress,

    /// The state machine reached a phase it cannot advance from.
    #[error("unexpected phase {0:?} during advancement")]
    UnexpectedPhase(Phase),
}
