//! Lifecycle events and the callback registry.
//!
//! Every node carries a [`CallbackRegistry`]. Listeners subscribe with an
//! [`EventMask`] and are invoked synchronously, in registration order, while
//! the advancement call that triggered the event is still running.
//!
//! # Usage
//!
//! ```ignore
//! use kinetic_core::{EventMask, TweenCallback, TweenEvent};
//!
//! let callback = TweenCallback::on(EventMask::ANY, |event, node| {
//!     println!("{} at {:.2}", event.label(), node.current_time());
//!     if event == TweenEvent::Complete {
//!         node.handle().kill();
//!     }
//! });
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lifecycle::Lifecycle;

/// The eight lifecycle events a node can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenEvent {
    /// First entry into an iteration pass while moving forwards.
    Begin,
    /// Every entry into an iteration while moving forwards.
    Start,
    /// An iteration reached its end while moving forwards.
    End,
    /// An iteration pass completed while moving forwards.
    Complete,
    /// First entry into an iteration pass while moving in reverse.
    BackBegin,
    /// Every entry into an iteration while moving in reverse.
    BackStart,
    /// An iteration reached its start while moving in reverse.
    BackEnd,
    /// An iteration pass completed while moving in reverse.
    BackComplete,
}

impl TweenEvent {
    /// All events, forwards kinds first.
    pub const ALL: [TweenEvent; 8] = [
        Self::Begin,
        Self::Start,
        Self::End,
        Self::Complete,
        Self::BackBegin,
        Self::BackStart,
        Self::BackEnd,
        Self::BackComplete,
    ];

    /// The single-bit mask for this event.
    pub fn mask(self) -> EventMask {
        match self {
            Self::Begin => EventMask::BEGIN,
            Self::Start => EventMask::START,
            Self::End => EventMask::END,
            Self::Complete => EventMask::COMPLETE,
            Self::BackBegin => EventMask::BACK_BEGIN,
            Self::BackStart => EventMask::BACK_START,
            Self::BackEnd => EventMask::BACK_END,
            Self::BackComplete => EventMask::BACK_COMPLETE,
        }
    }

    /// Whether this event is emitted while moving forwards.
    pub fn is_forward(self) -> bool {
        EventMask::ANY_FORWARD.contains(self.mask())
    }

    /// Fixed-width upper-case label, handy for console traces.
    pub fn label(self) -> &'static str {
        match self {
            Self::Begin => "BEGIN        ",
            Self::Start => "START        ",
            Self::End => "END          ",
            Self::Complete => "COMPLETE     ",
            Self::BackBegin => "BACK_BEGIN   ",
            Self::BackStart => "BACK_START   ",
            Self::BackEnd => "BACK_END     ",
            Self::BackComplete => "BACK_COMPLETE",
        }
    }
}

bitflags! {
    /// Set of [`TweenEvent`]s a listener is interested in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u16 {
        const BEGIN = 1 << 0;
        const START = 1 << 1;
        const END = 1 << 2;
        const COMPLETE = 1 << 3;
        const BACK_BEGIN = 1 << 4;
        const BACK_START = 1 << 5;
        const BACK_END = 1 << 6;
        const BACK_COMPLETE = 1 << 7;

        const ANY_FORWARD = Self::BEGIN.bits()
            | Self::START.bits()
            | Self::END.bits()
            | Self::COMPLETE.bits();
        const ANY_BACKWARD = Self::BACK_BEGIN.bits()
            | Self::BACK_START.bits()
            | Self::BACK_END.bits()
            | Self::BACK_COMPLETE.bits();
        const ANY = Self::ANY_FORWARD.bits() | Self::ANY_BACKWARD.bits();
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::COMPLETE
    }
}

impl From<TweenEvent> for EventMask {
    fn from(event: TweenEvent) -> Self {
        event.mask()
    }
}

/// Listener body. Receives the event and the node that emitted it.
pub type CallbackFn = Box<dyn FnMut(TweenEvent, &Lifecycle) + Send>;

/// Runs once before or once after every advancement of a node, whatever
/// events it fires.
pub type UpdateAction = Box<dyn FnMut(&Lifecycle) + Send>;

/// A listener plus the events it subscribes to.
pub struct TweenCallback {
    triggers: EventMask,
    handler: CallbackFn,
}

impl TweenCallback {
    /// Create a listener for [`TweenEvent::Complete`] only.
    pub fn new(handler: impl FnMut(TweenEvent, &Lifecycle) + Send + 'static) -> Self {
        Self::on(EventMask::default(), handler)
    }

    /// Create a listener for the given events.
    pub fn on(
        triggers: EventMask,
        handler: impl FnMut(TweenEvent, &Lifecycle) + Send + 'static,
    ) -> Self {
        Self {
            triggers,
            handler: Box::new(handler),
        }
    }

    /// Replace the subscribed events.
    pub fn triggers(mut self, triggers: EventMask) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn trigger_mask(&self) -> EventMask {
        self.triggers
    }

    fn wants(&self, event: TweenEvent) -> bool {
        self.triggers.contains(event.mask())
    }
}

impl fmt::Debug for TweenCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenCallback")
            .field("triggers", &self.triggers)
            .finish_non_exhaustive()
    }
}

/// Ordered list of listeners attached to one node.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    listeners: Vec<TweenCallback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Listeners fire in the order they were registered.
    pub fn register(&mut self, callback: TweenCallback) {
        self.listeners.push(callback);
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Invoke every listener subscribed to `event`.
    pub fn dispatch(&mut self, event: TweenEvent, node: &Lifecycle) {
        for listener in self.listeners.iter_mut().filter(|l| l.wants(event)) {
            (listener.handler)(event, node);
        }
    }
}
