//! The phase state machine shared by tweens and timelines.
//!
//! A [`Lifecycle`] owns everything about a node's position in time: its
//! configuration (duration, delays, repeats), the current [`Phase`], local
//! time, direction, callbacks and control flags. The node-specific part
//! (writing values for a tween, routing time into children for a timeline)
//! lives behind the crate-internal [`Hook`] trait and is called back while
//! the state machine runs.
//!
//! # Time frames
//!
//! `advance` receives a delta in the caller's frame. While a node plays an
//! auto-reversed iteration the delta is negated on entry, and any overflow
//! is converted back into the caller's frame before being returned.
//!
//! Iterations are numbered from zero. Each one is preceded by its prelude:
//! the start delay for the first, the repeat delay for the others. Moving
//! backwards past the start of a prelude re-enters the previous iteration
//! through its far end, so any delta can be undone by its negation.
//!
//! ```text
//!          start()            BEGIN/START           END
//! PreStart ───────▶ Delay ──────────────▶ Start ─▶ Run ─▶ End ─┬─▶ Finished
//!                     ▲                     ▲                  │      │
//!                     └──── repeat delay ───┴──── repeat ──────┘      │
//!                                           ▲                         │
//!                                           └──── revived ────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use tracing::{debug, trace};

use crate::callbacks::{CallbackRegistry, TweenCallback, TweenEvent, UpdateAction};
use crate::control::TweenHandle;
use crate::error::{Result, TweenError};

/// Position of a node within one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Built but not started.
    #[default]
    PreStart,
    /// Waiting out the start delay or a repeat delay.
    Delay,
    /// About to enter an iteration.
    Start,
    /// Inside an iteration.
    Run,
    /// Transient, while END callbacks fire.
    End,
    /// Every iteration played. Re-entered if time moves back into range.
    Finished,
}

/// What the value hook is asked to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Step {
    /// Time moved outside the running range. Nothing to write.
    Idle,
    /// Time moved by the given amount inside the running range.
    Run(f32),
    /// Re-apply the current state without moving time.
    Refresh,
}

/// Node-specific behaviour driven by the state machine.
pub(crate) trait Hook {
    /// Called when BEGIN or BACK_BEGIN is about to fire.
    fn initialize(&mut self, node: &Lifecycle) -> Result<()>;

    /// Called after local time changed (or for a refresh).
    fn animate(&mut self, node: &Lifecycle, step: Step) -> Result<()>;

    /// Called when a linear repeat moves to the next iteration (`forwards`,
    /// children go back to their start) or back to the previous one
    /// (children go to their end).
    fn rewind(&mut self, forwards: bool) -> Result<()>;
}

/// Timing state of a single node.
pub struct Lifecycle {
    duration: f32,
    start_delay: f32,
    repeat_count: i32,
    repeat_delay: f32,
    can_auto_reverse: bool,

    phase: Phase,
    current_time: f32,
    direction: bool,
    // Zero-based, counted from the start of the node. Odd iterations of an
    // auto-reversing node run in the flipped frame.
    iteration: i32,
    can_trigger_begin: bool,
    finished_forwards: bool,
    muted: bool,

    callbacks: CallbackRegistry,
    // Listeners are moved out of the registry while they run.
    lent_callbacks: usize,
    update_start: Option<UpdateAction>,
    update_end: Option<UpdateAction>,
    user_data: Option<Box<dyn Any + Send>>,
    handle: TweenHandle,
}

impl Lifecycle {
    pub(crate) fn new(duration: f32) -> Self {
        Self {
            duration,
            start_delay: 0.0,
            repeat_count: 0,
            repeat_delay: 0.0,
            can_auto_reverse: false,
            phase: Phase::PreStart,
            current_time: 0.0,
            direction: true,
            iteration: 0,
            can_trigger_begin: true,
            finished_forwards: false,
            muted: false,
            callbacks: CallbackRegistry::new(),
            lent_callbacks: 0,
            update_start: None,
            update_end: None,
            user_data: None,
            handle: TweenHandle::new(),
        }
    }

    // Configuration

    pub(crate) fn ensure_unstarted(&self) -> Result<()> {
        if self.phase == Phase::PreStart {
            Ok(())
        } else {
            Err(TweenError::AlreadyStarted)
        }
    }

    pub(crate) fn set_duration(&mut self, duration: f32) {
        self.duration = duration;
    }

    /// Adds to the start delay.
    pub(crate) fn add_delay(&mut self, delay: f32) -> Result<()> {
        self.ensure_unstarted()?;
        if delay < 0.0 {
            return Err(TweenError::NegativeDelay(delay));
        }
        self.start_delay += delay;
        Ok(())
    }

    pub(crate) fn set_repeat(&mut self, count: i32, delay: f32, auto_reverse: bool) -> Result<()> {
        self.ensure_unstarted()?;
        if count < -1 {
            return Err(TweenError::InvalidRepeatCount(count));
        }
        if delay < 0.0 {
            return Err(TweenError::NegativeRepeatDelay(delay));
        }
        self.repeat_count = count;
        self.repeat_delay = delay;
        self.can_auto_reverse = auto_reverse;
        Ok(())
    }

    pub(crate) fn add_callback(&mut self, callback: TweenCallback) {
        self.callbacks.register(callback);
    }

    pub(crate) fn clear_callbacks(&mut self) {
        self.callbacks.clear();
    }

    pub(crate) fn set_update_start(&mut self, action: UpdateAction) {
        self.update_start = Some(action);
    }

    pub(crate) fn set_update_end(&mut self, action: UpdateAction) {
        self.update_end = Some(action);
    }

    pub(crate) fn set_user_data(&mut self, data: Box<dyn Any + Send>) {
        self.user_data = Some(data);
    }

    /// Silence callbacks and update actions, for jumps that must not be
    /// observed.
    pub(crate) fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    // Transitions outside of advancement

    pub(crate) fn start(&mut self) -> Result<()> {
        self.ensure_unstarted()?;
        self.iteration = 0;
        self.current_time = -self.start_delay;
        self.phase = self.waiting_phase();
        debug!(
            id = self.handle.id().0,
            delay = self.start_delay,
            duration = self.duration,
            repeats = self.repeat_count,
            "node started"
        );
        Ok(())
    }

    /// Back to `PreStart`, keeping configuration and callbacks.
    pub(crate) fn reset(&mut self) {
        self.phase = Phase::PreStart;
        self.current_time = 0.0;
        self.direction = true;
        self.iteration = 0;
        self.can_trigger_begin = true;
        self.finished_forwards = false;
        self.handle.clear();
    }

    /// Place a started node at its very beginning (`forwards`) or at the end
    /// of its last iteration.
    pub(crate) fn rewind(&mut self, forwards: bool) {
        self.can_trigger_begin = true;
        if forwards {
            self.iteration = 0;
            self.current_time = -self.start_delay;
            self.phase = self.waiting_phase();
        } else {
            self.iteration = self.repeat_count.max(0);
            self.current_time = self.exit_time();
            self.phase = Phase::Finished;
            self.finished_forwards = true;
        }
    }

    /// Fold overflow (in the caller's frame) that no one else will consume
    /// back into local time.
    pub(crate) fn absorb(&mut self, leftover: f32) {
        self.current_time += leftover * self.frame();
    }

    // Advancement

    /// Advance by `delta` seconds. Returns the overflow, in the caller's
    /// frame, that this node did not consume.
    pub(crate) fn advance<H: Hook>(&mut self, hook: &mut H, delta: f32) -> Result<f32> {
        self.handle.flush_read();
        if self.phase == Phase::PreStart {
            return Err(TweenError::NotStarted);
        }
        if self.handle.is_killed() || self.handle.is_paused() {
            return Ok(0.0);
        }
        self.run_update_action(false);
        let result = self.step(hook, delta);
        self.run_update_action(true);
        result
    }

    fn step<H: Hook>(&mut self, hook: &mut H, delta: f32) -> Result<f32> {
        if delta == 0.0 {
            hook.animate(self, Step::Refresh)?;
            return Ok(0.0);
        }

        // Caller time moves the iteration index; local time runs flipped
        // inside auto-reversed iterations.
        let outward = delta > 0.0;
        let mut frame = self.frame();
        let mut delta = delta * frame;
        let mut forwards = delta > 0.0;
        self.direction = forwards;

        loop {
            let new_time = self.current_time + delta;

            match self.phase {
                Phase::Delay | Phase::Start if outward => {
                    let entry = self.entry_time();
                    let reached = if forwards {
                        new_time >= entry
                    } else {
                        new_time <= entry
                    };
                    if !reached {
                        self.current_time = new_time;
                        hook.animate(self, Step::Idle)?;
                        return Ok(0.0);
                    }
                    self.current_time = entry;
                    delta = new_time - entry;
                    self.enter_iteration(hook, forwards)?;
                }
                Phase::Delay | Phase::Start if self.iteration == 0 => {
                    let floor = -self.start_delay;
                    if new_time >= floor {
                        self.current_time = new_time;
                        hook.animate(self, Step::Idle)?;
                        return Ok(0.0);
                    }
                    let edge = self.current_time.min(floor);
                    self.current_time = edge;
                    return Ok((new_time - edge) * frame);
                }
                Phase::Delay | Phase::Start => {
                    let edge = self.prelude_start();
                    let crossed = if forwards {
                        new_time >= edge
                    } else {
                        new_time <= edge
                    };
                    if !crossed {
                        self.current_time = new_time;
                        hook.animate(self, Step::Idle)?;
                        return Ok(0.0);
                    }

                    // Back over a repeat boundary: re-enter the previous
                    // iteration through its far end.
                    let overflow = (new_time - edge) * frame;
                    self.iteration -= 1;
                    if !self.can_auto_reverse {
                        hook.rewind(false)?;
                    }
                    frame = self.frame();
                    delta = overflow * frame;
                    forwards = outward != self.is_flipped();
                    self.direction = forwards;
                    self.current_time = self.exit_time();
                    debug!(
                        id = self.handle.id().0,
                        iteration = self.iteration,
                        "node back in previous iteration"
                    );
                    self.enter_iteration(hook, forwards)?;
                }
                Phase::Run => {
                    let boundary = if forwards { self.duration } else { 0.0 };
                    let inside_range = if forwards {
                        new_time < boundary
                    } else {
                        new_time > boundary
                    };
                    if inside_range {
                        self.current_time = new_time;
                        hook.animate(self, Step::Run(delta))?;
                        return Ok(0.0);
                    }

                    let inside = boundary - self.current_time;
                    self.current_time = boundary;
                    self.phase = Phase::End;
                    hook.animate(self, Step::Run(inside))?;
                    delta = new_time - boundary;
                    let (end, complete) = if forwards {
                        (TweenEvent::End, TweenEvent::Complete)
                    } else {
                        (TweenEvent::BackEnd, TweenEvent::BackComplete)
                    };
                    self.dispatch(end);

                    if outward && self.is_last_iteration() {
                        self.finish(complete, true);
                        return Ok(delta * frame);
                    }
                    if !outward && self.iteration == 0 {
                        self.finish(complete, false);
                        // Leaving the first iteration backwards: the start
                        // delay is part of this node's span.
                        let absorbed = delta.max(-self.start_delay);
                        self.current_time = absorbed;
                        return Ok((delta - absorbed) * frame);
                    }

                    if self.can_auto_reverse {
                        self.dispatch(complete);
                        self.can_trigger_begin = true;
                    }
                    if outward {
                        self.iteration = self.iteration.saturating_add(1);
                        debug!(
                            id = self.handle.id().0,
                            iteration = self.iteration,
                            auto_reverse = self.can_auto_reverse,
                            "node repeating"
                        );
                        if self.can_auto_reverse {
                            frame = -frame;
                            delta = -delta;
                            forwards = !forwards;
                            self.direction = forwards;
                        } else {
                            hook.rewind(true)?;
                        }
                        self.current_time = self.prelude_start();
                    }
                    // Moving back, the boundary just reached is the entry of
                    // this iteration and its repeat delay lies beyond it.
                    self.phase = self.waiting_phase();
                }
                Phase::Finished => {
                    let entry = if forwards { 0.0 } else { self.duration };
                    let back_in = if forwards {
                        new_time >= entry
                    } else {
                        new_time <= entry
                    };
                    if outward == self.finished_forwards || !back_in {
                        self.current_time = new_time;
                        hook.animate(self, Step::Idle)?;
                        return Ok(0.0);
                    }
                    self.current_time = entry;
                    delta = new_time - entry;
                    self.enter_iteration(hook, forwards)?;
                }
                phase @ (Phase::PreStart | Phase::End) => {
                    return Err(TweenError::UnexpectedPhase(phase));
                }
            }
        }
    }

    fn enter_iteration<H: Hook>(&mut self, hook: &mut H, forwards: bool) -> Result<()> {
        let (begin, start) = if forwards {
            (TweenEvent::Begin, TweenEvent::Start)
        } else {
            (TweenEvent::BackBegin, TweenEvent::BackStart)
        };
        self.phase = Phase::Start;
        if self.can_trigger_begin {
            self.can_trigger_begin = false;
            hook.initialize(self)?;
            self.dispatch(begin);
        }
        self.dispatch(start);
        self.phase = Phase::Run;
        Ok(())
    }

    fn finish(&mut self, event: TweenEvent, outward: bool) {
        self.phase = Phase::Finished;
        self.dispatch(event);
        self.can_trigger_begin = true;
        self.finished_forwards = outward;
        debug!(id = self.handle.id().0, ?event, time = self.current_time, "node finished");
    }

    fn dispatch(&mut self, event: TweenEvent) {
        trace!(id = self.handle.id().0, ?event, time = self.current_time, "dispatch");
        if self.muted || self.callbacks.is_empty() {
            return;
        }
        let mut callbacks = std::mem::take(&mut self.callbacks);
        self.lent_callbacks = callbacks.len();
        callbacks.dispatch(event, self);
        self.lent_callbacks = 0;
        self.callbacks = callbacks;
    }

    fn run_update_action(&mut self, end: bool) {
        let taken = match (self.muted, end) {
            (true, _) => None,
            (false, false) => self.update_start.take(),
            (false, true) => self.update_end.take(),
        };
        if let Some(mut action) = taken {
            action(self);
            if end {
                self.update_end = Some(action);
            } else {
                self.update_start = Some(action);
            }
        }
    }

    // Iteration geometry, in the current iteration's local frame.

    pub(crate) fn is_flipped(&self) -> bool {
        self.can_auto_reverse && self.iteration % 2 == 1
    }

    fn frame(&self) -> f32 {
        if self.is_flipped() { -1.0 } else { 1.0 }
    }

    fn is_last_iteration(&self) -> bool {
        self.repeat_count >= 0 && self.iteration >= self.repeat_count
    }

    /// Local time at which forwards caller time enters the iteration.
    fn entry_time(&self) -> f32 {
        if self.is_flipped() { self.duration } else { 0.0 }
    }

    fn exit_time(&self) -> f32 {
        if self.is_flipped() { 0.0 } else { self.duration }
    }

    /// Wait before the current iteration: the start delay for the first one,
    /// the repeat delay for the others.
    fn prelude(&self) -> f32 {
        if self.iteration == 0 {
            self.start_delay
        } else {
            self.repeat_delay
        }
    }

    fn prelude_start(&self) -> f32 {
        if self.is_flipped() {
            self.duration + self.prelude()
        } else {
            -self.prelude()
        }
    }

    fn waiting_phase(&self) -> Phase {
        if self.prelude() > 0.0 {
            Phase::Delay
        } else {
            Phase::Start
        }
    }

    // Queries

    /// Length of one iteration.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn start_delay(&self) -> f32 {
        self.start_delay
    }

    /// Repeats left after the current iteration when playing forwards
    /// (`-1` is infinite).
    pub fn repeat_count(&self) -> i32 {
        if self.repeat_count < 0 {
            -1
        } else {
            self.repeat_count - self.iteration
        }
    }

    /// Zero-based index of the current iteration.
    pub fn iteration(&self) -> i32 {
        self.iteration
    }

    pub fn repeat_delay(&self) -> f32 {
        self.repeat_delay
    }

    pub fn can_auto_reverse(&self) -> bool {
        self.can_auto_reverse
    }

    /// Delay plus every iteration and repeat delay, or `None` when the node
    /// repeats forever.
    pub fn full_duration(&self) -> Option<f32> {
        if self.repeat_count < 0 {
            return None;
        }
        let repeats = self.repeat_count as f32;
        Some(self.start_delay + self.duration + (self.repeat_delay + self.duration) * repeats)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Local time within the current iteration.
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Direction of the most recent advancement (`true` is forwards).
    pub fn direction(&self) -> bool {
        self.direction
    }

    /// Playing or waiting for an auto-reversed iteration.
    pub fn is_in_auto_reverse(&self) -> bool {
        self.phase != Phase::Finished && self.is_flipped()
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::PreStart
    }

    pub fn is_in_delay(&self) -> bool {
        self.phase == Phase::Delay
    }

    /// Finished every iteration, or killed.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished || self.handle.is_killed()
    }

    pub fn is_killed(&self) -> bool {
        self.handle.is_killed()
    }

    pub fn is_paused(&self) -> bool {
        self.handle.is_paused()
    }

    /// A new handle to this node's control flags.
    pub fn handle(&self) -> TweenHandle {
        self.handle.clone()
    }

    /// Finished after leaving through its end (`forwards`) or its start.
    pub(crate) fn has_exited(&self, forwards: bool) -> bool {
        self.phase == Phase::Finished && self.finished_forwards == forwards
    }

    pub(crate) fn control(&self) -> &TweenHandle {
        &self.handle
    }

    /// Registered listeners, including while they are being dispatched.
    pub fn callback_count(&self) -> usize {
        self.callbacks.len() + self.lent_callbacks
    }

    /// User data attached at build time, if it has type `T`.
    pub fn user_data<T: 'static>(&self) -> Option<&T> {
        self.user_data.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("id", &self.handle.id())
            .field("phase", &self.phase)
            .field("current_time", &self.current_time)
            .field("duration", &self.duration)
            .field("start_delay", &self.start_delay)
            .field("iteration", &self.iteration)
            .field("repeat_count", &self.repeat_count)
            .field("repeat_delay", &self.repeat_delay)
            .field("can_auto_reverse", &self.can_auto_reverse)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}
