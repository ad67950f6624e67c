//! Composite nodes that play children in sequence or in parallel.
//!
//! A [`Timeline`] is itself driven by the shared phase state machine. While it
//! runs, the time it receives is routed into its children:
//!
//! ```text
//! Sequential   ──▶ [child 0] ─overflow─▶ [child 1] ─overflow─▶ [child 2]
//!
//! Parallel     ──▶ [child 0]
//!              ──▶ [child 1]   each child keeps its own overflow
//!              ──▶ [child 2]
//! ```
//!
//! Children are frozen once built. Timelines are assembled with a
//! [`TimelineBuilder`], which supports nested blocks:
//!
//! ```ignore
//! let timeline = Timeline::sequence()
//!     .push(engine.to(&a, 0, 1.0)?.target(&[1.0])?)?
//!     .push_pause(0.5)?
//!     .begin_parallel()
//!     .push(engine.to(&b, 0, 1.0)?.target(&[1.0])?)?
//!     .push(engine.to(&c, 0, 2.0)?.target(&[1.0])?)?
//!     .end()?
//!     .repeat(2, 0.5)?
//!     .build()?;
//! ```

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::accessor::Shared;
use crate::callbacks::TweenCallback;
use crate::control::TweenHandle;
use crate::error::{Result, TweenError};
use crate::lifecycle::{Hook, Lifecycle, Phase, Step};
use crate::node::Node;
use crate::tween::Tween;

/// How a timeline plays its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One after another.
    Sequential,
    /// All at once.
    Parallel,
}

/// Extra time fed to children when the timeline reaches either end, so that
/// children left a rounding error short of their boundary still complete.
const SETTLE_NUDGE: f32 = 1e-3;

/// A composite node.
pub struct Timeline {
    pub(crate) life: Lifecycle,
    pub(crate) body: Composition,
}

pub(crate) struct Composition {
    mode: Mode,
    children: Vec<Node>,
    current: usize,
}

impl Timeline {
    /// Start building a sequential timeline.
    pub fn sequence() -> TimelineBuilder {
        TimelineBuilder::new(Mode::Sequential)
    }

    /// Start building a parallel timeline.
    pub fn parallel() -> TimelineBuilder {
        TimelineBuilder::new(Mode::Parallel)
    }

    fn open(mode: Mode) -> Self {
        Self {
            life: Lifecycle::new(0.0),
            body: Composition {
                mode,
                children: Vec::new(),
                current: 0,
            },
        }
    }

    fn append(&mut self, child: Node) -> Result<()> {
        if child.is_started() {
            return Err(TweenError::AlreadyStarted);
        }
        let Some(span) = child.full_duration() else {
            return Err(TweenError::InfiniteRepeatInTimeline);
        };
        let duration = match self.body.mode {
            Mode::Sequential => self.life.duration() + span,
            Mode::Parallel => self.life.duration().max(span),
        };
        self.life.set_duration(duration);
        self.body.children.push(child);
        Ok(())
    }

    // Driving

    /// Start this timeline and every child.
    pub fn start(&mut self) -> Result<()> {
        self.life.start()?;
        self.body.current = 0;
        for child in &mut self.body.children {
            child.start()?;
        }
        Ok(())
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
        self.life.advance(&mut self.body, delta)
    }

    /// Back to its unstarted state, recursively.
    pub fn reset(&mut self) {
        self.life.reset();
        self.body.current = 0;
        for child in &mut self.body.children {
            child.reset();
        }
    }

    pub(crate) fn rewind(&mut self, forwards: bool) {
        self.life.rewind(forwards);
        // An auto-reversed last iteration ends where the children start.
        self.body.rewind_children(forwards || self.life.is_flipped());
    }

    pub(crate) fn set_muted(&mut self, muted: bool) {
        self.life.set_muted(muted);
        for child in &mut self.body.children {
            child.set_muted(muted);
        }
    }

    /// Write every child's start or target values without moving time.
    /// `forwards` applies children in index order, so the last one wins.
    pub fn set_values(&mut self, forwards: bool, use_start: bool) {
        self.body.set_values(forwards, use_start);
    }

    // Queries

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.life
    }

    pub fn handle(&self) -> TweenHandle {
        self.life.handle()
    }

    pub fn mode(&self) -> Mode {
        self.body.mode
    }

    pub fn children(&self) -> &[Node] {
        &self.body.children
    }

    /// Index of the child receiving time in a sequential timeline.
    pub fn current_index(&self) -> usize {
        self.body.current
    }

    pub fn contains_target<T>(&self, target: &Shared<T>) -> bool {
        self.body.children.iter().any(|c| c.contains_target(target))
    }

    pub fn contains_target_type<T>(&self, target: &Shared<T>, tween_type: i32) -> bool {
        self.body
            .children
            .iter()
            .any(|c| c.contains_target_type(target, tween_type))
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("mode", &self.body.mode)
            .field("life", &self.life)
            .field("current", &self.body.current)
            .field("children", &self.body.children)
            .finish()
    }
}

impl Composition {
    fn next_index(&self, forwards: bool) -> Option<usize> {
        if forwards {
            (self.current + 1 < self.children.len()).then_some(self.current + 1)
        } else {
            self.current.checked_sub(1)
        }
    }

    fn route(&mut self, delta: f32) -> Result<()> {
        match self.mode {
            Mode::Sequential => self.route_sequential(delta),
            Mode::Parallel => self.route_parallel(delta),
        }
    }

    fn route_sequential(&mut self, delta: f32) -> Result<()> {
        if delta == 0.0 {
            self.children[self.current].advance(0.0)?;
            return Ok(());
        }

        let forwards = delta > 0.0;
        let mut delta = delta;
        loop {
            let child = &mut self.children[self.current];
            let (leftover, exited) = if child.is_killed() {
                (delta, true)
            } else {
                let leftover = child.advance(delta)?;
                (leftover, leftover != 0.0 || child.has_exited(forwards))
            };
            if !exited {
                return Ok(());
            }
            match self.next_index(forwards) {
                Some(next) => {
                    self.current = next;
                    if leftover == 0.0 {
                        return Ok(());
                    }
                    delta = leftover;
                }
                None => {
                    let last = &mut self.children[self.current];
                    if leftover != 0.0 && !last.is_killed() {
                        last.absorb(leftover);
                    }
                    return Ok(());
                }
            }
        }
    }

    fn route_parallel(&mut self, delta: f32) -> Result<()> {
        let feed = |child: &mut Node| -> Result<()> {
            let leftover = child.advance(delta)?;
            if leftover != 0.0 {
                child.absorb(leftover);
            }
            Ok(())
        };
        if delta >= 0.0 {
            self.children.iter_mut().try_for_each(feed)
        } else {
            self.children.iter_mut().rev().try_for_each(feed)
        }
    }

    /// Push children that ended a rounding error short of the timeline's
    /// boundary over it. Children already past it are left where they were.
    fn settle(&mut self, forwards: bool) -> Result<()> {
        let nudge = if forwards { SETTLE_NUDGE } else { -SETTLE_NUDGE };
        match self.mode {
            Mode::Sequential => {
                let mut delta = nudge;
                loop {
                    let child = &mut self.children[self.current];
                    if child.is_killed() || child.is_paused() {
                        return Ok(());
                    }
                    let leftover = child.advance(delta)?;
                    if leftover == 0.0 {
                        child.absorb(-delta);
                        return Ok(());
                    }
                    match self.next_index(forwards) {
                        Some(next) => {
                            self.current = next;
                            delta = leftover;
                        }
                        None => return Ok(()),
                    }
                }
            }
            Mode::Parallel => {
                let nudge_child = |child: &mut Node| -> Result<()> {
                    if child.is_killed() || child.is_paused() {
                        return Ok(());
                    }
                    if child.advance(nudge)? == 0.0 {
                        child.absorb(-nudge);
                    }
                    Ok(())
                };
                if forwards {
                    self.children.iter_mut().try_for_each(nudge_child)
                } else {
                    self.children.iter_mut().rev().try_for_each(nudge_child)
                }
            }
        }
    }

    fn rewind_children(&mut self, forwards: bool) {
        if forwards {
            self.current = 0;
            self.children.iter_mut().rev().for_each(|c| c.rewind(true));
        } else {
            self.current = self.children.len().saturating_sub(1);
            self.children.iter_mut().for_each(|c| c.rewind(false));
        }
    }

    fn set_values(&mut self, forwards: bool, use_start: bool) {
        if forwards {
            self.children
                .iter_mut()
                .for_each(|c| c.set_values(forwards, use_start));
        } else {
            self.children
                .iter_mut()
                .rev()
                .for_each(|c| c.set_values(forwards, use_start));
        }
    }
}

impl Hook for Composition {
    fn initialize(&mut self, _node: &Lifecycle) -> Result<()> {
        Ok(())
    }

    fn animate(&mut self, node: &Lifecycle, step: Step) -> Result<()> {
        match step {
            Step::Idle => Ok(()),
            Step::Refresh => self.route(0.0),
            Step::Run(delta) => {
                self.route(delta)?;
                if node.phase() == Phase::End {
                    self.settle(node.direction())?;
                }
                Ok(())
            }
        }
    }

    fn rewind(&mut self, forwards: bool) -> Result<()> {
        self.rewind_children(forwards);
        Ok(())
    }
}

/// Fluent construction of (possibly nested) timelines.
///
/// Configuration calls (`delay`, `repeat`, `add_callback`, ...) apply to the
/// innermost open block.
#[derive(Debug)]
pub struct TimelineBuilder {
    stack: Vec<Timeline>,
}

impl TimelineBuilder {
    fn new(mode: Mode) -> Self {
        Self {
            stack: vec![Timeline::open(mode)],
        }
    }

    fn top(&mut self) -> &mut Timeline {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Append a tween or a finished timeline.
    pub fn push(mut self, node: impl Into<Node>) -> Result<Self> {
        self.top().append(node.into())?;
        Ok(self)
    }

    /// Append an empty span of `seconds`.
    pub fn push_pause(self, seconds: f32) -> Result<Self> {
        if seconds < 0.0 {
            return Err(TweenError::NegativePause(seconds));
        }
        self.push(Tween::mark().delay(seconds)?)
    }

    /// Open a nested sequential block.
    pub fn begin_sequence(mut self) -> Self {
        self.stack.push(Timeline::open(Mode::Sequential));
        self
    }

    /// Open a nested parallel block.
    pub fn begin_parallel(mut self) -> Self {
        self.stack.push(Timeline::open(Mode::Parallel));
        self
    }

    /// Close the innermost nested block and append it to its parent.
    pub fn end(mut self) -> Result<Self> {
        if self.stack.len() < 2 {
            return Err(TweenError::NothingToEnd);
        }
        let block = self.stack.pop().ok_or(TweenError::NothingToEnd)?;
        if block.body.children.is_empty() {
            return Err(TweenError::EmptyTimeline);
        }
        self.top().append(Node::Timeline(block))?;
        Ok(self)
    }

    pub fn delay(mut self, seconds: f32) -> Result<Self> {
        self.top().life.add_delay(seconds)?;
        Ok(self)
    }

    pub fn repeat(mut self, count: i32, delay: f32) -> Result<Self> {
        self.top().life.set_repeat(count, delay, false)?;
        Ok(self)
    }

    pub fn repeat_auto_reverse(mut self, count: i32, delay: f32) -> Result<Self> {
        self.top().life.set_repeat(count, delay, true)?;
        Ok(self)
    }

    pub fn add_callback(mut self, callback: TweenCallback) -> Self {
        self.top().life.add_callback(callback);
        self
    }

    pub fn clear_callbacks(mut self) -> Self {
        self.top().life.clear_callbacks();
        self
    }

    /// Run `action` at the start of every update of the innermost block.
    pub fn on_update_start(mut self, action: impl FnMut(&Lifecycle) + Send + 'static) -> Self {
        self.top().life.set_update_start(Box::new(action));
        self
    }

    /// Run `action` at the end of every update of the innermost block.
    pub fn on_update_end(mut self, action: impl FnMut(&Lifecycle) + Send + 'static) -> Self {
        self.top().life.set_update_end(Box::new(action));
        self
    }

    pub fn user_data(mut self, data: impl Any + Send) -> Self {
        self.top().life.set_user_data(Box::new(data));
        self
    }

    /// Finish building. Every nested block must be closed.
    pub fn build(mut self) -> Result<Timeline> {
        if self.stack.len() > 1 {
            return Err(TweenError::UnclosedTimeline(self.stack.len() - 1));
        }
        let root = self.stack.pop().ok_or(TweenError::EmptyTimeline)?;
        if root.body.children.is_empty() {
            return Err(TweenError::EmptyTimeline);
        }
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(seconds: f32) -> Tween {
        Tween::mark().delay(seconds).unwrap()
    }

    #[test]
    fn test_sequential_and_parallel_durations() {
        let children = || -> (Tween, Tween) {
            (
                span(1.0).repeat(1, 1.0).unwrap(),
                span(3.5),
            )
        };

        let (a, b) = children();
        let sequence = Timeline::sequence().push(a).unwrap().push(b).unwrap().build().unwrap();
        assert_eq!(sequence.lifecycle().duration(), 5.5);

        let (a, b) = children();
        let parallel = Timeline::parallel().push(a).unwrap().push(b).unwrap().build().unwrap();
        assert_eq!(parallel.lifecycle().duration(), 3.5);
    }

    #[test]
    fn test_nested_block_duration() {
        let timeline = Timeline::sequence()
            .push(span(1.0))
            .unwrap()
            .begin_parallel()
            .push(span(2.0))
            .unwrap()
            .push(span(0.5))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(timeline.lifecycle().duration(), 3.0);
        assert_eq!(timeline.children().len(), 2);
        match &timeline.children()[1] {
            Node::Timeline(inner) => assert_eq!(inner.mode(), Mode::Parallel),
            Node::Tween(_) => panic!("expected nested timeline"),
        }
    }

    #[test]
    fn test_builder_errors() {
        assert_eq!(Timeline::sequence().build().unwrap_err(), TweenError::EmptyTimeline);
        assert_eq!(Timeline::sequence().end().unwrap_err(), TweenError::NothingToEnd);
        assert_eq!(
            Timeline::sequence().begin_parallel().end().unwrap_err(),
            TweenError::EmptyTimeline
        );
        assert_eq!(
            Timeline::sequence()
                .begin_sequence()
                .push(span(1.0))
                .unwrap()
                .build()
                .unwrap_err(),
            TweenError::UnclosedTimeline(1)
        );
        assert_eq!(
            Timeline::sequence().push_pause(-1.0).unwrap_err(),
            TweenError::NegativePause(-1.0)
        );
        assert_eq!(
            Timeline::sequence()
                .push(span(1.0).repeat(-1, 0.0).unwrap())
                .unwrap_err(),
            TweenError::InfiniteRepeatInTimeline
        );

        let mut started = span(1.0);
        started.start().unwrap();
        assert_eq!(
            Timeline::sequence().push(started).unwrap_err(),
            TweenError::AlreadyStarted
        );
    }

    #[test]
    fn test_sequential_walks_children_both_ways() {
        let mut timeline = Timeline::sequence()
            .push(span(1.0))
            .unwrap()
            .push(span(1.0))
            .unwrap()
            .push(span(1.0))
            .unwrap()
            .build()
            .unwrap();
        timeline.start().unwrap();

        timeline.update(1.5).unwrap();
        assert_eq!(timeline.current_index(), 1);
        assert!(timeline.children()[0].is_finished());

        timeline.update(1.0).unwrap();
        assert_eq!(timeline.current_index(), 2);

        timeline.update(-2.0).unwrap();
        assert_eq!(timeline.current_index(), 0);
        assert_eq!(timeline.lifecycle().current_time(), 0.5);
        assert!(timeline.children()[1].is_finished());
        assert_eq!(timeline.children()[2].lifecycle().phase(), Phase::Delay);
        assert_eq!(timeline.children()[0].lifecycle().current_time(), -0.5);
    }

    #[test]
    fn test_linear_repeat_rewinds_children() {
        let mut timeline = Timeline::sequence()
            .push(span(1.0))
            .unwrap()
            .push(span(1.0))
            .unwrap()
            .repeat(1, 0.0)
            .unwrap()
            .build()
            .unwrap();
        timeline.start().unwrap();

        timeline.update(2.5).unwrap();
        assert_eq!(timeline.lifecycle().repeat_count(), 0);
        assert_eq!(timeline.current_index(), 0);
        assert_eq!(timeline.children()[0].lifecycle().current_time(), -0.5);
        assert_eq!(timeline.children()[1].lifecycle().phase(), Phase::Delay);
    }

    #[test]
    fn test_config_applies_to_innermost_block() {
        let timeline = Timeline::sequence()
            .begin_sequence()
            .push(span(1.0))
            .unwrap()
            .repeat(2, 0.5)
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(timeline.lifecycle().repeat_count(), 0);
        assert_eq!(timeline.lifecycle().duration(), 4.0);
    }
}
