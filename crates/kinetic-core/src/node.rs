//! A node of the animation tree: either a tween or a timeline.

use tracing::{debug, trace};

use crate::accessor::Shared;
use crate::control::TweenHandle;
use crate::error::{Result, TweenError};
use crate::lifecycle::Lifecycle;
use crate::timeline::Timeline;
use crate::tween::Tween;

#[derive(Debug)]
pub enum Node {
    Tween(Tween),
    Timeline(Timeline),
}

impl From<Tween> for Node {
    fn from(tween: Tween) -> Self {
        Node::Tween(tween)
    }
}

impl From<Timeline> for Node {
    fn from(timeline: Timeline) -> Self {
        Node::Timeline(timeline)
    }
}

impl Node {
    pub fn lifecycle(&self) -> &Lifecycle {
        match self {
            Node::Tween(tween) => &tween.life,
            Node::Timeline(timeline) => &timeline.life,
        }
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        match self {
            Node::Tween(tween) => &mut tween.life,
            Node::Timeline(timeline) => &mut timeline.life,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        match self {
            Node::Tween(tween) => tween.start(),
            Node::Timeline(timeline) => timeline.start(),
        }
    }

    /// Advance as a root node.
    pub fn update(&mut self, delta: f32) -> Result<()> {
        match self {
            Node::Tween(tween) => tween.update(delta),
            Node::Timeline(timeline) => timeline.update(delta),
        }
    }

    pub(crate) fn advance(&mut self, delta: f32) -> Result<f32> {
        match self {
            Node::Tween(tween) => tween.advance(delta),
            Node::Timeline(timeline) => timeline.advance(delta),
        }
    }

    pub(crate) fn absorb(&mut self, leftover: f32) {
        match self {
            Node::Tween(tween) => tween.life.absorb(leftover),
            Node::Timeline(timeline) => timeline.life.absorb(leftover),
        }
    }

    pub(crate) fn rewind(&mut self, forwards: bool) {
        match self {
            Node::Tween(tween) => tween.rewind(forwards),
            Node::Timeline(timeline) => timeline.rewind(forwards),
        }
    }

    /// Jump to `fraction` of the span after the start delay, as if played
    /// from the start (`forwards`) or back from the end. Callbacks and update
    /// actions stay silent during the jump; children follow their parent.
    pub fn set_progress(&mut self, fraction: f32, forwards: bool) -> Result<()> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(TweenError::ProgressOutOfRange(fraction));
        }
        if !self.is_started() {
            return Err(TweenError::NotStarted);
        }
        let full = self.full_duration().ok_or(TweenError::UnboundedProgress)?;
        if self.is_killed() || self.is_paused() {
            return Ok(());
        }

        let delay = self.lifecycle().start_delay();
        let span = full - delay;
        let travel = if forwards {
            delay + fraction * span
        } else {
            -(1.0 - fraction) * span
        };
        trace!(id = self.handle().id().0, fraction, forwards, travel, "seeking");

        self.rewind(forwards);
        self.set_muted(true);
        let advanced = self.advance(travel);
        self.set_muted(false);
        let leftover = advanced?;
        if leftover != 0.0 {
            self.absorb(leftover);
        }
        self.lifecycle().control().flush_write();
        Ok(())
    }

    pub(crate) fn set_muted(&mut self, muted: bool) {
        match self {
            Node::Tween(tween) => tween.life.set_muted(muted),
            Node::Timeline(timeline) => timeline.set_muted(muted),
        }
    }

    /// Drop every listener registered on this node. Children keep theirs.
    pub fn clear_callbacks(&mut self) {
        self.lifecycle_mut().clear_callbacks();
    }

    pub fn reset(&mut self) {
        match self {
            Node::Tween(tween) => tween.reset(),
            Node::Timeline(timeline) => timeline.reset(),
        }
    }

    /// Write start or target values without moving time. `forwards` only
    /// matters for timelines, where it sets the order children are applied.
    pub fn set_values(&mut self, forwards: bool, use_start: bool) {
        match self {
            Node::Tween(tween) => tween.set_values(use_start),
            Node::Timeline(timeline) => timeline.set_values(forwards, use_start),
        }
    }

    /// Drop this node and everything it owns.
    pub fn free(self) {
        let id = self.handle().id();
        match &self {
            Node::Tween(_) => trace!(id = id.0, "freeing tween"),
            Node::Timeline(timeline) => debug!(
                id = id.0,
                children = timeline.children().len(),
                "freeing timeline"
            ),
        }
        drop(self);
    }

    // Control

    pub fn handle(&self) -> TweenHandle {
        self.lifecycle().handle()
    }

    pub fn kill(&self) {
        self.lifecycle().control().kill();
    }

    pub fn pause(&self) {
        self.lifecycle().control().pause();
    }

    pub fn resume(&self) {
        self.lifecycle().control().resume();
    }

    /// Kill every tween in this subtree that animates `target`. Returns how
    /// many were killed.
    pub fn kill_target<T>(&self, target: &Shared<T>) -> usize {
        match self {
            Node::Tween(tween) if tween.contains_target(target) => {
                tween.life.control().kill();
                1
            }
            Node::Tween(_) => 0,
            Node::Timeline(timeline) => timeline
                .children()
                .iter()
                .map(|child| child.kill_target(target))
                .sum(),
        }
    }

    // Queries

    pub fn is_started(&self) -> bool {
        self.lifecycle().is_started()
    }

    pub fn is_finished(&self) -> bool {
        self.lifecycle().is_finished()
    }

    pub fn is_killed(&self) -> bool {
        self.lifecycle().is_killed()
    }

    pub fn is_paused(&self) -> bool {
        self.lifecycle().is_paused()
    }

    pub(crate) fn has_exited(&self, forwards: bool) -> bool {
        self.lifecycle().has_exited(forwards)
    }

    pub fn full_duration(&self) -> Option<f32> {
        self.lifecycle().full_duration()
    }

    pub fn contains_target<T>(&self, target: &Shared<T>) -> bool {
        match self {
            Node::Tween(tween) => tween.contains_target(target),
            Node::Timeline(timeline) => timeline.contains_target(target),
        }
    }

    pub fn contains_target_type<T>(&self, target: &Shared<T>, tween_type: i32) -> bool {
        match self {
            Node::Tween(tween) => tween.contains_target_type(target, tween_type),
            Node::Timeline(timeline) => timeline.contains_target_type(target, tween_type),
        }
    }

    pub fn as_tween(&self) -> Option<&Tween> {
        match self {
            Node::Tween(tween) => Some(tween),
            Node::Timeline(_) => None,
        }
    }

    pub fn as_timeline(&self) -> Option<&Timeline> {
        match self {
            Node::Timeline(timeline) => Some(timeline),
            Node::Tween(_) => None,
        }
    }

    /// Started, unfinished tweens in this subtree, this node included.
    pub fn running_tweens(&self) -> usize {
        match self {
            Node::Tween(_) => usize::from(self.is_running()),
            Node::Timeline(timeline) => {
                timeline.children().iter().map(Node::running_tweens).sum()
            }
        }
    }

    /// Started, unfinished timelines in this subtree, this node included.
    pub fn running_timelines(&self) -> usize {
        match self {
            Node::Tween(_) => 0,
            Node::Timeline(timeline) => {
                usize::from(self.is_running())
                    + timeline
                        .children()
                        .iter()
                        .map(Node::running_timelines)
                        .sum::<usize>()
            }
        }
    }

    fn is_running(&self) -> bool {
        self.is_started() && !self.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::shared;
    use crate::primitives::{MutableFloat, MutableFloatAccessor};
    use kinetic_config::EngineConfig;
    use std::sync::Arc;

    fn float_tween(target: &Shared<MutableFloat>) -> Tween {
        Tween::bound(
            target,
            0,
            Arc::new(MutableFloatAccessor),
            1.0,
            &EngineConfig::default(),
            false,
        )
        .unwrap()
        .target(&[1.0])
        .unwrap()
    }

    #[test]
    fn test_kill_target_reaches_nested_tweens() {
        let a = shared(MutableFloat::new(0.0));
        let b = shared(MutableFloat::new(0.0));
        let node: Node = Timeline::sequence()
            .push(float_tween(&a))
            .unwrap()
            .begin_parallel()
            .push(float_tween(&a))
            .unwrap()
            .push(float_tween(&b))
            .unwrap()
            .end()
            .unwrap()
            .build()
            .unwrap()
            .into();

        assert!(node.contains_target(&a));
        assert!(node.contains_target_type(&b, 0));
        assert!(!node.contains_target_type(&b, 1));
        assert_eq!(node.kill_target(&a), 2);
        assert!(!node.is_killed());
        assert!(node.as_timeline().unwrap().children()[0].is_killed());
    }

    #[test]
    fn test_running_counts() {
        let a = shared(MutableFloat::new(0.0));
        let mut node: Node = Timeline::parallel()
            .push(float_tween(&a))
            .unwrap()
            .push(float_tween(&a).delay(1.0).unwrap())
            .unwrap()
            .build()
            .unwrap()
            .into();
        assert_eq!(node.running_tweens(), 0);

        node.start().unwrap();
        assert_eq!(node.running_tweens(), 2);
        assert_eq!(node.running_timelines(), 1);

        node.update(1.5).unwrap();
        assert_eq!(node.running_tweens(), 1);

        node.update(1.0).unwrap();
        assert_eq!(node.running_tweens(), 0);
        assert_eq!(node.running_timelines(), 0);
    }

    #[test]
    fn test_wrapped_tween_updates() {
        let a = shared(MutableFloat::new(0.0));
        let mut node = Node::from(float_tween(&a).ease(crate::easing::EasingFunction::Linear));
        assert!(node.as_tween().is_some());
        node.start().unwrap();
        node.update(0.5).unwrap();
        assert_eq!(a.lock().value(), 0.5);
    }

    #[test]
    fn test_clear_callbacks_silences_node() {
        use crate::callbacks::{EventMask, TweenCallback};
        use std::sync::atomic::{AtomicUsize, Ordering};

        let a = shared(MutableFloat::new(0.0));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut node = Node::from(float_tween(&a).add_callback(TweenCallback::on(
            EventMask::ANY,
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )));
        assert_eq!(node.lifecycle().callback_count(), 1);

        node.clear_callbacks();
        assert_eq!(node.lifecycle().callback_count(), 0);
        node.start().unwrap();
        node.update(2.0).unwrap();
        assert!(node.is_finished());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_set_progress_errors() {
        let a = shared(MutableFloat::new(0.0));
        let mut node = Node::from(float_tween(&a));
        assert_eq!(node.set_progress(0.5, true), Err(TweenError::NotStarted));
        node.start().unwrap();
        assert_eq!(node.set_progress(1.5, true), Err(TweenError::ProgressOutOfRange(1.5)));
        assert_eq!(node.set_progress(-0.25, false), Err(TweenError::ProgressOutOfRange(-0.25)));

        let mut forever = Node::from(float_tween(&a).repeat(-1, 0.0).unwrap());
        forever.start().unwrap();
        assert_eq!(forever.set_progress(0.5, true), Err(TweenError::UnboundedProgress));
    }
}
