//! Root scheduler for tweens and timelines.
//!
//! The `TweenManager` owns every root node added to it. It handles:
//! - Starting nodes as they are added
//! - Advancing every root once per update
//! - Reaping nodes that finished or were killed
//! - Killing, pausing and counting across all roots
//!
//! # Usage
//!
//! ```ignore
//! use kinetic_core::{TweenEngine, TweenManager, Timeline, shared, MutableFloat};
//!
//! let engine = TweenEngine::new().with_primitives();
//! let mut manager = TweenManager::new();
//! let opacity = shared(MutableFloat::new(0.0));
//!
//! let handle = manager.add(engine.to(&opacity, 0, 0.5)?.target(&[1.0])?)?;
//!
//! // Each frame
//! manager.update(1.0 / 60.0)?;
//!
//! // Later, from anywhere
//! handle.kill();
//! ```

use tracing::debug;

use crate::accessor::Shared;
use crate::control::TweenHandle;
use crate::error::Result;
use crate::node::Node;

/// Owner and driver of root nodes.
#[derive(Debug, Default)]
pub struct TweenManager {
    /// Root nodes in insertion order.
    nodes: Vec<Node>,

    /// When set, `update` does nothing.
    paused: bool,
}

impl TweenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `node`, starting it if needed.
    pub fn add(&mut self, node: impl Into<Node>) -> Result<TweenHandle> {
        let mut node = node.into();
        if !node.is_started() {
            node.start()?;
        }
        let handle = node.handle();
        self.nodes.push(node);
        Ok(handle)
    }

    /// Advance every root by `delta` seconds. Nodes that finished or were
    /// killed before this call are freed first.
    pub fn update(&mut self, delta: f32) -> Result<()> {
        if self.paused {
            return Ok(());
        }

        let (done, live): (Vec<Node>, Vec<Node>) =
            std::mem::take(&mut self.nodes).into_iter().partition(Node::is_finished);
        self.nodes = live;
        if !done.is_empty() {
            debug!(reaped = done.len(), remaining = self.nodes.len(), "reaping finished nodes");
        }
        done.into_iter().for_each(Node::free);

        for node in &mut self.nodes {
            node.update(delta)?;
        }
        Ok(())
    }

    pub fn contains_target<T>(&self, target: &Shared<T>) -> bool {
        self.nodes.iter().any(|node| node.contains_target(target))
    }

    pub fn contains_target_type<T>(&self, target: &Shared<T>, tween_type: i32) -> bool {
        self.nodes
            .iter()
            .any(|node| node.contains_target_type(target, tween_type))
    }

    /// Kill every root. They are freed on the next update.
    pub fn kill_all(&self) {
        self.nodes.iter().for_each(Node::kill);
    }

    /// Kill every tween animating `target`, at any depth. Returns how many
    /// were killed.
    pub fn kill_target<T>(&self, target: &Shared<T>) -> usize {
        self.nodes.iter().map(|node| node.kill_target(target)).sum()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of roots, finished ones included until reaped.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Started, unfinished tweens at any depth.
    pub fn running_tweens_count(&self) -> usize {
        self.nodes.iter().map(Node::running_tweens).sum()
    }

    /// Started, unfinished timelines at any depth.
    pub fn running_timelines_count(&self) -> usize {
        self.nodes.iter().map(Node::running_timelines).sum()
    }

    /// Free every root immediately.
    pub fn clear(&mut self) {
        std::mem::take(&mut self.nodes).into_iter().for_each(Node::free);
    }
}
