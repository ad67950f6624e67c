//! Shared control block for pausing, killing and cross-thread visibility.
//!
//! Every node owns one [`Control`] and hands out [`TweenHandle`]s to it. A
//! handle may be held by the manager, by user code, or captured inside a
//! callback, so that a node can be killed or paused reentrantly while it is
//! being advanced. Flags are only consulted at the top of the next
//! advancement call.
//!
//! The `flush_write` / `flush_read` pair is an advisory publish/acquire
//! sequence counter. It orders memory around hand-offs between threads and
//! does not provide mutual exclusion.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::warn;

/// Unique identifier for a node instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) struct Control {
    id: NodeId,
    paused: AtomicBool,
    killed: AtomicBool,
    sequence: AtomicU64,
}

/// Cloneable, thread-safe handle to a node's control flags.
#[derive(Debug, Clone)]
pub struct TweenHandle(Arc<Control>);

impl TweenHandle {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Control {
            id: NodeId::new(),
            paused: AtomicBool::new(false),
            killed: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
        }))
    }

    /// Identifier of the node behind this handle.
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Mark the node as killed. Observed on its next advancement.
    pub fn kill(&self) {
        if Arc::strong_count(&self.0) == 1 {
            warn!(id = self.0.id.0, "kill requested for a node that no longer exists");
        }
        self.0.killed.store(true, Ordering::Release);
    }

    /// Suspend advancement until [`resume`](Self::resume) is called.
    pub fn pause(&self) {
        self.0.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.0.paused.store(false, Ordering::Release);
    }

    pub fn is_killed(&self) -> bool {
        self.0.killed.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.0.paused.load(Ordering::Acquire)
    }

    /// Publish every write made to the node so far. Call once at the end of
    /// an advancement batch on the owning thread.
    pub fn flush_write(&self) {
        self.0.sequence.fetch_add(1, Ordering::Release);
    }

    /// Make writes published by [`flush_write`](Self::flush_write) visible to
    /// the calling thread. Returns the publish sequence number observed.
    pub fn flush_read(&self) -> u64 {
        self.0.sequence.load(Ordering::Acquire)
    }

    /// Whether two handles control the same node.
    pub fn same_node(&self, other: &TweenHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn clear(&self) {
        self.0.paused.store(false, Ordering::Release);
        self.0.killed.store(false, Ordering::Release);
    }
}
