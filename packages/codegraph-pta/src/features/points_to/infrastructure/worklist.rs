//! Deduplicating node worklist
//!
//! A node is queued at most once at a time: pushing a node that is already
//! pending is a no-op. Pop order is FIFO or LIFO depending on
//! [`WorklistOrder`].

use crate::config::WorklistOrder;
use crate::features::points_to::domain::NodeId;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct Worklist {
    queue: VecDeque<NodeId>,
    /// Nodes currently in `queue`
    pending: FxHashSet<NodeId>,
    order: WorklistOrder,
}

impl Worklist {
    pub fn new(order: WorklistOrder) -> Self {
        Self {
            queue: VecDeque::new(),
            pending: FxHashSet::default(),
            order,
        }
    }

    /// Queue a node. Returns false if it was already pending.
    #[inline]
    pub fn push(&mut self, node: NodeId) -> bool {
        if self.pending.insert(node) {
            self.queue.push_back(node);
            true
        } else {
            false
        }
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        let node = match self.order {
            WorklistOrder::Fifo => self.queue.pop_front(),
            WorklistOrder::Lifo => self.queue.pop_back(),
        }?;
        self.pending.remove(&node);
        Some(node)
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.pending.contains(&node)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }
}
