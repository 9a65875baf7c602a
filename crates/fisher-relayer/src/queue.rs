//! Pending queue for verified operations awaiting a batch.
//!
//! Operations that passed authorization are pushed in arrival order. A
//! batch takes at most `max_batch_size` of them, either from the front or
//! by priority score; a failed batch is put back at the front so nothing
//! is lost.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use fisher_optimizer::top_by_priority;
use fisher_types::{FisherError, Result, SignedOperation, constants};

use crate::config::OrderingPolicy;

/// Bounded queue of signed operations.
#[derive(Debug)]
pub struct PendingQueue {
    operations: VecDeque<SignedOperation>,
    capacity: usize,
    ordering: OrderingPolicy,
}

impl PendingQueue {
    /// Create an empty queue with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(constants::DEFAULT_MAX_PENDING)
    }

    /// Create an empty queue holding at most `capacity` operations.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            operations: VecDeque::new(),
            capacity,
            ordering: OrderingPolicy::Fifo,
        }
    }

    #[must_use]
    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    /// Append a verified operation.
    ///
    /// # Errors
    /// Returns `QueueFull` if the queue is at capacity.
    pub fn push(&mut self, operation: SignedOperation) -> Result<()> {
        if self.operations.len() >= self.capacity {
            return Err(FisherError::QueueFull {
                capacity: self.capacity,
            });
        }
        self.operations.push_back(operation);
        Ok(())
    }

    /// Remove and return up to `max` operations.
    ///
    /// `Fifo` drains the front. `Priority` returns the best-scored
    /// operations at `now` in rank order; the rest keep arrival order.
    pub fn take(&mut self, max: usize, now: DateTime<Utc>) -> Vec<SignedOperation> {
        match self.ordering {
            OrderingPolicy::Fifo => {
                let n = max.min(self.operations.len());
                self.operations.drain(..n).collect()
            }
            OrderingPolicy::Priority => self.take_by_priority(max, now),
        }
    }

    fn take_by_priority(&mut self, max: usize, now: DateTime<Utc>) -> Vec<SignedOperation> {
        let ranked = top_by_priority(&self.operations, max, now);
        let mut rank = vec![None; self.operations.len()];
        for (position, index) in ranked.iter().enumerate() {
            rank[*index] = Some(position);
        }

        let mut picked: Vec<(usize, SignedOperation)> = Vec::with_capacity(ranked.len());
        let mut rest = VecDeque::with_capacity(self.operations.len() - ranked.len());
        for (op, slot) in self.operations.drain(..).zip(rank) {
            match slot {
                Some(position) => picked.push((position, op)),
                None => rest.push_back(op),
            }
        }
        self.operations = rest;
        picked.sort_unstable_by_key(|(position, _)| *position);
        picked.into_iter().map(|(_, op)| op).collect()
    }

    /// Put operations back at the front, preserving their order. May
    /// exceed capacity: these were already accepted once.
    pub fn requeue(&mut self, operations: Vec<SignedOperation>) {
        for op in operations.into_iter().rev() {
            self.operations.push_front(op);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn ordering(&self) -> OrderingPolicy {
        self.ordering
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}
