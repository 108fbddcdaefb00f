//! Capped buffers for pushed events and messages.
//!
//! Each connection owns one buffer per push kind. Entries are shared as
//! `Arc<Received<T>>`, so a consumer that marks an entry used through any
//! snapshot marks it for everyone.
//!
//! Policy: on every append, entries already marked used are dropped first;
//! then the oldest entries are evicted until the buffer holds at most
//! `limit` entries.

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::debug;

/// A buffered push with its bookkeeping.
#[derive(Debug)]
pub struct Received<T> {
    seq: u64,
    received_at: DateTime<Utc>,
    used: AtomicBool,
    item: T,
}

impl<T> Received<T> {
    fn new(seq: u64, item: T) -> Self {
        Self {
            seq,
            received_at: Utc::now(),
            used: AtomicBool::new(false),
            item,
        }
    }

    /// Monotonic position within the owning connection.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Marks the entry as acted upon.
    pub fn mark_used(&self) {
        self.used.store(true, Ordering::Release);
    }

    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    pub fn item(&self) -> &T {
        &self.item
    }
}

impl<T> Deref for Received<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

/// FIFO buffer holding at most `limit` entries.
#[derive(Debug)]
pub struct PushBuffer<T> {
    entries: VecDeque<Arc<Received<T>>>,
    limit: usize,
    next_seq: u64,
    kind: &'static str,
}

impl<T> PushBuffer<T> {
    /// Creates an empty buffer. `kind` only labels log lines.
    pub fn new(kind: &'static str, limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
            next_seq: 0,
            kind,
        }
    }

    /// Prunes used entries, then appends items in order and evicts the
    /// oldest. Pruning happens even when `items` is empty.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.is_used());
        let pruned = before - self.entries.len();
        if pruned > 0 {
            debug!(kind = self.kind, pruned, "pruned used entries");
        }

        for item in items {
            self.entries.push_back(Arc::new(Received::new(self.next_seq, item)));
            self.next_seq += 1;
        }
        self.evict();
    }

    /// Changes the limit, evicting immediately if the buffer is over it.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.evict();
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<Received<T>>> {
        self.entries.iter().cloned().collect()
    }

    /// Entries not yet marked used, oldest first.
    pub fn unread(&self) -> Vec<Arc<Received<T>>> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_used())
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict(&mut self) {
        let excess = self.entries.len().saturating_sub(self.limit);
        if excess > 0 {
            self.entries.drain(..excess);
            debug!(kind = self.kind, evicted = excess, limit = self.limit, "buffer limit reached");
        }
    }
}
