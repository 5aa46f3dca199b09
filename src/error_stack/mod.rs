//! The per-thread error queue and the scoped primitives that discipline it.
//!
//! Toolkit operations report failures by pushing records into a bounded,
//! thread-local queue. Callers inspect it through [`CryptoErrorList`]
//! snapshots and keep it tidy with [`ClearErrorOnReturn`] and
//! [`MarkPopErrorOnReturn`].

mod list;
mod scope;

pub use list::CryptoErrorList;
pub use scope::{
    ClearErrorOnReturn, MarkPopErrorOnReturn, clear_error_on_return, mark_pop_error_on_return,
};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ErrorCode, Reason};

/// Number of records a thread's queue holds before the oldest is evicted.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

static QUEUE_CAPACITY: AtomicUsize = AtomicUsize::new(DEFAULT_QUEUE_CAPACITY);

pub(crate) fn set_queue_capacity(capacity: usize) {
    QUEUE_CAPACITY.store(capacity.max(1), Ordering::Relaxed);
}

pub fn queue_capacity() -> usize {
    QUEUE_CAPACITY.load(Ordering::Relaxed)
}

/// One entry in the error queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    seq: u64,
    pub code: ErrorCode,
    pub data: Option<String>,
}

impl ErrorRecord {
    /// The human-readable message, as captured into a [`CryptoErrorList`].
    pub fn message(&self) -> String {
        match &self.data {
            Some(data) => format!("{}:{}", self.code, data),
            None => self.code.to_string(),
        }
    }
}

/// A position in the queue. Records pushed after the mark was set are the
/// ones [`pop_to_mark`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(u64);

#[derive(Default)]
struct ErrorQueue {
    records: VecDeque<ErrorRecord>,
    next_seq: u64,
}

impl ErrorQueue {
    fn push(&mut self, code: ErrorCode, data: Option<String>) {
        let capacity = queue_capacity();
        while self.records.len() >= capacity {
            self.records.pop_front();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.push_back(ErrorRecord { seq, code, data });
    }
}

thread_local! {
    static QUEUE: RefCell<ErrorQueue> = RefCell::new(ErrorQueue::default());
}

fn with_queue<T>(f: impl FnOnce(&mut ErrorQueue) -> T) -> T {
    QUEUE.with(|q| f(&mut q.borrow_mut()))
}

/// Pushes a record for `reason` and returns its packed code.
pub fn put_error(reason: Reason) -> ErrorCode {
    let code = reason.error_code();
    with_queue(|q| q.push(code, None));
    code
}

/// Pushes a record carrying extra data, e.g. `id=<engine>`.
pub fn put_error_with_data(reason: Reason, data: impl Into<String>) -> ErrorCode {
    let code = reason.error_code();
    let data = data.into();
    with_queue(|q| q.push(code, Some(data)));
    code
}

/// The oldest record's code, without removing it.
pub fn peek_error() -> Option<ErrorCode> {
    with_queue(|q| q.records.front().map(|r| r.code))
}

/// The newest record's code, without removing it.
pub fn peek_last_error() -> Option<ErrorCode> {
    with_queue(|q| q.records.back().map(|r| r.code))
}

/// Removes and returns the oldest record's code.
pub fn get_error() -> Option<ErrorCode> {
    with_queue(|q| q.records.pop_front().map(|r| r.code))
}

/// Empties this thread's queue.
pub fn clear_errors() {
    let dropped = with_queue(|q| {
        let n = q.records.len();
        q.records.clear();
        n
    });
    if dropped > 0 {
        tracing::trace!(dropped, "cleared error queue");
    }
}

pub fn error_depth() -> usize {
    with_queue(|q| q.records.len())
}

pub fn set_mark() -> Mark {
    with_queue(|q| Mark(q.next_seq))
}

/// Removes every record pushed after `mark`, newest first. Returns how many
/// were removed. Records older than the mark are never touched.
pub fn pop_to_mark(mark: Mark) -> usize {
    with_queue(|q| {
        let mut popped = 0;
        while q.records.back().is_some_and(|r| r.seq >= mark.0) {
            q.records.pop_back();
            popped += 1;
        }
        popped
    })
}

/// Messages of every queued record, oldest first. The queue is unchanged.
pub(crate) fn snapshot_messages() -> VecDeque<String> {
    with_queue(|q| q.records.iter().map(ErrorRecord::message).collect())
}
