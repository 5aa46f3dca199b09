use std::marker::PhantomData;

use super::{CryptoErrorList, Mark, clear_errors, peek_error, pop_to_mark, set_mark};
use crate::error::ErrorCode;

/// Clears the whole error queue when dropped.
///
/// If a list is supplied it receives the queue contents at construction and
/// again just before the queue is cleared, so whatever accumulated inside the
/// scope stays observable to the caller.
///
/// Guards must be dropped in the reverse order they were created. The guard
/// is neither `Send` nor `Sync`: the queue it clears belongs to this thread.
#[must_use = "the queue is cleared when the guard is dropped"]
pub struct ClearErrorOnReturn<'a> {
    errors: Option<&'a mut CryptoErrorList>,
    _thread_bound: PhantomData<*const ()>,
}

impl<'a> ClearErrorOnReturn<'a> {
    pub fn new(errors: Option<&'a mut CryptoErrorList>) -> Self {
        let mut errors = errors;
        if let Some(list) = errors.as_deref_mut() {
            list.capture();
        }
        Self {
            errors,
            _thread_bound: PhantomData,
        }
    }

    /// The oldest queued record, without removing it.
    pub fn peek_error(&self) -> Option<ErrorCode> {
        peek_error()
    }
}

impl Drop for ClearErrorOnReturn<'_> {
    fn drop(&mut self) {
        if let Some(list) = self.errors.as_deref_mut() {
            list.capture();
        }
        clear_errors();
    }
}

/// Removes only the records pushed during its lifetime when dropped.
///
/// Records older than the guard survive, so a nested guard can never erase an
/// outer scope's diagnostics. The same LIFO and thread rules as
/// [`ClearErrorOnReturn`] apply.
#[must_use = "records pushed in scope are popped when the guard is dropped"]
pub struct MarkPopErrorOnReturn<'a> {
    errors: Option<&'a mut CryptoErrorList>,
    mark: Mark,
    _thread_bound: PhantomData<*const ()>,
}

impl<'a> MarkPopErrorOnReturn<'a> {
    pub fn new(errors: Option<&'a mut CryptoErrorList>) -> Self {
        let mark = set_mark();
        let mut errors = errors;
        if let Some(list) = errors.as_deref_mut() {
            list.capture();
        }
        Self {
            errors,
            mark,
            _thread_bound: PhantomData,
        }
    }

    pub fn peek_error(&self) -> Option<ErrorCode> {
        peek_error()
    }
}

impl Drop for MarkPopErrorOnReturn<'_> {
    fn drop(&mut self) {
        if let Some(list) = self.errors.as_deref_mut() {
            list.capture();
        }
        let popped = pop_to_mark(self.mark);
        if popped > 0 {
            tracing::trace!(popped, "popped scoped errors");
        }
    }
}

/// Runs `f` inside a [`ClearErrorOnReturn`] scope.
pub fn clear_error_on_return<T>(
    errors: Option<&mut CryptoErrorList>,
    f: impl FnOnce() -> T,
) -> T {
    let _guard = ClearErrorOnReturn::new(errors);
    f()
}

/// Runs `f` inside a [`MarkPopErrorOnReturn`] scope.
pub fn mark_pop_error_on_return<T>(
    errors: Option<&mut CryptoErrorList>,
    f: impl FnOnce() -> T,
) -> T {
    let _guard = MarkPopErrorOnReturn::new(errors);
    f()
}
