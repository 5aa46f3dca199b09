use std::collections::VecDeque;
use std::collections::vec_deque;

/// An ordered snapshot of error-queue messages, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CryptoErrorList {
    errors: VecDeque<String>,
}

impl CryptoErrorList {
    /// An empty list. Nothing is captured.
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding the current queue contents.
    pub fn from_current() -> Self {
        let mut list = Self::new();
        list.capture();
        list
    }

    /// Replaces the contents with the current queue, oldest first. The queue
    /// itself is left as it was, so capturing twice gives the same result.
    pub fn capture(&mut self) {
        self.errors = super::snapshot_messages();
    }

    pub fn add(&mut self, message: impl Into<String>) {
        self.errors.push_back(message.into());
    }

    pub fn peek_back(&self) -> Option<&str> {
        self.errors.back().map(String::as_str)
    }

    pub fn peek_front(&self) -> Option<&str> {
        self.errors.front().map(String::as_str)
    }

    pub fn pop_back(&mut self) -> Option<String> {
        self.errors.pop_back()
    }

    pub fn pop_front(&mut self) -> Option<String> {
        self.errors.pop_front()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, String> {
        self.errors.iter()
    }
}

impl<'a> IntoIterator for &'a CryptoErrorList {
    type Item = &'a String;
    type IntoIter = vec_deque::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl IntoIterator for CryptoErrorList {
    type Item = String;
    type IntoIter = vec_deque::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
