use std::collections::VecDeque;

use crate::path::RemotePath;

/// Stack of previously current paths backing "back" navigation.
///
/// The top of the stack is the most recently left path. With a non-zero
/// limit the oldest entry is dropped once the stack is full.
#[derive(Clone, Debug, Default)]
pub struct NavigationHistory {
    entries: VecDeque<RemotePath>,
    limit: usize,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// `0` means unbounded.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    pub fn push(&mut self, path: RemotePath) {
        if self.limit > 0 && self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(path);
    }

    /// `None` when there is nowhere to go back to.
    pub fn pop(&mut self) -> Option<RemotePath> {
        self.entries.pop_back()
    }

    pub fn peek(&self) -> Option<&RemotePath> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RemotePath> {
        self.entries.iter()
    }
}
