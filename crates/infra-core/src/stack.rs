//! LimitedStack: a LIFO stack that keeps only the newest `limit` items.

use std::collections::VecDeque;
use std::fmt;

/// Stack bounded to `limit` items. Pushing onto a full stack evicts the
/// bottom (oldest) item, which stays available through
/// [`LimitedStack::last_evicted`]. A limit of `0` means unbounded.
#[derive(Debug, Clone)]
pub struct LimitedStack<T> {
    items: VecDeque<T>,
    limit: usize,
    last_evicted: Option<T>,
}

impl<T> LimitedStack<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            items: VecDeque::new(),
            limit,
            last_evicted: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    pub fn limit(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Top of the stack.
    pub fn peek(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    /// Push `item`, evicting the oldest item if the stack is full.
    pub fn push(&mut self, item: T) {
        if self.limit > 0 && self.items.len() >= self.limit {
            self.last_evicted = self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// The most recent item dropped because of the size limit. Items
    /// removed with [`pop`](Self::pop) do not count.
    pub fn last_evicted(&self) -> Option<&T> {
        self.last_evicted.as_ref()
    }

    /// 1-based distance of `item` from the top (the top itself is 1),
    /// using the occurrence nearest the top.
    pub fn search(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.items
            .iter()
            .rev()
            .position(|candidate| candidate == item)
            .map(|index| index + 1)
    }

    /// Items from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: fmt::Display> fmt::Display for LimitedStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for item in &self.items {
            write!(f, "{{{item}}};")?;
        }
        f.write_str("]")
    }
}
