//! Ordered pairs, with or without names for each side.

use std::fmt;

/// A pair ordered by `first`, then `second`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyValuePair<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> KeyValuePair<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn into_tuple(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A, B> From<(A, B)> for KeyValuePair<A, B> {
    fn from((first, second): (A, B)) -> Self {
        Self { first, second }
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for KeyValuePair<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.first, self.second)
    }
}

/// Side of a [`TaggedPair`] selected by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tagged<'a, A, B> {
    First(&'a A),
    Second(&'a B),
}

/// A [`KeyValuePair`] whose sides carry meaningful names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedPair<A, B> {
    pair: KeyValuePair<A, B>,
    first_tag: String,
    second_tag: String,
}

impl<A, B> TaggedPair<A, B> {
    pub fn new(first: A, second: B, first_tag: impl Into<String>, second_tag: impl Into<String>) -> Self {
        Self {
            pair: KeyValuePair::new(first, second),
            first_tag: first_tag.into(),
            second_tag: second_tag.into(),
        }
    }

    /// Look a side up by its tag. If both tags are equal the first side wins.
    pub fn get(&self, tag: &str) -> Option<Tagged<'_, A, B>> {
        if tag == self.first_tag {
            Some(Tagged::First(&self.pair.first))
        } else if tag == self.second_tag {
            Some(Tagged::Second(&self.pair.second))
        } else {
            None
        }
    }

    pub fn pair(&self) -> &KeyValuePair<A, B> {
        &self.pair
    }

    pub fn tags(&self) -> (&str, &str) {
        (&self.first_tag, &self.second_tag)
    }
}
