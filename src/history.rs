// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Never-empty history of attempts.

use std::iter;

use serde::{Serialize, Serializer};

/// History of attempts of a [`Step`] or a [`Scenario`].
///
/// Always holds the first attempt, so there is always a current one. Attempts
/// are only ever appended.
///
/// [`Scenario`]: crate::Scenario
/// [`Step`]: crate::Step
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct History<T> {
    first: T,
    retries: Vec<T>,
}

impl<T> History<T> {
    pub(crate) const fn new(first: T) -> Self {
        Self { first, retries: Vec::new() }
    }

    pub(crate) fn push(&mut self, attempt: T) {
        self.retries.push(attempt);
    }

    /// Current (latest) attempt.
    #[must_use]
    pub fn last(&self) -> &T {
        self.retries.last().unwrap_or(&self.first)
    }

    pub(crate) fn last_mut(&mut self) -> &mut T {
        self.retries.last_mut().unwrap_or(&mut self.first)
    }

    /// Attempt at the given `index`, `0` being the first run.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        match index.checked_sub(1) {
            None => Some(&self.first),
            Some(i) => self.retries.get(i),
        }
    }

    /// Number of attempts made so far, never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.retries.len() + 1
    }

    /// Always `false`, present for symmetry with [`History::len()`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Index of the current attempt.
    #[must_use]
    pub fn repeat_count(&self) -> usize {
        self.retries.len()
    }

    /// Iterates over all the attempts, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        iter::once(&self.first).chain(&self.retries)
    }
}

impl<T: Serialize> Serialize for History<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_monotonically() {
        let mut h = History::new("a");
        assert_eq!((h.len(), h.repeat_count(), *h.last()), (1, 0, "a"));

        h.push("b");
        h.push("c");
        *h.last_mut() = "d";

        assert_eq!(h.len(), 3);
        assert_eq!(h.repeat_count(), 2);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), ["a", "b", "d"]);
        assert_eq!(h.get(0), Some(&"a"));
        assert_eq!(h.get(2), Some(&"d"));
        assert_eq!(h.get(3), None);
    }

    #[test]
    fn serializes_as_sequence() {
        let mut h = History::new(1);
        h.push(2);

        assert_eq!(serde_json::to_string(&h).unwrap(), "[1,2]");
    }
}
