// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tag expressions as opaque predicates.

use gherkin::tagexpr::TagOperation;
use sealed::sealed;

/// Boolean predicate over a set of tags.
///
/// The engine never looks inside: the grammar of tag expressions belongs to
/// whoever implements this trait.
pub trait Predicate {
    /// Evaluates this [`Predicate`] against the given `tags`.
    #[must_use]
    fn evaluate(&self, tags: &[&str]) -> bool;
}

impl Predicate for TagOperation {
    fn evaluate(&self, tags: &[&str]) -> bool {
        self.eval(tags.iter().copied())
    }
}

impl<F> Predicate for F
where
    F: Fn(&[&str]) -> bool,
{
    fn evaluate(&self, tags: &[&str]) -> bool {
        self(tags)
    }
}

/// Extension of a [`TagOperation`] allowing to evaluate it.
#[sealed]
pub trait Ext {
    /// Evaluates this [`TagOperation`] for the given `tags`.
    ///
    /// Leading `@` is insignificant on both sides.
    #[must_use]
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone;
}

#[sealed]
impl Ext for TagOperation {
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        match self {
            Self::And(l, r) => l.eval(tags.clone()) & r.eval(tags),
            Self::Or(l, r) => l.eval(tags.clone()) | r.eval(tags),
            Self::Not(t) => !t.eval(tags),
            Self::Tag(t) => {
                let t = strip_at(t);
                tags.into_iter().any(|tag| strip_at(tag.as_ref()) == t)
            }
        }
    }
}

fn strip_at(tag: &str) -> &str {
    tag.strip_prefix('@').unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(s: &str) -> TagOperation {
        s.parse().unwrap()
    }

    #[test]
    fn evaluates_negation() {
        let not_slow = expr("not @slow");

        assert!(not_slow.evaluate(&["@smoke"]));
        assert!(!not_slow.evaluate(&["@slow"]));
        assert!(!not_slow.evaluate(&["slow", "smoke"]));
    }

    #[test]
    fn evaluates_conjunctions() {
        let e = expr("@smoke and (@fast or @ui)");

        assert!(e.evaluate(&["smoke", "ui"]));
        assert!(!e.evaluate(&["smoke"]));
        assert!(!e.evaluate(&["fast", "ui"]));
    }

    #[test]
    fn closures_are_predicates() {
        let has_two = |tags: &[&str]| tags.len() == 2;

        assert!(has_two.evaluate(&["a", "b"]));
        assert!(!has_two.evaluate(&[]));
    }
}
