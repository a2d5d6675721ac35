// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tag [`Filters`] selecting the scenarios to execute.

use derive_more::with_trait::Debug;

use crate::{feature::Feature, pickle::TagLevel, tag::Predicate};

/// Boxed [`Predicate`] shareable across threads.
pub type BoxedPredicate = Box<dyn Predicate + Send + Sync>;

/// Tag filters applied to every [`Feature`] before execution.
///
/// The flat filter is applied first, then the per-level ones, outermost
/// level first. Every filter narrows down what the previous ones kept.
#[derive(Debug, Default)]
pub struct Filters {
    /// Filter over the tags of all levels.
    #[debug(ignore)]
    flat: Option<BoxedPredicate>,

    /// Filter over the `Feature` tags.
    #[debug(ignore)]
    feature: Option<BoxedPredicate>,

    /// Filter over the `Scenario` tags.
    #[debug(ignore)]
    scenario: Option<BoxedPredicate>,

    /// Filter over the `Examples` tags.
    #[debug(ignore)]
    example: Option<BoxedPredicate>,
}

impl Filters {
    /// Creates [`Filters`] keeping everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter over the tags of all levels.
    #[must_use]
    pub fn tags<P>(mut self, predicate: P) -> Self
    where
        P: Predicate + Send + Sync + 'static,
    {
        self.flat = Some(Box::new(predicate));
        self
    }

    /// Sets the filter over the tags of the given `level` only.
    #[must_use]
    pub fn level<P>(mut self, level: TagLevel, predicate: P) -> Self
    where
        P: Predicate + Send + Sync + 'static,
    {
        *self.level_mut(level) = Some(Box::new(predicate));
        self
    }

    /// Indicates whether no filter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flat.is_none()
            && self.feature.is_none()
            && self.scenario.is_none()
            && self.example.is_none()
    }

    /// Prunes the given [`Feature`] with all the set filters.
    pub fn apply(&self, feature: &mut Feature) {
        if let Some(predicate) = &self.flat {
            tracing::trace!(feature = feature.name(), "filtering by flat tags");
            feature.prune_by_tags(predicate.as_ref());
        }
        for level in TagLevel::ALL {
            if let Some(predicate) = self.level_ref(level) {
                tracing::trace!(
                    feature = feature.name(),
                    %level,
                    "filtering by level tags",
                );
                feature.prune_by_level(level, predicate.as_ref());
            }
        }
    }

    const fn level_ref(&self, level: TagLevel) -> Option<&BoxedPredicate> {
        match level {
            TagLevel::Feature => self.feature.as_ref(),
            TagLevel::Scenario => self.scenario.as_ref(),
            TagLevel::Example => self.example.as_ref(),
        }
    }

    fn level_mut(&mut self, level: TagLevel) -> &mut Option<BoxedPredicate> {
        match level {
            TagLevel::Feature => &mut self.feature,
            TagLevel::Scenario => &mut self.scenario,
            TagLevel::Example => &mut self.example,
        }
    }
}
