// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Grouping of failed [`Scenario`]s by their root cause.

use linked_hash_map::LinkedHashMap;

use crate::{outcome::Status, scenario::Scenario};

/// Failed [`Scenario`]s grouped by the failure name and the first failure
/// argument of the first failed step of their last attempt.
///
/// Groups keep the order of first appearance.
#[derive(Clone, Debug, Default)]
pub struct ExceptionGroups<'a> {
    groups: LinkedHashMap<String, LinkedHashMap<String, Vec<&'a Scenario>>>,
}

impl<'a> ExceptionGroups<'a> {
    /// Groups the given `scenarios`, ignoring the ones without failures.
    #[must_use]
    pub fn new<I>(scenarios: I) -> Self
    where
        I: IntoIterator<Item = &'a Scenario>,
    {
        let mut groups = Self::default();
        for scenario in scenarios {
            let Some(failure) = scenario
                .last_steps(Status::Failed)
                .next()
                .and_then(|step| step.last_attempt().result().failure())
            else {
                continue;
            };
            groups
                .groups
                .entry(failure.name.clone())
                .or_insert_with(LinkedHashMap::new)
                .entry(failure.first_arg().to_owned())
                .or_insert_with(Vec::new)
                .push(scenario);
        }
        groups
    }

    /// [`Scenario`]s failed with the given failure `name` and first `arg`.
    #[must_use]
    pub fn get(&self, name: &str, arg: &str) -> &[&'a Scenario] {
        self.groups
            .get(name)
            .and_then(|args| args.get(arg))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Iterates over the groups as `(name, first arg, scenarios)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[&'a Scenario])> {
        self.groups.iter().flat_map(|(name, args)| {
            args.iter().map(move |(arg, scenarios)| {
                (name.as_str(), arg.as_str(), scenarios.as_slice())
            })
        })
    }

    /// Distinct failure names.
    pub fn names(&self) -> impl Iterator<Item = &str> + use<'_, 'a> {
        self.groups.keys().map(String::as_str)
    }

    /// Number of distinct `(name, first arg)` signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.values().map(LinkedHashMap::len).sum()
    }

    /// Indicates whether no failure has been grouped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
