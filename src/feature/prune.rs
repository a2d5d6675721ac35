// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tag-based pruning of a [`Feature`].

use std::mem;

use crate::{outcome::Overall, pickle::TagLevel, scenario::Scenario, tag};

use super::Feature;

impl Feature {
    /// Skips every scenario whose tags of all levels don't satisfy the given
    /// `predicate`.
    pub fn prune_by_tags<P: tag::Predicate + ?Sized>(&mut self, predicate: &P) {
        self.prune(|s| predicate.evaluate(&s.tags().flatten()));
    }

    /// Skips every scenario whose tags of the given `level` don't satisfy
    /// the given `predicate`.
    pub fn prune_by_level<P: tag::Predicate + ?Sized>(
        &mut self,
        level: TagLevel,
        predicate: &P,
    ) {
        self.prune(|s| {
            let tags = s
                .tags()
                .level(level)
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>();
            predicate.evaluate(&tags)
        });
    }

    /// Moves the scenarios rejected by `keep` to the skipped ones.
    ///
    /// Outlines are pruned member by member and skipped as a whole once no
    /// member is left. A [`Feature`] left with nothing to execute is
    /// [`Overall::Skipped`].
    fn prune(&mut self, keep: impl Fn(&Scenario) -> bool) {
        let (kept, mut rejected): (Vec<_>, Vec<_>) =
            mem::take(&mut self.scenarios)
                .into_iter()
                .partition(|s| keep(s));
        for s in &mut rejected {
            s.skip();
        }
        self.scenarios = kept;
        self.skipped_scenarios.append(&mut rejected);

        for mut outline in mem::take(&mut self.outlines) {
            if outline.prune(&keep) {
                self.skipped_outlines.push(outline);
            } else {
                self.outlines.push(outline);
            }
        }

        if !self.has_runnable() {
            self.overall = Some(Overall::Skipped);
        }
        tracing::trace!(
            feature = %self.name,
            scenarios = self.scenarios.len(),
            outlines = self.outlines.len(),
            "feature pruned",
        );
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use gherkin::tagexpr::TagOperation;

    use super::*;
    use crate::{
        pickle::{Document, Pickle, PickleStep, Tags},
        registry::Registry,
        step::RawKeyword,
    };

    fn pickle(
        name: &str,
        raw_name: Option<&str>,
        scenario_tags: &[&str],
        example_tags: &[&str],
    ) -> Pickle {
        let owned = |tags: &[&str]| -> Vec<String> {
            tags.iter().map(|t| (*t).to_owned()).collect()
        };
        Pickle {
            feature_name: "Tagged".into(),
            name: name.into(),
            raw_name: raw_name.map(Into::into),
            language: "en".into(),
            examples_name: None,
            uri: "tagged.feature".into(),
            line: 10,
            outline_line: raw_name.map(|_| 5),
            tags: Tags {
                feature: vec!["@all".into()],
                scenario: owned(scenario_tags),
                example: owned(example_tags),
            },
            steps: vec![PickleStep {
                keyword: RawKeyword::Given,
                text: "anything".into(),
                raw_text: None,
                argument: None,
                line: 11,
            }],
        }
    }

    fn feature(pickles: Vec<Pickle>) -> Feature {
        let mut r = Registry::new();
        _ = r.given("anything", |_, _| Ok::<_, Infallible>(())).unwrap();
        Feature::new(&Document { uri: "tagged.feature".into(), pickles }, r.steps())
            .unwrap()
    }

    fn expr(s: &str) -> TagOperation {
        s.parse().unwrap()
    }

    #[test]
    fn prunes_by_flat_tags() {
        let mut f = feature(vec![
            pickle("fast", None, &["@smoke"], &[]),
            pickle("slow", None, &["@slow"], &[]),
        ]);

        f.prune_by_tags(&expr("not @slow"));

        assert_eq!(
            f.scenarios().iter().map(Scenario::name).collect::<Vec<_>>(),
            ["fast"],
        );
        assert_eq!(f.skipped_scenarios()[0].name(), "slow");
        assert_eq!(f.skipped_scenarios()[0].overall(), Some(Overall::Skipped));
        assert_eq!(f.overall(), None);
    }

    #[test]
    fn skips_fully_pruned_outline() {
        let mut f = feature(vec![
            pickle("row 1", Some("row <n>"), &[], &["@slow"]),
            pickle("row 2", Some("row <n>"), &[], &["@slow"]),
            pickle("plain", None, &[], &[]),
        ]);

        f.prune_by_tags(&expr("not @slow"));

        assert!(f.outlines().is_empty());
        assert_eq!(f.skipped_outlines().len(), 1);
        assert!(f.skipped_outlines()[0].is_fully_skipped());
        assert_eq!(f.scenarios().len(), 1);
    }

    #[test]
    fn keeps_partially_pruned_outline() {
        let mut f = feature(vec![
            pickle("row 1", Some("row <n>"), &[], &["@slow"]),
            pickle("row 2", Some("row <n>"), &[], &["@fast"]),
        ]);

        f.prune_by_level(TagLevel::Example, &expr("@fast"));

        assert_eq!(f.outlines().len(), 1);
        assert_eq!(f.outlines()[0].scenarios()[0].name(), "row 2");
        assert_eq!(f.outlines()[0].skipped_scenarios()[0].name(), "row 1");
        assert!(f.skipped_outlines().is_empty());
    }

    #[test]
    fn evaluates_single_level() {
        let mut f = feature(vec![
            pickle("scenario tagged", None, &["@x"], &[]),
            pickle("example tagged", Some("tagged <n>"), &[], &["@x"]),
        ]);

        f.prune_by_level(TagLevel::Scenario, &expr("@x"));

        assert_eq!(f.scenarios().len(), 1);
        assert!(f.outlines().is_empty());
        assert_eq!(f.skipped_outlines().len(), 1);
    }

    #[test]
    fn skips_feature_with_nothing_left() {
        let mut f = feature(vec![
            pickle("a", None, &["@a"], &[]),
            pickle("row", Some("row <n>"), &[], &[]),
        ]);

        f.prune_by_level(TagLevel::Feature, &|tags: &[&str]| {
            !tags.contains(&"@all")
        });

        assert!(!f.has_runnable());
        assert_eq!(f.overall(), Some(Overall::Skipped));
        assert_eq!(f.skipped_scenarios().len(), 1);
        assert_eq!(f.skipped_outlines().len(), 1);
    }

    #[test]
    fn consecutive_prunes_accumulate() {
        let mut f = feature(vec![
            pickle("a", None, &["@a"], &[]),
            pickle("b", None, &["@b"], &[]),
            pickle("ab", None, &["@a", "@b"], &[]),
        ]);

        f.prune_by_tags(&expr("@a"));
        f.prune_by_level(TagLevel::Scenario, &expr("@b"));

        assert_eq!(
            f.scenarios().iter().map(Scenario::name).collect::<Vec<_>>(),
            ["ab"],
        );
        assert_eq!(f.skipped_scenarios().len(), 2);
    }
}
