// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Summary`] of an executed run.

mod exceptions;

use std::fmt;

use crate::{
    feature::Feature,
    outcome::{Overall, Status},
    outline::ScenarioOutline,
    scenario::Scenario,
    step::Step,
};

pub use self::exceptions::ExceptionGroups;

/// Entities of a run bucketed by their result.
///
/// Steps are taken from the last attempt of every scenario.
#[derive(Clone, Debug, Default)]
pub struct Summary<'a> {
    /// Features having all their scenarios and outlines passed.
    pub passed_features: Vec<&'a Feature>,

    /// Features having any scenario or outline failed.
    pub failed_features: Vec<&'a Feature>,

    /// Features left with nothing to execute.
    pub skipped_features: Vec<&'a Feature>,

    /// Outlines having all their scenarios passed.
    pub passed_outlines: Vec<&'a ScenarioOutline>,

    /// Outlines having any scenario failed.
    pub failed_outlines: Vec<&'a ScenarioOutline>,

    /// Outlines having all their scenarios pruned.
    pub skipped_outlines: Vec<&'a ScenarioOutline>,

    /// Passed scenarios not coming from an outline.
    pub passed_pure_scenarios: Vec<&'a Scenario>,

    /// Failed scenarios not coming from an outline.
    pub failed_pure_scenarios: Vec<&'a Scenario>,

    /// Pruned scenarios not coming from an outline.
    pub skipped_pure_scenarios: Vec<&'a Scenario>,

    /// Passed scenarios, outline ones included.
    pub passed_scenarios: Vec<&'a Scenario>,

    /// Failed scenarios, outline ones included.
    pub failed_scenarios: Vec<&'a Scenario>,

    /// Pruned scenarios, outline ones included.
    pub skipped_scenarios: Vec<&'a Scenario>,

    /// Passed steps.
    pub passed_steps: Vec<&'a Step>,

    /// Failed steps.
    pub failed_steps: Vec<&'a Step>,

    /// Steps left unexecuted after a failure.
    pub not_executed_steps: Vec<&'a Step>,

    /// Failed scenarios grouped by root cause.
    pub exception_groups: ExceptionGroups<'a>,
}

impl<'a> Summary<'a> {
    /// Summarizes the given `features`, skipped ones included.
    #[must_use]
    pub fn new<I>(features: I) -> Self
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        let mut s = Self::default();
        for feature in features {
            match feature.overall() {
                Some(Overall::Passed) => s.passed_features.push(feature),
                Some(Overall::Failed) => s.failed_features.push(feature),
                Some(Overall::Skipped) | None => {
                    s.skipped_features.push(feature);
                }
            }

            s.passed_pure_scenarios.extend(feature.passed_scenarios());
            s.failed_pure_scenarios.extend(feature.failed_scenarios());
            s.skipped_pure_scenarios.extend(feature.skipped_scenarios());

            s.passed_outlines.extend(feature.passed_outlines());
            s.failed_outlines.extend(feature.failed_outlines());
            s.skipped_outlines.extend(feature.skipped_outlines());

            s.passed_scenarios.extend(feature.passed_scenarios());
            s.add_outline_scenarios(feature.passed_outlines());
            s.failed_scenarios.extend(feature.failed_scenarios());
            s.add_outline_scenarios(feature.failed_outlines());
            s.skipped_scenarios.extend(feature.skipped_scenarios());
            s.add_outline_scenarios(feature.skipped_outlines());
        }

        let scenarios = s.all_scenarios().collect::<Vec<_>>();
        for scenario in scenarios.iter().copied() {
            s.passed_steps.extend(scenario.last_steps(Status::Passed));
            s.failed_steps.extend(scenario.last_steps(Status::Failed));
            s.not_executed_steps
                .extend(scenario.last_steps(Status::NotExecuted));
        }
        s.exception_groups = ExceptionGroups::new(scenarios);
        s
    }

    /// Buckets every scenario of the given `outlines`, outline by outline.
    fn add_outline_scenarios<I>(&mut self, outlines: I)
    where
        I: IntoIterator<Item = &'a ScenarioOutline>,
    {
        for outline in outlines {
            self.passed_scenarios.extend(outline.passed_scenarios());
            self.failed_scenarios.extend(outline.failed_scenarios());
            self.skipped_scenarios.extend(outline.skipped_scenarios());
        }
    }

    /// Every scenario: passed, then failed, then skipped ones.
    pub fn all_scenarios(&self) -> impl Iterator<Item = &'a Scenario> + '_ {
        self.passed_scenarios
            .iter()
            .chain(&self.failed_scenarios)
            .chain(&self.skipped_scenarios)
            .copied()
    }

    /// Indicates whether anything failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed_scenarios.is_empty()
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Features: {} passed, {} failed, {} skipped",
            self.passed_features.len(),
            self.failed_features.len(),
            self.skipped_features.len(),
        )?;
        writeln!(
            f,
            "Scenario outlines: {} passed, {} failed, {} skipped",
            self.passed_outlines.len(),
            self.failed_outlines.len(),
            self.skipped_outlines.len(),
        )?;
        writeln!(
            f,
            "Pure scenarios: {} passed, {} failed, {} skipped",
            self.passed_pure_scenarios.len(),
            self.failed_pure_scenarios.len(),
            self.skipped_pure_scenarios.len(),
        )?;
        writeln!(
            f,
            "Scenarios (incl. from outlines): {} passed, {} failed, {} skipped",
            self.passed_scenarios.len(),
            self.failed_scenarios.len(),
            self.skipped_scenarios.len(),
        )?;
        write!(
            f,
            "Steps: {} passed, {} failed, {} not executed",
            self.passed_steps.len(),
            self.failed_steps.len(),
            self.not_executed_steps.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use gherkin::tagexpr::TagOperation;

    use super::*;
    use crate::{
        context::Context,
        pickle::{Document, Pickle, PickleStep, Tags},
        registry::Registry,
        step::RawKeyword,
    };

    fn pickle(name: &str, raw_name: Option<&str>, steps: &[&str]) -> Pickle {
        Pickle {
            feature_name: "Summarized".into(),
            name: name.into(),
            raw_name: raw_name.map(Into::into),
            language: "en".into(),
            examples_name: None,
            uri: "summarized.feature".into(),
            line: 1,
            outline_line: None,
            tags: Tags {
                scenario: vec![format!("@{name}")],
                ..Tags::default()
            },
            steps: steps
                .iter()
                .map(|text| PickleStep {
                    keyword: RawKeyword::Given,
                    text: (*text).into(),
                    raw_text: None,
                    argument: None,
                    line: 2,
                })
                .collect(),
        }
    }

    #[derive(Debug)]
    struct Timeout(String);

    impl fmt::Display for Timeout {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "timed out on {}", self.0)
        }
    }

    fn registry() -> Registry {
        let mut r = Registry::new();
        _ = r
            .given("ok", |_, _| Ok::<_, Timeout>(()))
            .unwrap()
            .given("timeout on {what}", |_, args| {
                Err(Timeout(args.get("what").unwrap_or_default().to_owned()))
            })
            .unwrap()
            .given("panic", |_, _| -> std::result::Result<(), Timeout> {
                panic!("boom")
            })
            .unwrap();
        r
    }

    fn executed(pickles: Vec<Pickle>, skip: Option<&str>) -> Feature {
        let r = registry();
        let mut f = Feature::new(
            &Document { uri: "summarized.feature".into(), pickles },
            r.steps(),
        )
        .unwrap();
        if let Some(expr) = skip {
            f.prune_by_tags(&expr.parse::<TagOperation>().unwrap());
        }
        if f.has_runnable() {
            f.execute(&r, &mut Context::default()).unwrap();
        }
        f
    }

    #[test]
    fn buckets_everything() {
        let features = [
            executed(
                vec![
                    pickle("a", None, &["ok", "timeout on db", "ok"]),
                    pickle("b", None, &["ok"]),
                    pickle("c", None, &["ok"]),
                    pickle("r1", Some("r<n>"), &["ok"]),
                    pickle("r2", Some("r<n>"), &["timeout on db"]),
                ],
                Some("not @c"),
            ),
            executed(vec![pickle("d", None, &["ok"])], None),
            executed(vec![pickle("e", None, &["ok"])], Some("not @e")),
        ];

        let s = Summary::new(&features);

        assert_eq!(s.passed_features.len(), 1);
        assert_eq!(s.failed_features.len(), 1);
        assert_eq!(s.skipped_features.len(), 1);
        assert_eq!(s.failed_outlines.len(), 1);
        assert_eq!(s.passed_pure_scenarios.len(), 2);
        assert_eq!(s.failed_pure_scenarios.len(), 1);
        assert_eq!(s.skipped_pure_scenarios.len(), 2);
        assert_eq!(s.passed_scenarios.len(), 3);
        assert_eq!(s.failed_scenarios.len(), 2);
        assert_eq!(s.skipped_scenarios.len(), 2);
        assert_eq!(s.passed_steps.len(), 4);
        assert_eq!(s.failed_steps.len(), 2);
        assert_eq!(s.not_executed_steps.len(), 1);
        assert!(s.has_failures());
        assert_eq!(
            s.to_string(),
            "Features: 1 passed, 1 failed, 1 skipped\n\
             Scenario outlines: 0 passed, 1 failed, 0 skipped\n\
             Pure scenarios: 2 passed, 1 failed, 2 skipped\n\
             Scenarios (incl. from outlines): 3 passed, 2 failed, 2 skipped\n\
             Steps: 4 passed, 2 failed, 1 not executed",
        );
    }

    #[test]
    fn groups_exceptions_by_root_cause() {
        let features = [executed(
            vec![
                pickle("a", None, &["timeout on db"]),
                pickle("b", None, &["ok", "timeout on db"]),
                pickle("c", None, &["timeout on network"]),
                pickle("d", None, &["panic", "timeout on db"]),
                pickle("e", None, &["ok"]),
            ],
            None,
        )];

        let s = Summary::new(&features);
        let groups = &s.exception_groups;
        let timeout = "Timeout";

        assert_eq!(groups.len(), 3);
        assert_eq!(groups.names().collect::<Vec<_>>(), [timeout, "panic"]);
        assert_eq!(
            groups
                .get(timeout, "timed out on db")
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>(),
            ["a", "b"],
        );
        assert_eq!(groups.get(timeout, "timed out on network").len(), 1);
        assert_eq!(groups.get("panic", "boom").len(), 1);
        assert!(groups.get("panic", "other").is_empty());
    }

    #[test]
    fn keeps_feature_order_across_outlines() {
        let features = [
            executed(
                vec![
                    pickle("a", None, &["ok"]),
                    pickle("r1", Some("r<n>"), &["timeout on db"]),
                ],
                None,
            ),
            executed(vec![pickle("b", None, &["panic"])], None),
        ];

        let s = Summary::new(&features);

        assert_eq!(
            s.failed_scenarios.iter().map(|s| s.name()).collect::<Vec<_>>(),
            ["r1", "b"],
        );
        assert_eq!(
            s.all_scenarios().map(|s| s.name()).collect::<Vec<_>>(),
            ["a", "r1", "b"],
        );
        assert_eq!(
            s.exception_groups.names().collect::<Vec<_>>(),
            ["Timeout", "panic"],
        );
    }
}
