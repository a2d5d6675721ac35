// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Feature`]: executable content of a single source document.
//!
//! Pickles coming from the same `Scenario Outline` are clustered back into a
//! [`ScenarioOutline`] by their outline header line and name template, in
//! first-seen order. All the others become pure [`Scenario`]s.

mod prune;

use std::time::{Duration, Instant};

use linked_hash_map::LinkedHashMap;
use serde::Serialize;

use crate::{
    context::{Context, FeatureInfo},
    hook::Phase,
    id::Identifier,
    outcome::Overall,
    outline::ScenarioOutline,
    pickle::Document,
    registry::Registry,
    scenario::Scenario,
    step, Error, Result,
};

/// Executable content of a single source document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Feature {
    identifier: Identifier,
    name: String,
    uri: String,
    scenarios: Vec<Scenario>,
    outlines: Vec<ScenarioOutline>,
    skipped_scenarios: Vec<Scenario>,
    skipped_outlines: Vec<ScenarioOutline>,
    passed_scenarios: Vec<usize>,
    failed_scenarios: Vec<usize>,
    passed_outlines: Vec<usize>,
    failed_outlines: Vec<usize>,
    duration: Option<Duration>,
    overall: Option<Overall>,
}

impl Feature {
    /// Builds a [`Feature`] out of the pickles of the given [`Document`],
    /// binding all their steps against the given step definitions.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyFeature`] if the [`Document`] has no pickles;
    /// - see [`Scenario::new()`] for the others.
    pub fn new(document: &Document, steps: &step::Collection) -> Result<Self> {
        let first = document.pickles.first().ok_or_else(|| {
            Error::EmptyFeature { uri: document.uri.clone() }
        })?;

        let mut scenarios = Vec::new();
        let mut clusters = LinkedHashMap::<(usize, String), Vec<Scenario>>::new();
        for pickle in &document.pickles {
            let scenario = Scenario::new(pickle, steps)?;
            match &pickle.raw_name {
                Some(raw_name) => clusters
                    .entry((pickle.line_in_file(), raw_name.clone()))
                    .or_insert_with(Vec::new)
                    .push(scenario),
                None => scenarios.push(scenario),
            }
        }
        let outlines = clusters
            .into_iter()
            .map(|((line, raw_name), members)| {
                ScenarioOutline::new(raw_name, line, members)
            })
            .collect::<Vec<_>>();

        tracing::trace!(
            uri = %document.uri,
            scenarios = scenarios.len(),
            outlines = outlines.len(),
            "feature built",
        );

        Ok(Self {
            identifier: Identifier::generate(),
            name: first.feature_name.clone(),
            uri: document.uri.clone(),
            scenarios,
            outlines,
            skipped_scenarios: Vec::new(),
            skipped_outlines: Vec::new(),
            passed_scenarios: Vec::new(),
            failed_scenarios: Vec::new(),
            passed_outlines: Vec::new(),
            failed_outlines: Vec::new(),
            duration: None,
            overall: None,
        })
    }

    /// Unique identifier of this [`Feature`].
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Name of the feature.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URI of the source document.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Pure scenarios left to execute.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Outlines left to execute.
    #[must_use]
    pub fn outlines(&self) -> &[ScenarioOutline] {
        &self.outlines
    }

    /// Pure scenarios pruned by a tag filter.
    #[must_use]
    pub fn skipped_scenarios(&self) -> &[Scenario] {
        &self.skipped_scenarios
    }

    /// Outlines having all their scenarios pruned by a tag filter.
    #[must_use]
    pub fn skipped_outlines(&self) -> &[ScenarioOutline] {
        &self.skipped_outlines
    }

    /// Executed pure scenarios whose last attempt passed.
    pub fn passed_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.passed_scenarios.iter().filter_map(|i| self.scenarios.get(*i))
    }

    /// Executed pure scenarios whose last attempt failed.
    pub fn failed_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.failed_scenarios.iter().filter_map(|i| self.scenarios.get(*i))
    }

    /// Executed outlines having all their scenarios passed.
    pub fn passed_outlines(&self) -> impl Iterator<Item = &ScenarioOutline> {
        self.passed_outlines.iter().filter_map(|i| self.outlines.get(*i))
    }

    /// Executed outlines having any of their scenarios failed.
    pub fn failed_outlines(&self) -> impl Iterator<Item = &ScenarioOutline> {
        self.failed_outlines.iter().filter_map(|i| self.outlines.get(*i))
    }

    /// Every scenario of this [`Feature`] left to execute, outline ones
    /// included, in execution order.
    pub fn all_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios
            .iter()
            .chain(self.outlines.iter().flat_map(ScenarioOutline::scenarios))
    }

    /// Time spent executing all the scenarios and outlines.
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Overall result.
    ///
    /// [`None`] until executed, unless pruned to nothing.
    #[must_use]
    pub const fn overall(&self) -> Option<Overall> {
        self.overall
    }

    /// Indicates whether anything is left to execute.
    #[must_use]
    pub fn has_runnable(&self) -> bool {
        !self.scenarios.is_empty() || !self.outlines.is_empty()
    }

    /// Executes all the pure scenarios, then all the outlines.
    ///
    /// # Errors
    ///
    /// If a hook fails or a step cannot be found in the `registry`.
    pub(crate) fn execute(
        &mut self,
        registry: &Registry,
        ctx: &mut Context,
    ) -> Result<()> {
        ctx.enter_feature(FeatureInfo {
            identifier: self.identifier.clone(),
            name: self.name.clone(),
            uri: self.uri.clone(),
            overall: None,
        });
        tracing::debug!(feature = %self.name, uri = %self.uri, "executing feature");
        registry.hooks().execute(Phase::BeforeFeature, ctx)?;

        let started = Instant::now();
        for scenario in &mut self.scenarios {
            scenario.execute(registry, ctx)?;
        }
        for outline in &mut self.outlines {
            outline.execute(registry, ctx)?;
        }
        self.duration = Some(started.elapsed());

        for (i, s) in self.scenarios.iter().enumerate() {
            if s.last_attempt().failed_steps().is_empty() {
                self.passed_scenarios.push(i);
            } else {
                self.failed_scenarios.push(i);
            }
        }
        for (i, o) in self.outlines.iter().enumerate() {
            if o.failed_scenarios().next().is_none() {
                self.passed_outlines.push(i);
            } else {
                self.failed_outlines.push(i);
            }
        }
        if self.has_runnable() {
            self.overall = Some(
                if self.failed_scenarios.is_empty()
                    && self.failed_outlines.is_empty()
                {
                    Overall::Passed
                } else {
                    Overall::Failed
                },
            );
        }

        ctx.finish_feature(self.overall);
        registry.hooks().execute(Phase::AfterFeature, ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::{
        pickle::{Pickle, PickleStep, Tags},
        step::RawKeyword,
    };

    fn pickle(name: &str, raw_name: Option<&str>, line: usize) -> Pickle {
        Pickle {
            feature_name: "Accounts".into(),
            name: name.into(),
            raw_name: raw_name.map(Into::into),
            language: "en".into(),
            examples_name: None,
            uri: "accounts.feature".into(),
            line,
            outline_line: raw_name.map(|_| line / 10),
            tags: Tags::default(),
            steps: vec![PickleStep {
                keyword: RawKeyword::Given,
                text: name.into(),
                raw_text: None,
                argument: None,
                line,
            }],
        }
    }

    fn document(pickles: Vec<Pickle>) -> Document {
        Document { uri: "accounts.feature".into(), pickles }
    }

    fn registry() -> Registry {
        let mut r = Registry::new();
        _ = r
            .given("fails {what}", |_, args| {
                Err(args.get("what").unwrap_or_default().to_owned())
            })
            .unwrap()
            .given("{anything}", |_, _| Ok::<_, Infallible>(()))
            .unwrap();
        r
    }

    #[test]
    fn empty_document_is_fatal() {
        let r = registry();

        assert!(matches!(
            Feature::new(&document(vec![]), r.steps()),
            Err(Error::EmptyFeature { uri }) if uri == "accounts.feature",
        ));
    }

    #[test]
    fn clusters_outlines() {
        let r = registry();
        let f = Feature::new(
            &document(vec![
                pickle("Login as admin", Some("Login as <role>"), 31),
                pickle("Plain", None, 40),
                pickle("Login as guest", Some("Login as <role>"), 32),
                pickle("Logout as admin", Some("Logout as <role>"), 51),
                pickle("Login as other", Some("Login as <role>"), 71),
            ]),
            r.steps(),
        )
        .unwrap();

        assert_eq!(f.name(), "Accounts");
        assert_eq!(f.scenarios().len(), 1);
        assert_eq!(
            f.outlines()
                .iter()
                .map(|o| (o.raw_name(), o.line(), o.scenarios().len()))
                .collect::<Vec<_>>(),
            [
                ("Login as <role>", 3, 2),
                ("Logout as <role>", 5, 1),
                ("Login as <role>", 7, 1),
            ],
        );
    }

    #[test]
    fn executes_scenarios_before_outlines() {
        let mut r = registry();
        _ = r
            .after_scenario(|ctx| {
                let name = ctx.scenario().map(|s| s.name.clone());
                let mut order = ctx
                    .get_as::<Vec<String>>("order")
                    .map_err(|e| e.to_string())?
                    .unwrap_or_default();
                order.extend(name);
                _ = ctx.set("order", order);
                Ok::<_, String>(())
            })
            .unwrap()
            .after_feature(|ctx| {
                let order = ctx
                    .get_as::<Vec<String>>("order")
                    .map_err(|e| e.to_string())?
                    .unwrap_or_default();
                if order == ["plain", "row 1", "row 2"] {
                    Ok(())
                } else {
                    Err(format!("wrong order: {order:?}"))
                }
            })
            .unwrap();
        let mut f = Feature::new(
            &document(vec![
                pickle("row 1", Some("row <n>"), 31),
                pickle("plain", None, 40),
                pickle("row 2", Some("row <n>"), 32),
            ]),
            r.steps(),
        )
        .unwrap();

        f.execute(&r, &mut Context::default()).unwrap();

        assert_eq!(f.overall(), Some(Overall::Passed));
        assert_eq!(f.passed_scenarios().count(), 1);
        assert_eq!(f.passed_outlines().count(), 1);
        assert!(f.duration().is_some());
    }

    #[test]
    fn fails_with_any_failed_outline() {
        let r = registry();
        let mut f = Feature::new(
            &document(vec![
                pickle("plain", None, 40),
                pickle("fails badly", Some("fails <how>"), 31),
                pickle("passes", Some("fails <how>"), 32),
            ]),
            r.steps(),
        )
        .unwrap();

        f.execute(&r, &mut Context::default()).unwrap();

        assert_eq!(f.overall(), Some(Overall::Failed));
        assert_eq!(f.passed_scenarios().count(), 1);
        assert_eq!(f.failed_outlines().count(), 1);
        assert_eq!(f.outlines()[0].passed_scenarios().count(), 1);
    }

    #[test]
    fn feature_hooks_see_current_feature() {
        let mut r = registry();
        _ = r
            .before_feature(|ctx| match ctx.feature() {
                Some(f) if f.uri == "accounts.feature" => Ok(()),
                _ => Err("no feature"),
            })
            .unwrap()
            .after_feature(|ctx| match ctx.feature().and_then(|f| f.overall) {
                Some(Overall::Passed) => Ok(()),
                _ => Err("not passed"),
            })
            .unwrap();
        let mut f =
            Feature::new(&document(vec![pickle("plain", None, 4)]), r.steps())
                .unwrap();

        assert!(f.execute(&r, &mut Context::default()).is_ok());
    }
}
