// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`ScenarioOutline`]: scenarios sharing one `Scenario Outline` header.

use std::{
    mem,
    time::{Duration, Instant},
};

use serde::Serialize;

use crate::{
    context::Context, id::Identifier, outcome::Overall, registry::Registry,
    scenario::Scenario, Result,
};

/// Group of [`Scenario`]s generated from the same `Scenario Outline`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioOutline {
    identifier: Identifier,
    raw_name: String,
    line: usize,
    scenarios: Vec<Scenario>,
    skipped: Vec<Scenario>,
    passed: Vec<usize>,
    failed: Vec<usize>,
    duration: Option<Duration>,
    overall: Option<Overall>,
}

impl ScenarioOutline {
    /// Groups the given `scenarios` under the outline header at `line`.
    #[must_use]
    pub fn new(
        raw_name: impl Into<String>,
        line: usize,
        scenarios: Vec<Scenario>,
    ) -> Self {
        Self {
            identifier: Identifier::generate(),
            raw_name: raw_name.into(),
            line,
            scenarios,
            skipped: Vec::new(),
            passed: Vec::new(),
            failed: Vec::new(),
            duration: None,
            overall: None,
        }
    }

    /// Unique identifier of this [`ScenarioOutline`].
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Name template of the outline.
    #[must_use]
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// Line of the `Scenario Outline` header.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Scenarios left to execute, in document order.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Scenarios pruned by a tag filter.
    #[must_use]
    pub fn skipped_scenarios(&self) -> &[Scenario] {
        &self.skipped
    }

    /// Executed scenarios whose last attempt passed.
    pub fn passed_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.passed.iter().filter_map(|i| self.scenarios.get(*i))
    }

    /// Executed scenarios whose last attempt failed.
    pub fn failed_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.failed.iter().filter_map(|i| self.scenarios.get(*i))
    }

    /// Time spent executing all the scenarios.
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// [`Overall::Passed`] iff every executed scenario passed.
    #[must_use]
    pub const fn overall(&self) -> Option<Overall> {
        self.overall
    }

    /// Indicates whether every scenario of this outline has been pruned.
    #[must_use]
    pub fn is_fully_skipped(&self) -> bool {
        self.scenarios.is_empty() && !self.skipped.is_empty()
    }

    /// Moves the scenarios not satisfying the `keep` predicate to the
    /// skipped ones.
    ///
    /// Returns whether this outline became fully skipped.
    pub(crate) fn prune(&mut self, keep: impl Fn(&Scenario) -> bool) -> bool {
        let (kept, mut rejected): (Vec<_>, Vec<_>) =
            mem::take(&mut self.scenarios)
                .into_iter()
                .partition(|s| keep(s));
        for s in &mut rejected {
            s.skip();
        }
        self.scenarios = kept;
        self.skipped.append(&mut rejected);

        let fully_skipped = self.is_fully_skipped();
        if fully_skipped {
            self.overall = Some(Overall::Skipped);
        }
        fully_skipped
    }

    /// Executes all the remaining scenarios.
    ///
    /// # Errors
    ///
    /// If any [`Scenario`] execution fails fatally.
    pub(crate) fn execute(
        &mut self,
        registry: &Registry,
        ctx: &mut Context,
    ) -> Result<()> {
        tracing::debug!(outline = %self.raw_name, "executing scenario outline");

        let started = Instant::now();
        for scenario in &mut self.scenarios {
            scenario.execute(registry, ctx)?;
        }
        self.duration = Some(started.elapsed());

        for (i, s) in self.scenarios.iter().enumerate() {
            if s.last_attempt().failed_steps().is_empty() {
                self.passed.push(i);
            } else {
                self.failed.push(i);
            }
        }
        self.overall = Some(if self.failed.is_empty() {
            Overall::Passed
        } else {
            Overall::Failed
        });
        Ok(())
    }
}
