// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Scenario`]s and their retry loop.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::{
    context::{Context, ScenarioInfo},
    history::History,
    hook::Phase,
    id::Identifier,
    logs,
    outcome::{Overall, Status},
    pickle::{Pickle, Tags},
    registry::Registry,
    step::{self, Resolver, Step},
    Result,
};

/// Single attempt of a [`Scenario`].
///
/// Steps are referred to by their index in [`Scenario::steps()`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Attempt {
    identifier: Identifier,
    passed_steps: Vec<usize>,
    failed_steps: Vec<usize>,
    not_executed_steps: Vec<usize>,
    duration: Option<Duration>,
}

impl Attempt {
    fn new() -> Self {
        Self {
            identifier: Identifier::generate(),
            passed_steps: Vec::new(),
            failed_steps: Vec::new(),
            not_executed_steps: Vec::new(),
            duration: None,
        }
    }

    /// Unique identifier of this [`Attempt`], keying its logs.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Indices of the steps passed in this [`Attempt`].
    #[must_use]
    pub fn passed_steps(&self) -> &[usize] {
        &self.passed_steps
    }

    /// Indices of the steps failed in this [`Attempt`].
    #[must_use]
    pub fn failed_steps(&self) -> &[usize] {
        &self.failed_steps
    }

    /// Indices of the steps left unexecuted in this [`Attempt`].
    #[must_use]
    pub fn not_executed_steps(&self) -> &[usize] {
        &self.not_executed_steps
    }

    /// Time spent executing the steps.
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Indices of the steps having the given [`Status`] in this [`Attempt`].
    #[must_use]
    pub fn steps_with(&self, status: Status) -> &[usize] {
        match status {
            Status::Passed => &self.passed_steps,
            Status::Failed => &self.failed_steps,
            Status::NotExecuted => &self.not_executed_steps,
            Status::Unset => &[],
        }
    }
}

/// Executable scenario: a pure one, or a single example of an outline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scenario {
    feature_name: String,
    name: String,
    raw_name: Option<String>,
    language: String,
    examples_name: Option<String>,
    uri: String,
    line: usize,
    line_in_file: usize,
    tags: Tags,
    steps: Vec<Step>,
    attempts: History<Attempt>,
    overall: Option<Overall>,
}

impl Scenario {
    /// Builds a [`Scenario`] out of a [`Pickle`], binding all its steps.
    ///
    /// # Errors
    ///
    /// See [`Step::new()`].
    pub fn new(pickle: &Pickle, steps: &step::Collection) -> Result<Self> {
        let mut resolver = Resolver::new();
        let steps = pickle
            .steps
            .iter()
            .map(|s| Step::new(s, &mut resolver, steps))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            feature_name: pickle.feature_name.clone(),
            name: pickle.name.clone(),
            raw_name: pickle.raw_name.clone(),
            language: pickle.language.clone(),
            examples_name: pickle.examples_name.clone(),
            uri: pickle.uri.clone(),
            line: pickle.line,
            line_in_file: pickle.line_in_file(),
            tags: pickle.tags.clone().deduplicated(),
            steps,
            attempts: History::new(Attempt::new()),
            overall: None,
        })
    }

    /// Name of the owning feature.
    #[must_use]
    pub fn feature_name(&self) -> &str {
        &self.feature_name
    }

    /// Example-resolved name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outline name template, for scenarios of outlines.
    #[must_use]
    pub fn raw_name(&self) -> Option<&str> {
        self.raw_name.as_deref()
    }

    /// Indicates whether this [`Scenario`] comes from an outline.
    #[must_use]
    pub const fn is_from_outline(&self) -> bool {
        self.raw_name.is_some()
    }

    /// Language of the source document.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Name of the `Examples` table, for scenarios of outlines.
    #[must_use]
    pub fn examples_name(&self) -> Option<&str> {
        self.examples_name.as_deref()
    }

    /// URI of the source document.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Line of the scenario, or of the examples row for outlines.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Line identifying the scenario: the outline header for outlines.
    #[must_use]
    pub const fn line_in_file(&self) -> usize {
        self.line_in_file
    }

    /// Tags split by level.
    #[must_use]
    pub const fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Steps, in program order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// All the attempts, oldest first.
    #[must_use]
    pub const fn attempts(&self) -> &History<Attempt> {
        &self.attempts
    }

    /// Current attempt.
    #[must_use]
    pub fn last_attempt(&self) -> &Attempt {
        self.attempts.last()
    }

    /// Index of the current attempt.
    #[must_use]
    pub fn repeat_count(&self) -> usize {
        self.attempts.repeat_count()
    }

    /// Steps having the given [`Status`] in the last attempt.
    pub fn last_steps(&self, status: Status) -> impl Iterator<Item = &Step> {
        self.last_attempt()
            .steps_with(status)
            .iter()
            .filter_map(|i| self.steps.get(*i))
    }

    /// Overall result: of the last attempt, or [`Overall::Skipped`] if
    /// pruned.
    #[must_use]
    pub const fn overall(&self) -> Option<Overall> {
        self.overall
    }

    pub(crate) fn skip(&mut self) {
        self.overall = Some(Overall::Skipped);
    }

    fn info(&self) -> ScenarioInfo {
        ScenarioInfo {
            identifier: self.last_attempt().identifier.clone(),
            attempt: self.repeat_count(),
            name: self.name.clone(),
            feature_name: self.feature_name.clone(),
            tags: self.tags.clone(),
            overall: None,
        }
    }

    /// Executes this [`Scenario`], retrying it while it fails and the
    /// [`Options::failed_repeat_count`] allows.
    ///
    /// Every attempt is kept.
    ///
    /// # Errors
    ///
    /// If a hook fails or a step cannot be found in the `registry`.
    ///
    /// [`Options::failed_repeat_count`]: crate::context::Options::failed_repeat_count
    pub(crate) fn execute(
        &mut self,
        registry: &Registry,
        ctx: &mut Context,
    ) -> Result<()> {
        self.execute_attempt(registry, ctx)?;
        while self.overall == Some(Overall::Failed)
            && self.repeat_count() < ctx.options().failed_repeat_count
        {
            for step in &mut self.steps {
                step.increment();
            }
            self.attempts.push(Attempt::new());
            tracing::debug!(
                scenario = %self.name,
                attempt = self.repeat_count(),
                "retrying failed scenario",
            );
            self.execute_attempt(registry, ctx)?;
        }
        Ok(())
    }

    fn execute_attempt(
        &mut self,
        registry: &Registry,
        ctx: &mut Context,
    ) -> Result<()> {
        ctx.enter_scenario(self.info());
        registry.hooks().execute(Phase::BeforeScenario, ctx)?;

        let started = Instant::now();
        {
            let span = tracing::info_span!(
                logs::SPAN_NAME,
                scenario_id = %self.last_attempt().identifier,
            );
            let _entered = span.enter();
            tracing::debug!(scenario = %self.name, "executing scenario");

            let mut failed = false;
            for step in &mut self.steps {
                if failed {
                    step.skip();
                    continue;
                }
                step.execute(registry, ctx)?;
                failed = step.status() == Status::Failed;
            }
        }

        let attempt = self.attempts.last_mut();
        for (i, step) in self.steps.iter().enumerate() {
            match step.status() {
                Status::Passed => attempt.passed_steps.push(i),
                Status::Failed => attempt.failed_steps.push(i),
                Status::NotExecuted | Status::Unset => {
                    attempt.not_executed_steps.push(i);
                }
            }
        }
        attempt.duration = Some(started.elapsed());
        let overall = if attempt.failed_steps.is_empty() {
            Overall::Passed
        } else {
            Overall::Failed
        };
        self.overall = Some(overall);

        ctx.finish_scenario(overall);
        registry.hooks().execute(Phase::AfterScenario, ctx)
    }
}
