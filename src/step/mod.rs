// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Executable [`Step`]s and everything needed to bind them to handlers.
//!
//! - [`collection`]: step definitions and binding of step texts;
//! - [`keyword`]: absolute and relative keywords;
//! - [`pattern`]: step text patterns with named placeholders;
//! - [`table`]: data tables keyed by their header.

pub mod collection;
pub mod keyword;
pub mod pattern;
pub mod table;

use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};

use crate::{
    attachment::Attachment,
    context::{Context, StepInfo},
    history::History,
    hook::Phase,
    id::Identifier,
    outcome::{Failure, Outcome, Status, StepResult},
    panic_trap,
    pickle::{Argument, PickleStep},
    registry::Registry,
    Error, Result,
};

pub use self::{
    collection::{Binding, Collection, Definition, Handler},
    keyword::{Keyword, RawKeyword, Resolver},
    pattern::{Args, Pattern},
    table::{DataTable, Row},
};

/// Multiline string argument of a [`Step`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Docstring {
    /// Declared media type.
    pub content_type: Option<String>,

    /// Content.
    pub content: String,
}

/// Single attempt of a [`Step`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attempt {
    identifier: Identifier,
    result: StepResult,
    attachments: Vec<Attachment>,
}

impl Attempt {
    fn new() -> Self {
        Self {
            identifier: Identifier::generate(),
            result: StepResult::default(),
            attachments: Vec::new(),
        }
    }

    /// Unique identifier of this [`Attempt`].
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Result of this [`Attempt`].
    #[must_use]
    pub const fn result(&self) -> &StepResult {
        &self.result
    }

    /// Evidence attached during this [`Attempt`], in attachment order.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }
}

/// Executable step of a [`Scenario`], bound to a handler at construction.
///
/// [`Scenario`]: crate::Scenario
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Step {
    keyword: Keyword,
    raw_keyword: RawKeyword,
    text: String,
    raw_text: Option<String>,
    line: usize,
    docstring: Option<Docstring>,
    docstring_json: Option<serde_json::Value>,
    data_table: Option<DataTable>,
    binding: Binding,
    attempts: History<Attempt>,
}

impl Step {
    /// Builds a [`Step`] out of its [`PickleStep`], resolving its keyword
    /// with the `resolver` of the enclosing scenario and binding it against
    /// the given step definitions.
    ///
    /// # Errors
    ///
    /// - [`Error::Docstring`] if a `json` docstring doesn't parse;
    /// - [`Error::Keyword`] if a relative keyword has nothing to resolve to;
    /// - [`Error::StepNotFound`] if no definition matches.
    pub fn new(
        raw: &PickleStep,
        resolver: &mut Resolver,
        steps: &Collection,
    ) -> Result<Self> {
        let (docstring, data_table) = match &raw.argument {
            Some(Argument::DocString { content_type, content }) => (
                Some(Docstring {
                    content_type: content_type.clone(),
                    content: content.clone(),
                }),
                None,
            ),
            Some(Argument::DataTable { rows }) => {
                (None, Some(DataTable::from_rows(rows)))
            }
            None => (None, None),
        };
        let docstring_json = docstring
            .as_ref()
            .filter(|d| d.content_type.as_deref() == Some("json"))
            .map(|d| serde_json::from_str(&d.content))
            .transpose()
            .map_err(|source| Error::Docstring {
                step: raw.text.clone(),
                source,
            })?;

        let keyword = resolver.resolve(raw.keyword, &raw.text)?;
        let binding = steps.bind(keyword, &raw.text)?;

        Ok(Self {
            keyword,
            raw_keyword: raw.keyword,
            text: raw.text.clone(),
            raw_text: raw.raw_text.clone(),
            line: raw.line,
            docstring,
            docstring_json,
            data_table,
            binding,
            attempts: History::new(Attempt::new()),
        })
    }

    /// Resolved keyword, never `And`/`But`.
    #[must_use]
    pub const fn keyword(&self) -> Keyword {
        self.keyword
    }

    /// Keyword as written.
    #[must_use]
    pub const fn raw_keyword(&self) -> RawKeyword {
        self.raw_keyword
    }

    /// Example-resolved text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Template text, for steps of outlines.
    #[must_use]
    pub fn raw_text(&self) -> Option<&str> {
        self.raw_text.as_deref()
    }

    /// Indicates whether this [`Step`] comes from an outline.
    #[must_use]
    pub const fn is_from_outline(&self) -> bool {
        self.raw_text.is_some()
    }

    /// Line in the source document.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Docstring, if any.
    #[must_use]
    pub const fn docstring(&self) -> Option<&Docstring> {
        self.docstring.as_ref()
    }

    /// Docstring parsed as JSON, if its type is `json`.
    #[must_use]
    pub const fn docstring_json(&self) -> Option<&serde_json::Value> {
        self.docstring_json.as_ref()
    }

    /// Data table, if any.
    #[must_use]
    pub const fn data_table(&self) -> Option<&DataTable> {
        self.data_table.as_ref()
    }

    /// [`Binding`] made at construction.
    #[must_use]
    pub const fn binding(&self) -> &Binding {
        &self.binding
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

    /// [`Status`] of the current attempt.
    #[must_use]
    pub fn status(&self) -> Status {
        self.last_attempt().result.status()
    }

    /// Starts a new attempt with a fresh identifier and no result.
    pub fn increment(&mut self) {
        self.attempts.push(Attempt::new());
    }

    /// Marks the current attempt as not executed, unless it already ran.
    pub(crate) fn skip(&mut self) {
        let result = &mut self.attempts.last_mut().result;
        if result.status() == Status::Unset {
            result.outcome = Outcome::NotExecuted;
        }
    }

    fn info(&self) -> StepInfo {
        StepInfo {
            identifier: self.last_attempt().identifier.clone(),
            keyword: self.keyword,
            text: self.text.clone(),
            docstring: self.docstring.clone(),
            docstring_json: self.docstring_json.clone(),
            data_table: self.data_table.clone(),
            outcome: Outcome::Unset,
        }
    }

    fn attach_evidence(&self, ctx: &mut Context) {
        if let Some(json) = &self.docstring_json {
            ctx.attach(Attachment::plaintext(
                format!("{json:#}"),
                "docstring.json",
                Some("step docstring parsed as JSON".to_owned()),
            ));
        } else if let Some(d) = &self.docstring {
            let description = d.content_type.as_ref().map_or_else(
                || "step docstring".to_owned(),
                |ty| format!("step docstring (unsupported type '{ty}')"),
            );
            ctx.attach(Attachment::plaintext(
                d.content.clone(),
                "docstring.txt",
                Some(description),
            ));
        }
        if let Some(table) = &self.data_table {
            ctx.attach(Attachment::plaintext(
                table.to_json_pretty(),
                "data_table.json",
                Some("data table parsed as JSON".to_owned()),
            ));
        }
    }

    /// Executes the current attempt: `before_step` hook, evidence, handler,
    /// `after_step` hook.
    ///
    /// A failing handler is recorded, never propagated.
    ///
    /// # Errors
    ///
    /// If a hook fails or the `registry` has no definition for the
    /// [`Binding`] of this [`Step`].
    pub(crate) fn execute(
        &mut self,
        registry: &Registry,
        ctx: &mut Context,
    ) -> Result<()> {
        let handler = Arc::clone(registry.steps().definition(&self.binding)?.handler());

        ctx.enter_step(self.info());
        registry.hooks().execute(Phase::BeforeStep, ctx)?;
        self.attach_evidence(ctx);

        tracing::trace!(
            step = %self.text,
            pattern = %self.binding.pattern,
            args = %self.binding.args,
            "executing step",
        );
        let args = &self.binding.args;
        let started = Instant::now();
        let outcome = match panic_trap::run(|| handler(ctx, args)) {
            Ok(Ok(())) => Outcome::Passed,
            Ok(Err(failure)) => Outcome::Failed(failure),
            Err(panic) => Outcome::Failed(Failure::from_panic(panic)),
        };
        let duration = started.elapsed();
        if let Some(failure) = outcome.failure() {
            tracing::error!(
                step = %self.text,
                args = %self.binding.args,
                %failure,
                "step failed\n{}",
                failure.trace,
            );
        }

        ctx.finish_step(outcome.clone());
        let after = registry.hooks().execute(Phase::AfterStep, ctx);

        let attempt = self.attempts.last_mut();
        attempt.result = StepResult { outcome, duration: Some(duration) };
        attempt.attachments.extend(ctx.take_attachments());
        ctx.leave_step();
        after
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use serde_json::json;

    use super::*;
    use crate::context::Options;

    fn pickle_step(keyword: RawKeyword, text: &str) -> PickleStep {
        PickleStep {
            keyword,
            text: text.into(),
            raw_text: None,
            argument: None,
            line: 1,
        }
    }

    fn registry() -> Registry {
        let mut r = Registry::new();
        _ = r
            .given("a body", |ctx, _| {
                ctx.attach_plaintext("handler log", None, None)
            })
            .unwrap()
            .given("a table", |_, _| Ok::<_, Infallible>(()))
            .unwrap()
            .when("it breaks with {reason}", |_, args| {
                Err(args.get("reason").unwrap_or_default().to_owned())
            })
            .unwrap()
            .then("it panics", |_, _| -> std::result::Result<(), Infallible> {
                panic!("boom")
            })
            .unwrap();
        r
    }

    #[test]
    fn keeps_attempt_arrays_aligned() {
        let r = registry();
        let mut step = Step::new(
            &pickle_step(RawKeyword::Given, "a table"),
            &mut Resolver::new(),
            r.steps(),
        )
        .unwrap();
        assert_eq!(step.attempts().len(), step.repeat_count() + 1);

        step.increment();
        step.increment();

        assert_eq!(step.attempts().len(), 3);
        assert_eq!(step.repeat_count(), 2);
        let ids = step
            .attempts()
            .iter()
            .map(|a| a.identifier().clone())
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(ids.len(), 3);
        assert!(step.attempts().iter().all(|a| a.attachments().is_empty()));
        assert_eq!(step.status(), Status::Unset);
    }

    #[test]
    fn fails_on_malformed_json_docstring() {
        let r = registry();
        let mut raw = pickle_step(RawKeyword::Given, "a body");
        raw.argument = Some(Argument::DocString {
            content_type: Some("json".into()),
            content: "{not json".into(),
        });

        assert!(matches!(
            Step::new(&raw, &mut Resolver::new(), r.steps()),
            Err(Error::Docstring { .. }),
        ));
    }

    #[test]
    fn records_passed_step_with_evidence() {
        let r = registry();
        let mut raw = pickle_step(RawKeyword::Given, "a body");
        raw.argument = Some(Argument::DocString {
            content_type: Some("json".into()),
            content: r#"{"name": "alice"}"#.into(),
        });
        let mut step = Step::new(&raw, &mut Resolver::new(), r.steps()).unwrap();
        let mut ctx = Context::new(Options::default());

        step.execute(&r, &mut ctx).unwrap();

        let attempt = step.last_attempt();
        assert_eq!(attempt.result().status(), Status::Passed);
        assert!(attempt.result().duration.is_some());
        assert_eq!(step.docstring_json(), Some(&json!({"name": "alice"})));
        assert_eq!(
            attempt
                .attachments()
                .iter()
                .map(Attachment::filename)
                .collect::<Vec<_>>(),
            ["docstring.json", format!("{}-1.txt", attempt.identifier()).as_str()],
        );
        assert!(ctx.step().is_none());
    }

    #[test]
    fn attaches_plain_docstring_and_table() {
        let r = registry();
        let mut raw = pickle_step(RawKeyword::Given, "a table");
        raw.argument = Some(Argument::DataTable {
            rows: vec![vec!["k".into()], vec!["v".into()]],
        });
        let mut step = Step::new(&raw, &mut Resolver::new(), r.steps()).unwrap();

        step.execute(&r, &mut Context::default()).unwrap();

        let attachment = &step.last_attempt().attachments()[0];
        assert_eq!(attachment.filename(), "data_table.json");
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(attachment.data()).unwrap(),
            json!([{"k": "v"}]),
        );
    }

    #[test]
    fn records_failures_without_propagating() {
        let r = registry();
        let mut resolver = Resolver::new();
        let mut failing = Step::new(
            &pickle_step(RawKeyword::When, "it breaks with no disk"),
            &mut resolver,
            r.steps(),
        )
        .unwrap();
        let mut panicking = Step::new(
            &pickle_step(RawKeyword::Then, "it panics"),
            &mut resolver,
            r.steps(),
        )
        .unwrap();
        let mut ctx = Context::default();

        failing.execute(&r, &mut ctx).unwrap();
        panicking.execute(&r, &mut ctx).unwrap();

        let failure = failing.last_attempt().result().failure().unwrap();
        assert_eq!(failure.name, "String");
        assert_eq!(failure.first_arg(), "no disk");
        let failure = panicking.last_attempt().result().failure().unwrap();
        assert_eq!(failure.name, Failure::PANIC);
        assert_eq!(failure.first_arg(), "boom");
    }

    type HookResult = std::result::Result<(), &'static str>;

    fn record(ctx: &mut Context, event: String) {
        let mut events = ctx
            .get_as::<Vec<String>>("events")
            .ok()
            .flatten()
            .unwrap_or_default();
        events.push(event);
        _ = ctx.set("events", events);
    }

    #[test]
    fn brackets_handler_with_step_hooks() {
        let mut r = registry();
        _ = r
            .before_step(|ctx: &mut Context| -> HookResult {
                let step = ctx.step().ok_or("no current step")?;
                let event =
                    format!("before {} {:?}", step.text, step.outcome.status());
                record(ctx, event);
                Ok(())
            })
            .unwrap()
            .after_step(|ctx: &mut Context| -> HookResult {
                let step = ctx.step().ok_or("no current step")?;
                let event =
                    format!("after {} {:?}", step.text, step.outcome.status());
                record(ctx, event);
                Ok(())
            })
            .unwrap();
        let mut step = Step::new(
            &pickle_step(RawKeyword::When, "it breaks with disk"),
            &mut Resolver::new(),
            r.steps(),
        )
        .unwrap();
        let mut ctx = Context::default();

        step.execute(&r, &mut ctx).unwrap();

        assert_eq!(step.status(), Status::Failed);
        assert_eq!(
            ctx.get_as::<Vec<String>>("events").unwrap().unwrap(),
            [
                "before it breaks with disk Unset",
                "after it breaks with disk Failed",
            ],
        );
        assert!(ctx.step().is_none());
    }

    #[test]
    fn skips_only_unexecuted_attempts() {
        let r = registry();
        let mut step = Step::new(
            &pickle_step(RawKeyword::Given, "a table"),
            &mut Resolver::new(),
            r.steps(),
        )
        .unwrap();

        step.execute(&r, &mut Context::default()).unwrap();
        step.skip();
        assert_eq!(step.status(), Status::Passed);

        step.increment();
        step.skip();
        assert_eq!(step.status(), Status::NotExecuted);
    }

    #[test]
    fn unknown_binding_in_worker_registry_is_fatal() {
        let r = registry();
        let mut step = Step::new(
            &pickle_step(RawKeyword::Given, "a table"),
            &mut Resolver::new(),
            r.steps(),
        )
        .unwrap();

        assert!(matches!(
            step.execute(&Registry::new(), &mut Context::default()),
            Err(Error::StepNotFound { .. }),
        ));
    }
}
