// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level [`Runner`] orchestrating a whole run.
//!
//! # Order guarantees
//!
//! Steps of a scenario are executed in program order, scenarios of a
//! feature in document order (pure scenarios before outlines). Features
//! are executed concurrently, but [`Run::features()`] keeps their input
//! order.

mod dispatch;
mod filter;

use std::{num::NonZeroUsize, path::Path, process};

use derive_more::with_trait::Debug;

use crate::{
    cli,
    context::{Context, Options},
    feature::Feature,
    hook::Phase,
    logs::ScenarioLogs,
    panic_trap::QuietHook,
    parser,
    pickle::{Document, TagLevel},
    registry::{Register, Registry},
    reporter::Reporter,
    summary::Summary,
    Result,
};

pub use self::filter::{BoxedPredicate, Filters};

/// Executed run: all the [`Feature`]s, skipped ones included, in input
/// order.
#[derive(Debug)]
pub struct Run {
    features: Vec<Feature>,
    context: Context,
    logs: Option<ScenarioLogs>,
}

impl Run {
    /// All the [`Feature`]s, in input order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// [`Context`] as left by the `after_all` hook.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Per-scenario logs, if collected.
    #[must_use]
    pub const fn logs(&self) -> Option<&ScenarioLogs> {
        self.logs.as_ref()
    }

    /// Buckets the results of this [`Run`].
    #[must_use]
    pub fn summary(&self) -> Summary<'_> {
        Summary::new(&self.features)
    }
}

/// Top-level executor of [`Document`]s.
///
/// # Example
///
/// ```rust
/// use std::convert::Infallible;
///
/// use brine::{pickle::Document, Registry, Runner};
///
/// let mut runner = Runner::new(|r: &mut Registry| -> brine::Result<()> {
///     _ = r.given("a user named {name}", |ctx, args| {
///         _ = ctx.set("user", args.get("name").unwrap_or_default());
///         Ok::<_, Infallible>(())
///     })?;
///     Ok(())
/// });
///
/// let run = runner.run(Vec::<Document>::new()).unwrap();
/// assert!(run.features().is_empty());
/// ```
#[derive(Debug)]
pub struct Runner<R> {
    /// Function populating the [`Registry`] of every worker.
    #[debug(ignore)]
    register: R,

    /// [`Options`] visible from the [`Context`].
    options: Options,

    /// Number of features executed concurrently.
    parallel: NonZeroUsize,

    /// Tag filters selecting the scenarios to execute.
    filters: Filters,

    /// Indicates whether the [`Reporter`] is invoked.
    report: bool,

    /// Consumer of the executed [`Run`].
    #[debug(ignore)]
    reporter: Option<Box<dyn Reporter>>,

    /// Sink of per-scenario logs, handed over to the [`Run`].
    logs: Option<ScenarioLogs>,
}

impl<R: Register> Runner<R> {
    /// Creates a [`Runner`] populating its [`Registry`] with the given
    /// function.
    #[must_use]
    pub fn new(register: R) -> Self {
        Self {
            register,
            options: Options::default(),
            parallel: NonZeroUsize::MIN,
            filters: Filters::new(),
            report: false,
            reporter: None,
            logs: None,
        }
    }

    /// Sets the [`Options`] visible from the [`Context`].
    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Sets how many times a failed scenario is retried.
    #[must_use]
    pub fn failed_repeat_count(mut self, count: usize) -> Self {
        self.options.failed_repeat_count = count;
        self
    }

    /// Sets how many features are executed concurrently.
    #[must_use]
    pub fn parallel(mut self, parallel: NonZeroUsize) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the tag [`Filters`].
    #[must_use]
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Enables or disables reporting.
    #[must_use]
    pub fn report(mut self, enabled: bool) -> Self {
        self.report = enabled;
        self
    }

    /// Sets the [`Reporter`] invoked when reporting is enabled.
    #[must_use]
    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Hands the given per-scenario log sink over to every [`Run`].
    #[must_use]
    pub fn logs(mut self, logs: ScenarioLogs) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Configures this [`Runner`] with the given [`cli::Opts`].
    #[must_use]
    pub fn with_cli(self, opts: &cli::Opts) -> Self {
        let mut filters = Filters::new();
        if let Some(tags) = &opts.tags {
            filters = filters.tags(tags.clone());
        }
        for (level, tags) in [
            (TagLevel::Feature, &opts.feature_tags),
            (TagLevel::Scenario, &opts.scenario_tags),
            (TagLevel::Example, &opts.example_tags),
        ] {
            if let Some(tags) = tags {
                filters = filters.level(level, tags.clone());
            }
        }
        self.failed_repeat_count(opts.failed_repeat_count)
            .parallel(opts.parallel)
            .report(opts.report)
            .filters(filters)
    }

    /// Executes the given [`Document`]s.
    ///
    /// All the features are built before anything runs, so an unbound step
    /// anywhere aborts the run before the `before_all` hook.
    ///
    /// # Errors
    ///
    /// With any fatal [`Error`], no summary being produced.
    ///
    /// [`Error`]: crate::Error
    pub fn run<I>(&mut self, documents: I) -> Result<Run>
    where
        I: IntoIterator<Item = Document>,
    {
        let registry = Registry::build(&self.register)?;
        let mut features = Vec::new();
        for document in documents {
            tracing::trace!(uri = %document.uri, "building feature");
            let mut feature = Feature::new(&document, registry.steps())?;
            self.filters.apply(&mut feature);
            features.push(feature);
        }

        let (runnable, skipped): (Vec<_>, Vec<_>) = features
            .into_iter()
            .enumerate()
            .partition(|(_, f)| f.has_runnable());
        for (_, f) in &skipped {
            tracing::trace!(
                feature = f.name(),
                "feature is empty after filtering, skipping entirely",
            );
        }
        let (indices, runnable): (Vec<_>, Vec<_>) = runnable.into_iter().unzip();

        let mut ctx = Context::new(self.options);
        let executed = {
            let _quiet = QuietHook::install();
            registry.hooks().execute(Phase::BeforeAll, &mut ctx)?;
            tracing::debug!(features = runnable.len(), "executing features");
            let executed =
                dispatch::run(&self.register, &ctx, runnable, self.parallel)?;
            registry.hooks().execute(Phase::AfterAll, &mut ctx)?;
            executed
        };

        let mut features = skipped;
        features.extend(indices.into_iter().zip(executed));
        features.sort_by_key(|(i, _)| *i);
        let run = Run {
            features: features.into_iter().map(|(_, f)| f).collect(),
            context: ctx,
            logs: self.logs.clone(),
        };

        {
            let summary = run.summary();
            tracing::info!("Summary:");
            for line in summary.to_string().lines() {
                tracing::info!("  {line}");
            }
            match (&mut self.reporter, self.report) {
                (Some(reporter), true) => reporter.report(&run, &summary)?,
                (None, true) => {
                    tracing::warn!("reporting is on, but no reporter set");
                }
                (_, false) => tracing::trace!("reporting is off"),
            }
        }

        Ok(run)
    }

    /// Loads the `.feature` files found under the given `paths` and executes
    /// them.
    ///
    /// # Errors
    ///
    /// See [`parser::load()`] and [`Runner::run()`].
    pub fn run_paths<I, P>(&mut self, paths: I) -> Result<Run>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let documents = parser::load(paths)?;
        self.run(documents)
    }

    /// Loads and executes the `.feature` files found under the given
    /// `paths`, exiting the process with a non-zero code on any failure.
    pub fn run_and_exit<I, P>(&mut self, paths: I) -> Run
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        match self.run_paths(paths) {
            Ok(run) if !run.summary().has_failures() => run,
            Ok(run) => {
                let failed = run.summary().failed_scenarios.len();
                tracing::error!("{failed} scenarios failed");
                process::exit(1)
            }
            Err(e) => {
                tracing::error!("{e}");
                process::exit(2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::{Arc, Mutex},
    };

    use gherkin::tagexpr::TagOperation;

    use super::*;
    use crate::{
        outcome::Overall,
        pickle::{Pickle, PickleStep, Tags},
        step::RawKeyword,
        Error,
    };

    fn register(r: &mut Registry) -> Result<()> {
        _ = r
            .given("ok", |_, _| Ok::<_, Infallible>(()))?
            .given("fail", |_, _| Err("nope"))?
            .before_all(|ctx| {
                _ = ctx.set("started", true);
                Ok::<_, Infallible>(())
            })?
            .before_feature(|ctx| match ctx.get("started") {
                Some(_) => Ok(()),
                None => Err("before_all didn't run"),
            })?
            .after_all(|ctx| {
                _ = ctx.set("finished", true);
                Ok::<_, Infallible>(())
            })?;
        Ok(())
    }

    fn document(uri: &str, scenarios: &[(&str, &str)]) -> Document {
        Document {
            uri: uri.into(),
            pickles: scenarios
                .iter()
                .map(|(tag, step)| Pickle {
                    feature_name: uri.into(),
                    name: format!("{tag} {step}"),
                    raw_name: None,
                    language: "en".into(),
                    examples_name: None,
                    uri: uri.into(),
                    line: 1,
                    outline_line: None,
                    tags: Tags {
                        scenario: vec![(*tag).into()],
                        ..Tags::default()
                    },
                    steps: vec![PickleStep {
                        keyword: RawKeyword::Given,
                        text: (*step).into(),
                        raw_text: None,
                        argument: None,
                        line: 2,
                    }],
                })
                .collect(),
        }
    }

    #[test]
    fn runs_all_hooks_and_features() {
        let mut runner = Runner::new(register).parallel(NonZeroUsize::MIN);

        let run = runner
            .run([
                document("a", &[("@x", "ok")]),
                document("b", &[("@y", "fail")]),
            ])
            .unwrap();

        assert_eq!(run.context().get("finished"), Some(&true.into()));
        assert_eq!(run.features()[0].overall(), Some(Overall::Passed));
        assert_eq!(run.features()[1].overall(), Some(Overall::Failed));
        assert!(run.summary().has_failures());
    }

    #[test]
    fn keeps_filtered_out_features_in_place() {
        let mut runner = Runner::new(register).filters(
            Filters::new().tags("not @y".parse::<TagOperation>().unwrap()),
        );

        let run = runner
            .run([
                document("a", &[("@y", "ok")]),
                document("b", &[("@x", "ok")]),
                document("c", &[("@y", "fail"), ("@x", "ok")]),
            ])
            .unwrap();

        assert_eq!(
            run.features()
                .iter()
                .map(|f| (f.name(), f.overall()))
                .collect::<Vec<_>>(),
            [
                ("a", Some(Overall::Skipped)),
                ("b", Some(Overall::Passed)),
                ("c", Some(Overall::Passed)),
            ],
        );
        assert_eq!(run.summary().skipped_features.len(), 1);
    }

    #[test]
    fn construction_errors_abort_before_hooks() {
        let mut runner = Runner::new(register);

        let err = runner
            .run([
                document("a", &[("@x", "ok")]),
                document("b", &[("@x", "missing")]),
            ])
            .unwrap_err();

        assert!(matches!(err, Error::StepNotFound { .. }));
        assert!(err.is_construction());
    }

    struct Recorder(Arc<Mutex<Vec<usize>>>);

    impl Reporter for Recorder {
        fn report(&mut self, _: &Run, summary: &Summary<'_>) -> Result<()> {
            self.0.lock().unwrap().push(summary.passed_scenarios.len());
            Ok(())
        }
    }

    #[test]
    fn reports_only_when_enabled() {
        let reported = Arc::new(Mutex::new(Vec::new()));
        let mut runner = Runner::new(register)
            .reporter(Recorder(Arc::clone(&reported)));

        _ = runner.run([document("a", &[("@x", "ok")])]).unwrap();
        assert!(reported.lock().unwrap().is_empty());

        let mut runner = runner.report(true);
        _ = runner.run([document("a", &[("@x", "ok")])]).unwrap();
        assert_eq!(*reported.lock().unwrap(), [1]);
    }

    #[test]
    fn configures_from_cli() {
        use clap::Parser as _;

        let opts = cli::Opts::parse_from([
            "brine",
            "--scenario-tags",
            "@x",
            "--parallel",
            "3",
            "--failed-repeat-count",
            "2",
            "--report",
        ]);
        let runner = Runner::new(register).with_cli(&opts);

        assert_eq!(runner.parallel.get(), 3);
        assert_eq!(runner.options.failed_repeat_count, 2);
        assert!(runner.report);
        assert!(!runner.filters.is_empty());
    }
}
