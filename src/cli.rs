// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI options of a test binary driving a [`Runner`].
//!
//! [`Runner`]: crate::Runner

use std::{num::NonZeroUsize, path::PathBuf};

use gherkin::tagexpr::TagOperation;
use smart_default::SmartDefault;
use tracing::Level;

use crate::logs::{self, ScenarioLogs};

pub use clap::Parser;

/// Root CLI (command line interface) of a test binary.
///
/// # Example
///
/// ```rust,no_run
/// use brine::{cli, Registry, Result, Runner};
///
/// fn register(r: &mut Registry) -> Result<()> {
///     _ = r.given("a step", |_, _| Ok::<_, std::convert::Infallible>(()))?;
///     Ok(())
/// }
///
/// let opts = cli::Opts::parsed();
/// let logs = opts.init_logs();
/// let _ = Runner::new(register)
///     .with_cli(&opts)
///     .logs(logs)
///     .run_and_exit(&opts.paths);
/// ```
#[derive(clap::Parser, Clone, Debug, SmartDefault)]
#[command(name = "brine", about = "Execute Gherkin scenarios.")]
pub struct Opts {
    /// `.feature` files or directories to execute.
    ///
    /// Defaults to the `features` directory.
    #[arg(value_name = "path")]
    pub paths: Vec<PathBuf>,

    /// Tag expression to filter scenarios by.
    ///
    /// Note: Tags from Feature, Scenario and Examples are merged together on
    /// filtering, so be careful about conflicting tags on different levels.
    #[arg(long = "tags", short = 't', value_name = "tagexpr")]
    pub tags: Option<TagOperation>,

    /// Tag expression over the `Feature` tags only.
    #[arg(long, value_name = "tagexpr")]
    pub feature_tags: Option<TagOperation>,

    /// Tag expression over the `Scenario` tags only.
    #[arg(long, value_name = "tagexpr")]
    pub scenario_tags: Option<TagOperation>,

    /// Tag expression over the `Examples` tags only.
    #[arg(long, value_name = "tagexpr")]
    pub example_tags: Option<TagOperation>,

    /// Number of features to execute concurrently.
    #[arg(long, short = 'p', value_name = "int", default_value = "1")]
    #[default(NonZeroUsize::MIN)]
    pub parallel: NonZeroUsize,

    /// Number of times a failed scenario is retried.
    #[arg(long, value_name = "int", default_value_t = 0)]
    pub failed_repeat_count: usize,

    /// Hands the executed run to the reporter.
    #[arg(long, overrides_with = "no_report")]
    pub report: bool,

    /// Doesn't hand the executed run to the reporter.
    #[arg(long, overrides_with = "report")]
    pub no_report: bool,

    /// Maximum level of the logs to output and capture.
    #[arg(long, value_name = "level", default_value = "info")]
    #[default(Level::INFO)]
    pub log_level: Level,
}

impl Opts {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the trait
    /// being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Installs the global logging subscriber with the [`Opts::log_level`].
    ///
    /// See [`logs::init()`] for details.
    #[must_use]
    pub fn init_logs(&self) -> ScenarioLogs {
        logs::init(self.log_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_no_arguments() {
        let opts = Opts::parse_from(["brine"]);
        let default = Opts::default();

        assert!(opts.paths.is_empty());
        assert_eq!(opts.parallel, default.parallel);
        assert_eq!(opts.parallel.get(), 1);
        assert_eq!(opts.failed_repeat_count, default.failed_repeat_count);
        assert_eq!(opts.log_level, default.log_level);
        assert!(!opts.report);
        assert!(opts.tags.is_none());
    }

    #[test]
    fn parses_all_options() {
        let opts = Opts::parse_from([
            "brine",
            "-t",
            "@fast and not @wip",
            "--example-tags",
            "@smoke",
            "--parallel",
            "4",
            "--failed-repeat-count",
            "3",
            "--report",
            "--log-level",
            "debug",
            "tests/features",
            "other.feature",
        ]);

        assert_eq!(
            opts.paths,
            [PathBuf::from("tests/features"), PathBuf::from("other.feature")],
        );
        assert!(opts.tags.is_some());
        assert!(opts.example_tags.is_some());
        assert!(opts.scenario_tags.is_none());
        assert_eq!(opts.parallel.get(), 4);
        assert_eq!(opts.failed_repeat_count, 3);
        assert!(opts.report);
        assert_eq!(opts.log_level, Level::DEBUG);
    }

    #[test]
    fn last_report_flag_wins() {
        let opts = Opts::parse_from(["brine", "--report", "--no-report"]);

        assert!(!opts.report);
    }

    #[test]
    fn rejects_zero_parallelism() {
        assert!(Opts::try_parse_from(["brine", "--parallel", "0"]).is_err());
    }
}
