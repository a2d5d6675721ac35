// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Results of executed entities.

use std::{any, fmt, time::Duration};

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

use crate::panic_trap::PanicDetails;

/// Status of a single [`Step`] attempt.
///
/// [`Step`]: crate::Step
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Attempt hasn't been executed yet.
    #[display("unset")]
    Unset,

    /// Step handler returned successfully.
    #[display("passed")]
    Passed,

    /// Step handler failed.
    #[display("failed")]
    Failed,

    /// Attempt was short-circuited by an earlier failure.
    #[display("not_executed")]
    NotExecuted,
}

/// Overall result of a [`Scenario`], [`ScenarioOutline`] or [`Feature`].
///
/// [`Feature`]: crate::Feature
/// [`Scenario`]: crate::Scenario
/// [`ScenarioOutline`]: crate::ScenarioOutline
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Overall {
    /// Everything passed.
    #[display("passed")]
    Passed,

    /// At least one failure.
    #[display("failed")]
    Failed,

    /// Pruned by tags and never executed.
    #[display("skipped")]
    Skipped,
}

/// Captured failure of a step handler (or a hook).
#[derive(Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[display("{name}: {}", args.first().map_or("", String::as_str))]
pub struct Failure {
    /// Type name of the error (`panic` for panics).
    pub name: String,

    /// Arguments of the error, the first one being its message.
    pub args: Vec<String>,

    /// Formatted trace of the error.
    pub trace: String,
}

impl Failure {
    /// Name recorded for panicking handlers.
    pub const PANIC: &'static str = "panic";

    /// Captures the given error returned by a handler.
    #[must_use]
    pub fn from_error<E>(err: &E) -> Self
    where
        E: fmt::Debug + fmt::Display + ?Sized,
    {
        Self {
            name: short_type_name(any::type_name::<E>()),
            args: vec![err.to_string()],
            trace: format!("{err:?}"),
        }
    }

    /// Captures the given panic of a handler.
    #[must_use]
    pub fn from_panic(details: PanicDetails) -> Self {
        let trace = format!("panicked at {}:\n{}", details.location, details.payload);
        Self {
            name: Self::PANIC.to_owned(),
            args: vec![details.payload],
            trace,
        }
    }

    /// First argument of the error, used to group failures by root cause.
    #[must_use]
    pub fn first_arg(&self) -> &str {
        self.args.first().map_or("", String::as_str)
    }
}

/// Strips module paths from a fully qualified type name, keeping generics
/// readable: `std::io::error::Error` becomes `Error`.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for c in full.chars() {
        match c {
            '<' | '>' | ',' | ' ' | '&' | '(' | ')' | '[' | ']' | ';' => {
                out.push_str(segment.rsplit("::").next().unwrap_or_default());
                segment.clear();
                out.push(c);
            }
            _ => segment.push(c),
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or_default());
    out
}

/// Tagged outcome of a single [`Step`] attempt.
///
/// [`Step`]: crate::Step
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Not executed yet.
    #[default]
    Unset,

    /// Handler returned successfully.
    Passed,

    /// Handler failed.
    Failed(Failure),

    /// Skipped because an earlier step of the same attempt failed.
    NotExecuted,
}

impl Outcome {
    /// [`Status`] of this [`Outcome`].
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Unset => Status::Unset,
            Self::Passed => Status::Passed,
            Self::Failed(_) => Status::Failed,
            Self::NotExecuted => Status::NotExecuted,
        }
    }

    /// [`Failure`] of this [`Outcome`], if it's a failed one.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(f) => Some(f),
            Self::Unset | Self::Passed | Self::NotExecuted => None,
        }
    }
}

/// Result of a single [`Step`] attempt.
///
/// [`Step`]: crate::Step
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StepResult {
    /// Tagged outcome.
    pub outcome: Outcome,

    /// Time spent in the step handler.
    pub duration: Option<Duration>,
}

impl StepResult {
    /// Shortcut for [`Outcome::status()`].
    #[must_use]
    pub const fn status(&self) -> Status {
        self.outcome.status()
    }

    /// Shortcut for [`Outcome::failure()`].
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        self.outcome.failure()
    }

    /// Time spent in the step handler, in nanoseconds.
    #[must_use]
    pub fn duration_nanos(&self) -> Option<u128> {
        self.duration.map(|d| d.as_nanos())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn captures_error_type_and_message() {
        let err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let failure = Failure::from_error(&err);

        assert_eq!(failure.name, "Error");
        assert_eq!(failure.first_arg(), "disk on fire");
        assert!(failure.trace.contains("disk on fire"));
        assert_eq!(failure.to_string(), "Error: disk on fire");
    }

    #[test]
    fn shortens_generic_type_names() {
        assert_eq!(
            short_type_name("alloc::boxed::Box<dyn core::error::Error>"),
            "Box<dyn Error>",
        );
        assert_eq!(short_type_name("anyhow::Error"), "Error");
        assert_eq!(short_type_name("u8"), "u8");
    }

    #[test]
    fn captures_panics() {
        let failure = Failure::from_panic(PanicDetails {
            payload: "assertion failed".into(),
            location: "src/steps.rs:10:5".into(),
        });

        assert_eq!(failure.name, Failure::PANIC);
        assert_eq!(failure.first_arg(), "assertion failed");
        assert!(failure.trace.contains("src/steps.rs:10:5"));
    }

    #[test]
    fn outcome_maps_to_status() {
        assert_eq!(Outcome::default().status(), Status::Unset);
        assert_eq!(Outcome::Passed.status(), Status::Passed);
        assert_eq!(Outcome::NotExecuted.status(), Status::NotExecuted);
        assert!(Outcome::Passed.failure().is_none());

        let failed = Outcome::Failed(Failure {
            name: "E".into(),
            args: vec![],
            trace: String::new(),
        });
        assert_eq!(failed.status(), Status::Failed);
        assert_eq!(failed.failure().map(Failure::first_arg), Some(""));
    }
}
