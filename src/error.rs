// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fatal errors of a run.
//!
//! Everything in here aborts the run before (or instead of) producing a
//! [`Summary`]. Failures of step handlers are *not* errors: they're recorded
//! as an [`Outcome::Failed`] on the executed [`Step`] instead.
//!
//! [`Outcome::Failed`]: crate::Outcome::Failed
//! [`Step`]: crate::Step
//! [`Summary`]: crate::Summary

use std::{io, path::PathBuf};

use derive_more::{Display, Error, From};

use crate::{
    hook::Phase,
    outcome::Failure,
    step::{Keyword, RawKeyword},
};

/// Result of a fallible engine operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error terminating the whole run.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Document compiled into zero pickles.
    #[display("Empty feature is not allowed: {uri}")]
    EmptyFeature {
        /// URI of the empty document.
        #[error(not(source))]
        uri: String,
    },

    /// Docstring declared as `json` doesn't hold valid JSON.
    #[display("Docstring of step `{step}` is not valid JSON: {source}")]
    Docstring {
        /// Text of the offending step.
        step: String,

        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// `And`/`But` used before any `Given`/`When`/`Then` in a scenario.
    #[display("Use of `{keyword}` keyword without context: {text}")]
    Keyword {
        /// Relative keyword being resolved.
        keyword: RawKeyword,

        /// Text of the offending step.
        text: String,
    },

    /// No step definition matches the step text.
    #[display("Could not find any step definition for step `{keyword} {text}`")]
    StepNotFound {
        /// Resolved keyword of the step.
        keyword: Keyword,

        /// Text of the step.
        text: String,
    },

    /// Second handler registered for a single-slot hook.
    #[display("Cannot register `{phase}` hook twice")]
    Singleton {
        /// Phase of the hook.
        #[error(not(source))]
        phase: Phase,
    },

    /// Step pattern cannot be registered.
    #[display("Invalid step pattern `{pattern}`: {reason}")]
    Pattern {
        /// Offending pattern.
        pattern: String,

        /// What's wrong with it.
        reason: String,
    },

    /// Hook handler failed.
    #[display("`{phase}` hook failed: {failure}")]
    Hook {
        /// Phase of the failed hook.
        phase: Phase,

        /// Captured failure.
        failure: Failure,
    },

    /// Attachment API used outside of a step execution.
    #[display("No step is being executed")]
    NoCurrentStep,

    /// Attempt to attach empty plaintext data.
    #[display("Cannot attach empty data")]
    EmptyAttachment,

    /// Worker terminated without handing its [`Feature`] back.
    ///
    /// [`Feature`]: crate::Feature
    #[display("Worker executing feature `{feature}` terminated abnormally")]
    WorkerLost {
        /// Name of the lost feature.
        #[error(not(source))]
        feature: String,
    },

    /// `.feature` file cannot be parsed.
    #[display("Failed to parse feature file: {_0}")]
    #[from]
    Parse(gherkin::ParseFileError),

    /// Directory of `.feature` files cannot be walked.
    #[display("Failed to walk feature files: {_0}")]
    #[from]
    Glob(globwalk::GlobError),

    /// Path given for loading is a file without the `.feature` extension.
    #[display("Not a `.feature` file: {}", path.display())]
    NotAFeatureFile {
        /// Offending path.
        #[error(not(source))]
        path: PathBuf,
    },

    /// I/O failure.
    #[display("I/O operation failed: {_0}")]
    #[from]
    Io(io::Error),
}

impl Error {
    /// Indicates whether this [`Error`] happened while building the run,
    /// before any step could be executed.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::EmptyFeature { .. }
                | Self::Docstring { .. }
                | Self::Keyword { .. }
                | Self::StepNotFound { .. }
                | Self::Singleton { .. }
                | Self::Pattern { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_not_found_step() {
        let err = Error::StepNotFound {
            keyword: Keyword::Given,
            text: "a user which exists".into(),
        };

        assert_eq!(
            err.to_string(),
            "Could not find any step definition for step \
             `Given a user which exists`",
        );
        assert!(err.is_construction());
    }

    #[test]
    fn converts_io_errors() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();

        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_construction());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn keeps_json_error_as_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::Docstring { step: "a body".into(), source };

        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("Docstring of step `a body`"));
    }
}
