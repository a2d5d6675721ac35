// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Pickles: flattened, example-resolved scenarios handed over by a [Gherkin]
//! compiler.
//!
//! Pickles are plain data and may be (de)serialized, so any external
//! compiler producing them as JSON can feed the engine. [`compile()`] turns a
//! parsed [`gherkin::Feature`] into pickles in-process.
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

mod compile;

use derive_more::with_trait::Display;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};

use crate::step::RawKeyword;

pub use self::compile::compile;

/// Scope a tag has been declared at.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TagLevel {
    /// Declared on a `Feature`.
    #[display("feature_level")]
    Feature,

    /// Declared on a `Scenario`, `Scenario Outline` or `Rule`.
    #[display("scenario_level")]
    Scenario,

    /// Declared on an `Examples` table.
    #[display("example_level")]
    Example,
}

impl TagLevel {
    /// All the [`TagLevel`]s, outermost first.
    pub const ALL: [Self; 3] = [Self::Feature, Self::Scenario, Self::Example];
}

/// Tags of a scenario, split by their [`TagLevel`].
///
/// Each level is an ordered sequence without duplicates.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Tags {
    /// Tags declared on the `Feature`.
    #[serde(default, rename = "feature_level")]
    pub feature: Vec<String>,

    /// Tags declared on the `Scenario` (or `Rule`).
    #[serde(default, rename = "scenario_level")]
    pub scenario: Vec<String>,

    /// Tags declared on the `Examples` table.
    #[serde(default, rename = "example_level")]
    pub example: Vec<String>,
}

impl Tags {
    /// Removes duplicates inside every level, keeping the first occurrence.
    #[must_use]
    pub fn deduplicated(self) -> Self {
        let dedup = |tags: Vec<String>| tags.into_iter().unique().collect();
        Self {
            feature: dedup(self.feature),
            scenario: dedup(self.scenario),
            example: dedup(self.example),
        }
    }

    /// Tags of the given [`TagLevel`].
    #[must_use]
    pub fn level(&self, level: TagLevel) -> &[String] {
        match level {
            TagLevel::Feature => &self.feature,
            TagLevel::Scenario => &self.scenario,
            TagLevel::Example => &self.example,
        }
    }

    /// Union of all the levels, without duplicates.
    #[must_use]
    pub fn flatten(&self) -> Vec<&str> {
        TagLevel::ALL
            .iter()
            .flat_map(|l| self.level(*l))
            .map(String::as_str)
            .unique()
            .collect()
    }
}

/// Argument of a [`PickleStep`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Argument {
    /// Multiline string.
    DocString {
        /// Declared media type (`json`, for example).
        #[serde(default, rename = "contentType")]
        content_type: Option<String>,

        /// Content of the docstring.
        content: String,
    },

    /// Data table, the first row being its header.
    DataTable {
        /// Rows of cells.
        rows: Vec<Vec<String>>,
    },
}

/// Single step of a [`Pickle`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PickleStep {
    /// Keyword as written, relative ones included.
    pub keyword: RawKeyword,

    /// Example-resolved text.
    pub text: String,

    /// Template text, present iff the step comes from an outline.
    #[serde(default)]
    pub raw_text: Option<String>,

    /// Docstring or data table, if any.
    #[serde(default)]
    pub argument: Option<Argument>,

    /// Line of the step in its document.
    #[serde(default)]
    pub line: usize,
}

/// Flattened, example-resolved representation of one scenario.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pickle {
    /// Name of the owning feature.
    pub feature_name: String,

    /// Example-resolved scenario name.
    pub name: String,

    /// Outline name template, present iff the pickle comes from an outline.
    #[serde(default)]
    pub raw_name: Option<String>,

    /// Language of the document.
    #[serde(default = "default_language")]
    pub language: String,

    /// Name of the `Examples` table the pickle is built from.
    #[serde(default)]
    pub examples_name: Option<String>,

    /// URI of the source document.
    pub uri: String,

    /// Line of the scenario (or of the examples row for outlines).
    pub line: usize,

    /// Line of the `Scenario Outline` header, for outline pickles.
    #[serde(default)]
    pub outline_line: Option<usize>,

    /// Tags split by level.
    #[serde(default)]
    pub tags: Tags,

    /// Steps, in program order.
    pub steps: Vec<PickleStep>,
}

fn default_language() -> String {
    "en".to_owned()
}

/// [`Pickle`]s of a single source document.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Document {
    /// URI of the document.
    pub uri: String,

    /// Pickles compiled from the document, in document order.
    pub pickles: Vec<Pickle>,
}

impl Document {
    /// Compiles the given [`gherkin::Feature`] into a [`Document`].
    #[must_use]
    pub fn compile(feature: &gherkin::Feature) -> Self {
        Self {
            uri: feature
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            pickles: compile(feature),
        }
    }
}

impl Pickle {
    /// Indicates whether this [`Pickle`] comes from a `Scenario Outline`.
    #[must_use]
    pub const fn is_from_outline(&self) -> bool {
        self.raw_name.is_some()
    }

    /// Line identifying the scenario in its document: the outline header for
    /// outline pickles, the scenario itself otherwise.
    #[must_use]
    pub fn line_in_file(&self) -> usize {
        if self.is_from_outline() {
            self.outline_line.unwrap_or(self.line)
        } else {
            self.line
        }
    }
}
