// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step keywords and resolution of the relative ones.

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Absolute keyword a [`Step`] is bound by.
///
/// [`Step`]: crate::Step
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
pub enum Keyword {
    /// [Given](https://cucumber.io/docs/gherkin/reference#given).
    Given,

    /// [When](https://cucumber.io/docs/gherkin/reference#when).
    When,

    /// [Then](https://cucumber.io/docs/gherkin/reference#then).
    Then,
}

/// Keyword as written in a document, relative ones included.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
pub enum RawKeyword {
    /// Absolute `Given`.
    Given,

    /// Absolute `When`.
    When,

    /// Absolute `Then`.
    Then,

    /// Relative `And`.
    And,

    /// Relative `But`.
    But,
}

impl RawKeyword {
    /// Returns the [`Keyword`] this one stands for, if it's absolute.
    #[must_use]
    pub const fn absolute(self) -> Option<Keyword> {
        match self {
            Self::Given => Some(Keyword::Given),
            Self::When => Some(Keyword::When),
            Self::Then => Some(Keyword::Then),
            Self::And | Self::But => None,
        }
    }
}

impl From<Keyword> for RawKeyword {
    fn from(k: Keyword) -> Self {
        match k {
            Keyword::Given => Self::Given,
            Keyword::When => Self::When,
            Keyword::Then => Self::Then,
        }
    }
}

/// Resolver of relative keywords, threaded through the steps of a single
/// scenario in program order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Resolver {
    last_absolute: Option<Keyword>,
}

impl Resolver {
    /// Creates a [`Resolver`] for a new scenario.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_absolute: None }
    }

    /// Resolves the `keyword` of a step with the given `text`.
    ///
    /// # Errors
    ///
    /// With [`Error::Keyword`] if a relative keyword comes before any
    /// absolute one.
    pub fn resolve(&mut self, keyword: RawKeyword, text: &str) -> Result<Keyword> {
        if let Some(k) = keyword.absolute() {
            self.last_absolute = Some(k);
            return Ok(k);
        }
        self.last_absolute.ok_or_else(|| Error::Keyword {
            keyword,
            text: text.to_owned(),
        })
    }
}
