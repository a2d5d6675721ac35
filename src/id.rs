// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Opaque identifiers of execution attempts.

use std::time::{SystemTime, UNIX_EPOCH};

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique identifier of a single attempt of a [`Step`] or a
/// [`Scenario`] (or of a [`ScenarioOutline`]/[`Feature`] instance).
///
/// Only uniqueness is guaranteed, the structure is not a part of the contract.
///
/// [`Feature`]: crate::Feature
/// [`Scenario`]: crate::Scenario
/// [`ScenarioOutline`]: crate::ScenarioOutline
/// [`Step`]: crate::Step
#[derive(
    Clone,
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
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Generates a new unique [`Identifier`].
    #[must_use]
    pub fn generate() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        Self(format!("{}{nanos}", Uuid::new_v4().simple()))
    }

    /// Returns this [`Identifier`] as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
