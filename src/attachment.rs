// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Evidence attached to a [`Step`] attempt.
//!
//! [`Step`]: crate::Step

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

/// Kind of an [`Attachment`]'s data.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// UTF-8 text.
    #[display("plaintext")]
    Plaintext,

    /// Encoded image.
    #[display("image")]
    Image,
}

/// Immutable evidence blob attached to a single [`Step`] attempt.
///
/// [`Step`]: crate::Step
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Attachment {
    kind: Kind,
    filename: String,
    data: Vec<u8>,
    description: Option<String>,
}

impl Attachment {
    /// Creates a new [`Kind::Plaintext`] [`Attachment`].
    #[must_use]
    pub fn plaintext(
        data: impl Into<String>,
        filename: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            kind: Kind::Plaintext,
            filename: filename.into(),
            data: data.into().into_bytes(),
            description,
        }
    }

    /// Creates a new [`Kind::Image`] [`Attachment`].
    #[must_use]
    pub fn image(
        data: impl Into<Vec<u8>>,
        filename: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            kind: Kind::Image,
            filename: filename.into(),
            data: data.into(),
            description,
        }
    }

    /// [`Kind`] of this [`Attachment`].
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// File name this [`Attachment`] should be rendered as.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Raw data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Data decoded as text, if it's a valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Optional human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
