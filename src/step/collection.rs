// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Collection`] of step definitions and binding of step texts to them.

use std::{fmt, sync::Arc};

use derive_more::with_trait::Debug;
use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};

use crate::{context::Context, outcome::Failure, Error};

use super::{
    pattern::{Args, Pattern},
    Keyword,
};

/// Type-erased step handler.
pub type Handler = Arc<dyn Fn(&mut Context, &Args) -> Result<(), Failure>>;

/// Single registered step definition.
#[derive(Clone, Debug)]
pub struct Definition {
    pattern: Pattern,

    #[debug("{:p}", Arc::as_ptr(handler))]
    handler: Handler,
}

impl Definition {
    /// [`Pattern`] of this [`Definition`].
    #[must_use]
    pub const fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Handler of this [`Definition`].
    #[must_use]
    pub const fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Result of binding a step text to a [`Definition`].
///
/// Holds no handler, only what's needed to find it again in another
/// [`Collection`] populated the same way, so it may cross thread boundaries.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Binding {
    /// Keyword the step was bound by.
    pub keyword: Keyword,

    /// Source of the bound [`Pattern`].
    pub pattern: String,

    /// Arguments extracted from the step text.
    pub args: Args,
}

/// Step definitions, one ordered table per [`Keyword`].
#[derive(Clone, Debug, Default)]
pub struct Collection {
    given: LinkedHashMap<String, Definition>,
    when: LinkedHashMap<String, Definition>,
    then: LinkedHashMap<String, Definition>,
}

impl Collection {
    /// Creates an empty [`Collection`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    const fn table(&self, keyword: Keyword) -> &LinkedHashMap<String, Definition> {
        match keyword {
            Keyword::Given => &self.given,
            Keyword::When => &self.when,
            Keyword::Then => &self.then,
        }
    }

    fn table_mut(
        &mut self,
        keyword: Keyword,
    ) -> &mut LinkedHashMap<String, Definition> {
        match keyword {
            Keyword::Given => &mut self.given,
            Keyword::When => &mut self.when,
            Keyword::Then => &mut self.then,
        }
    }

    /// Registers the `handler` for steps of the given `keyword` matching the
    /// `pattern`.
    ///
    /// `params` are the names of the arguments the `handler` reads; [`None`]
    /// means all the placeholders of the `pattern`. Registering an already
    /// known `pattern` replaces its handler, keeping its priority.
    ///
    /// # Errors
    ///
    /// With [`Error::Pattern`] if the `pattern` is malformed or `params` are
    /// not a subset of its placeholders.
    pub fn add<F, E>(
        &mut self,
        keyword: Keyword,
        pattern: &str,
        params: Option<&[&str]>,
        handler: F,
    ) -> crate::Result<()>
    where
        F: Fn(&mut Context, &Args) -> Result<(), E> + 'static,
        E: fmt::Debug + fmt::Display + 'static,
    {
        let pattern = Pattern::new(pattern)?;
        if let Some(unknown) = params.unwrap_or_default().iter().find(|p| {
            !pattern.placeholders().iter().any(|name| name.as_str() == **p)
        }) {
            return Err(Error::Pattern {
                pattern: pattern.as_str().to_owned(),
                reason: format!("handler parameter `{unknown}` is not a placeholder"),
            });
        }

        let handler: Handler = Arc::new(move |ctx: &mut Context, args: &Args| {
            handler(ctx, args).map_err(|e| Failure::from_error(&e))
        });
        let table = self.table_mut(keyword);
        if let Some(existing) = table.get_mut(pattern.as_str()) {
            existing.handler = handler;
        } else {
            _ = table.insert(
                pattern.as_str().to_owned(),
                Definition { pattern, handler },
            );
        }
        Ok(())
    }

    /// Binds the step `text` of the given `keyword`.
    ///
    /// An exact textual match of a registered pattern wins, otherwise the
    /// first registered pattern matching the `text` does.
    ///
    /// # Errors
    ///
    /// With [`Error::StepNotFound`] if nothing matches.
    pub fn bind(&self, keyword: Keyword, text: &str) -> crate::Result<Binding> {
        let table = self.table(keyword);
        let (def, args) = table
            .get(text)
            .map(|d| (d, Args::default()))
            .or_else(|| {
                table
                    .values()
                    .find_map(|d| d.pattern.captures(text).map(|args| (d, args)))
            })
            .ok_or_else(|| Error::StepNotFound {
                keyword,
                text: text.to_owned(),
            })?;
        tracing::trace!(%keyword, text, pattern = %def.pattern, %args, "bound step");

        Ok(Binding {
            keyword,
            pattern: def.pattern.as_str().to_owned(),
            args,
        })
    }

    /// Looks up the [`Definition`] a [`Binding`] has been made to.
    ///
    /// # Errors
    ///
    /// With [`Error::StepNotFound`] if this [`Collection`] has no such
    /// pattern registered.
    pub fn definition(&self, binding: &Binding) -> crate::Result<&Definition> {
        self.table(binding.keyword)
            .get(&binding.pattern)
            .ok_or_else(|| Error::StepNotFound {
                keyword: binding.keyword,
                text: binding.pattern.clone(),
            })
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.given.len() + self.when.len() + self.then.len()
    }

    /// Indicates whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
