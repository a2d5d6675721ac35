// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Registry`] of step definitions and hooks.
//!
//! A [`Registry`] is never shared: every worker builds its own one by running
//! the same registration function, see [`Registry::build()`].

use std::fmt;

use crate::{
    context::Context,
    hook::{Hooks, Phase},
    step::{self, Args, Keyword},
};

/// Function populating a fresh [`Registry`].
///
/// Has to be deterministic, as bindings made against one [`Registry`] are
/// resolved against others populated by the same function.
pub trait Register: Fn(&mut Registry) -> crate::Result<()> + Sync {}

impl<F> Register for F where F: Fn(&mut Registry) -> crate::Result<()> + Sync {}

/// Step definitions and hooks of a single worker.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    steps: step::Collection,
    hooks: Hooks,
}

macro_rules! step_fns {
    ($($(#[$attr:meta])* $name:ident => $keyword:ident),* $(,)?) => {$(
        $(#[$attr])*
        ///
        /// # Errors
        ///
        /// See [`step::Collection::add()`].
        pub fn $name<F, E>(&mut self, pattern: &str, handler: F) -> crate::Result<&mut Self>
        where
            F: Fn(&mut Context, &Args) -> Result<(), E> + 'static,
            E: fmt::Debug + fmt::Display + 'static,
        {
            self.steps.add(Keyword::$keyword, pattern, None, handler)?;
            Ok(self)
        }
    )*};
}

macro_rules! hook_fns {
    ($($(#[$attr:meta])* $name:ident => $phase:ident),* $(,)?) => {$(
        $(#[$attr])*
        ///
        /// # Errors
        ///
        /// With [`Error::Singleton`] if this hook is already registered.
        ///
        /// [`Error::Singleton`]: crate::Error::Singleton
        pub fn $name<F, E>(&mut self, hook: F) -> crate::Result<&mut Self>
        where
            F: Fn(&mut Context) -> Result<(), E> + 'static,
            E: fmt::Debug + fmt::Display + 'static,
        {
            self.hooks.register(Phase::$phase, hook)?;
            Ok(self)
        }
    )*};
}

impl Registry {
    /// Creates an empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Registry`] populated by the given function.
    ///
    /// # Errors
    ///
    /// If the `register` function fails.
    pub fn build<R: Register + ?Sized>(register: &R) -> crate::Result<Self> {
        let mut registry = Self::new();
        register(&mut registry)?;
        tracing::trace!(steps = registry.steps.len(), "registry populated");
        Ok(registry)
    }

    step_fns! {
        /// Registers a [Given](https://cucumber.io/docs/gherkin/reference#given)
        /// step handler.
        given => Given,

        /// Registers a [When](https://cucumber.io/docs/gherkin/reference#when)
        /// step handler.
        when => When,

        /// Registers a [Then](https://cucumber.io/docs/gherkin/reference#then)
        /// step handler.
        then => Then,
    }

    /// Registers a step handler reading only the declared `params`.
    ///
    /// # Errors
    ///
    /// With [`Error::Pattern`] if the `params` are not a subset of the
    /// `pattern` placeholders.
    ///
    /// [`Error::Pattern`]: crate::Error::Pattern
    pub fn step_with_params<F, E>(
        &mut self,
        keyword: Keyword,
        pattern: &str,
        params: &[&str],
        handler: F,
    ) -> crate::Result<&mut Self>
    where
        F: Fn(&mut Context, &Args) -> Result<(), E> + 'static,
        E: fmt::Debug + fmt::Display + 'static,
    {
        self.steps.add(keyword, pattern, Some(params), handler)?;
        Ok(self)
    }

    hook_fns! {
        /// Registers the hook running once before all the features.
        before_all => BeforeAll,

        /// Registers the hook running once after all the features.
        after_all => AfterAll,

        /// Registers the hook running before every feature.
        before_feature => BeforeFeature,

        /// Registers the hook running after every feature.
        after_feature => AfterFeature,

        /// Registers the hook running before every scenario attempt.
        before_scenario => BeforeScenario,

        /// Registers the hook running after every scenario attempt.
        after_scenario => AfterScenario,

        /// Registers the hook running before every step.
        before_step => BeforeStep,

        /// Registers the hook running after every step.
        after_step => AfterStep,
    }

    /// Registered step definitions.
    #[must_use]
    pub const fn steps(&self) -> &step::Collection {
        &self.steps
    }

    /// Registered hooks.
    #[must_use]
    pub const fn hooks(&self) -> &Hooks {
        &self.hooks
    }
}
