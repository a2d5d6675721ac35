// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Single-slot lifecycle hooks.
//!
//! Every [`Phase`] has room for exactly one handler. Hooks see the run
//! through the [`Context`], whose current feature, scenario and step are
//! updated before the corresponding `before_*` hook runs.

use std::{fmt, sync::Arc};

use derive_more::with_trait::{Debug, Display};

use crate::{context::Context, outcome::Failure, panic_trap, Error};

/// Type-erased hook handler.
pub type Hook = Arc<dyn Fn(&mut Context) -> Result<(), Failure>>;

/// Boundary a [`Hook`] is executed at.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Phase {
    /// Once, before any feature is dispatched.
    #[display("before_all")]
    BeforeAll,

    /// Once, after all the features have finished.
    #[display("after_all")]
    AfterAll,

    /// Before the scenarios of a feature.
    #[display("before_feature")]
    BeforeFeature,

    /// After the scenarios of a feature.
    #[display("after_feature")]
    AfterFeature,

    /// Before every scenario attempt.
    #[display("before_scenario")]
    BeforeScenario,

    /// After every scenario attempt.
    #[display("after_scenario")]
    AfterScenario,

    /// Before every step handler.
    #[display("before_step")]
    BeforeStep,

    /// After every step handler, whatever its outcome.
    #[display("after_step")]
    AfterStep,
}

impl Phase {
    /// All the [`Phase`]s, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::BeforeAll,
        Self::AfterAll,
        Self::BeforeFeature,
        Self::AfterFeature,
        Self::BeforeScenario,
        Self::AfterScenario,
        Self::BeforeStep,
        Self::AfterStep,
    ];

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Eight independent single-slot hook registries.
#[derive(Clone, Debug, Default)]
pub struct Hooks {
    #[debug("{:?}", Phase::ALL.iter().filter(|p| slots[p.slot()].is_some()).collect::<Vec<_>>())]
    slots: [Option<Hook>; 8],
}

impl Hooks {
    /// Creates empty [`Hooks`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the `hook` for the given `phase`.
    ///
    /// # Errors
    ///
    /// With [`Error::Singleton`] if the `phase` already has a hook.
    pub fn register<F, E>(&mut self, phase: Phase, hook: F) -> crate::Result<()>
    where
        F: Fn(&mut Context) -> Result<(), E> + 'static,
        E: fmt::Debug + fmt::Display + 'static,
    {
        let slot = &mut self.slots[phase.slot()];
        if slot.is_some() {
            return Err(Error::Singleton { phase });
        }
        tracing::trace!(%phase, "registered hook");
        *slot = Some(Arc::new(move |ctx: &mut Context| {
            hook(ctx).map_err(|e| Failure::from_error(&e))
        }));
        Ok(())
    }

    /// Indicates whether the given `phase` has a hook.
    #[must_use]
    pub fn is_registered(&self, phase: Phase) -> bool {
        self.slots[phase.slot()].is_some()
    }

    /// Executes the hook of the given `phase`, if any.
    ///
    /// # Errors
    ///
    /// With [`Error::Hook`] if the hook returns an error or panics.
    pub fn execute(&self, phase: Phase, ctx: &mut Context) -> crate::Result<()> {
        let Some(hook) = &self.slots[phase.slot()] else {
            tracing::trace!(%phase, "no hook registered");
            return Ok(());
        };
        tracing::trace!(%phase, "executing hook");
        let failure = match panic_trap::run(|| hook(ctx)) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(failure)) => failure,
            Err(panic) => Failure::from_panic(panic),
        };
        tracing::error!(%phase, %failure, "hook failed");
        Err(Error::Hook { phase, failure })
    }
}
