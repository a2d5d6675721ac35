// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Catching panics of step and hook handlers.

use std::{
    any::Any,
    cell::RefCell,
    panic::{self, AssertUnwindSafe, PanicHookInfo},
    sync::{Mutex, MutexGuard, PoisonError},
};

thread_local! {
    /// Details of the last panic happened on the current thread, recorded by
    /// the hook installed with [`QuietHook`].
    static LAST_PANIC: RefCell<Option<PanicDetails>> = const { RefCell::new(None) };
}

/// Readable details of a caught panic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PanicDetails {
    /// Panic message.
    pub payload: String,

    /// `file:line:column` the panic originated at.
    pub location: String,
}

impl PanicDetails {
    fn from_hook_info(info: &PanicHookInfo<'_>) -> Self {
        Self {
            payload: payload_to_string(info.payload()),
            location: info.location().map_or_else(
                || "unknown location".to_owned(),
                |loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
            ),
        }
    }
}

fn payload_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "opaque panic payload".to_owned()
    }
}

/// Runs the given closure, converting its panic into [`PanicDetails`].
///
/// The panic location is only known while a [`QuietHook`] is installed.
pub fn run<T>(f: impl FnOnce() -> T) -> Result<T, PanicDetails> {
    LAST_PANIC.with(|p| p.borrow_mut().take());
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        LAST_PANIC
            .with(|p| p.borrow_mut().take())
            .unwrap_or_else(|| PanicDetails {
                payload: payload_to_string(payload.as_ref()),
                location: "unknown location".to_owned(),
            })
    })
}

/// Panic hook of the process.
type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Process-wide state shared by all the [`QuietHook`] guards.
struct Installed {
    /// Number of the alive guards.
    guards: usize,

    /// Hook to restore once the last guard is dropped.
    previous: Option<PanicHook>,
}

static INSTALLED: Mutex<Installed> =
    Mutex::new(Installed { guards: 0, previous: None });

fn installed() -> MutexGuard<'static, Installed> {
    INSTALLED.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Guard replacing the process panic hook with a silent one recording
/// [`PanicDetails`], so that failing steps don't spam the console with
/// "thread panicked at" messages.
///
/// Guards may overlap (concurrent runs, for example): the recording hook
/// is installed by the first alive guard, and the previous hook is
/// restored once the last one is dropped, whatever the drop order.
#[derive(Debug)]
pub struct QuietHook {
    _private: (),
}

impl QuietHook {
    /// Installs the recording hook, unless another guard did already.
    #[must_use]
    pub fn install() -> Self {
        let mut state = installed();
        if state.guards == 0 {
            state.previous = Some(panic::take_hook());
            panic::set_hook(Box::new(|info| {
                let details = PanicDetails::from_hook_info(info);
                LAST_PANIC.with(|p| *p.borrow_mut() = Some(details));
            }));
        }
        state.guards += 1;
        Self { _private: () }
    }

    /// Indicates whether any [`QuietHook`] is alive.
    #[must_use]
    pub fn is_installed() -> bool {
        installed().guards > 0
    }
}

impl Drop for QuietHook {
    fn drop(&mut self) {
        let mut state = installed();
        state.guards = state.guards.saturating_sub(1);
        if state.guards == 0 {
            if let Some(previous) = state.previous.take() {
                panic::set_hook(previous);
            }
        }
    }
}
