// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-scenario log sink built on [`tracing`].
//!
//! Every scenario attempt is executed inside a [`SPAN_NAME`]d [`Span`]
//! carrying its [`Identifier`] in the [`SPAN_FIELD_NAME`] field. The
//! [`ScenarioLogs`] [`Layer`] records each event emitted inside such a
//! [`Span`] under that [`Identifier`], whatever worker thread emits it.
//!
//! [`Span`]: tracing::Span

use std::{
    collections::HashMap,
    fmt::{self, Write as _},
    sync::{Arc, Mutex, PoisonError},
};

use derive_more::with_trait::Display;
use tracing::{
    field::{Field, Visit},
    span, Event, Level, Subscriber,
};
use tracing_subscriber::{
    filter::LevelFilter,
    layer::{self, Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

use crate::id::Identifier;

/// Name of the [`Span`] a scenario attempt is executed in.
///
/// [`Span`]: tracing::Span
pub const SPAN_NAME: &str = "scenario";

/// Name of the [`Span`] field holding the attempt [`Identifier`].
///
/// [`Span`]: tracing::Span
pub const SPAN_FIELD_NAME: &str = "scenario_id";

/// Single recorded log line.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display("{level} {target}: {message}")]
pub struct Log {
    /// Level of the event.
    pub level: Level,

    /// Target of the event.
    pub target: String,

    /// Message followed by the other fields of the event.
    pub message: String,
}

/// [`Layer`] collecting logs of every scenario attempt.
///
/// Cloning gives another handle to the same storage.
///
/// The storage is never evicted on its own: it grows with every attempt
/// until its logs are removed with [`ScenarioLogs::take()`] or
/// [`ScenarioLogs::clear()`]. Long-lived sinks shared by many runs should
/// drain it once each run is reported.
#[derive(Clone, Debug, Default)]
pub struct ScenarioLogs {
    store: Arc<Mutex<HashMap<Identifier, Vec<Log>>>>,
}

impl ScenarioLogs {
    /// Creates an empty [`ScenarioLogs`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs recorded for the attempt with the given [`Identifier`].
    #[must_use]
    pub fn get(&self, id: &Identifier) -> Vec<Log> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes and returns the logs recorded for the given [`Identifier`].
    pub fn take(&self, id: &Identifier) -> Vec<Log> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .unwrap_or_default()
    }

    /// Removes the logs of every attempt.
    pub fn clear(&self) {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Indicates whether no log is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn push(&self, id: Identifier, log: Log) {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .push(log);
    }
}

/// [`Identifier`] stored in the extensions of a scenario [`Span`].
///
/// [`Span`]: tracing::Span
#[derive(Clone, Debug)]
struct ScenarioId(Identifier);

impl<S> Layer<S> for ScenarioLogs
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &span::Attributes<'_>,
        id: &span::Id,
        ctx: layer::Context<'_, S>,
    ) {
        if attrs.metadata().name() != SPAN_NAME {
            return;
        }
        let mut visitor = GetScenarioId::default();
        attrs.record(&mut visitor);
        if let (Some(span), Some(scenario_id)) = (ctx.span(id), visitor.0) {
            _ = span.extensions_mut().replace(ScenarioId(scenario_id));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: layer::Context<'_, S>) {
        let Some(scenario_id) = ctx.event_scope(event).and_then(|scope| {
            scope
                .into_iter()
                .find_map(|span| span.extensions().get::<ScenarioId>().cloned())
        }) else {
            return;
        };
        let mut visitor = FormatMessage::default();
        event.record(&mut visitor);
        let meta = event.metadata();
        self.push(
            scenario_id.0,
            Log {
                level: *meta.level(),
                target: meta.target().to_owned(),
                message: visitor.0,
            },
        );
    }
}

/// [`Visit`]or extracting an [`Identifier`] from the [`SPAN_FIELD_NAME`]d
/// [`Field`].
#[derive(Debug, Default)]
struct GetScenarioId(Option<Identifier>);

impl Visit for GetScenarioId {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == SPAN_FIELD_NAME {
            self.0 = Some(Identifier::from(value.to_owned()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == SPAN_FIELD_NAME {
            self.0 = Some(Identifier::from(format!("{value:?}")));
        }
    }
}

/// [`Visit`]or rendering an [`Event`] as `message key=value ...`.
#[derive(Debug, Default)]
struct FormatMessage(String);

impl Visit for FormatMessage {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        _ = if field.name() == "message" {
            write!(self.0, "{value:?}")
        } else {
            write!(self.0, "{}={value:?}", field.name())
        };
    }
}

/// Installs the global [`Subscriber`]: a `fmt` layer printing to stderr and
/// a [`ScenarioLogs`] sink, both filtered by the given `level`.
///
/// Returns a handle to the sink. If a global [`Subscriber`] is already set,
/// it's kept and the returned sink stays empty.
pub fn init(level: Level) -> ScenarioLogs {
    let logs = ScenarioLogs::new();
    let filter = LevelFilter::from_level(level);
    if let Err(e) = tracing_subscriber::registry()
        .with(filter.and_then(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(filter.and_then(logs.clone()))
        .try_init()
    {
        tracing::warn!("keeping the existing subscriber: {e}");
    }
    logs
}
