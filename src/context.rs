// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Context`] shared with step handlers and hooks.

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    attachment::Attachment,
    id::Identifier,
    outcome::{Outcome, Overall},
    pickle::Tags,
    step::{DataTable, Docstring, Keyword},
    Error, Result,
};

/// Options of a run visible to handlers.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct Options {
    /// How many times a failed scenario is retried.
    pub failed_repeat_count: usize,
}

/// Feature being executed.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureInfo {
    /// Identifier of the feature.
    pub identifier: Identifier,

    /// Name of the feature.
    pub name: String,

    /// URI of the feature document.
    pub uri: String,

    /// Overall result, known once all its scenarios have been executed.
    pub overall: Option<Overall>,
}

/// Scenario attempt being executed.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioInfo {
    /// Identifier of the current attempt.
    pub identifier: Identifier,

    /// Index of the current attempt, `0` being the first run.
    pub attempt: usize,

    /// Example-resolved name.
    pub name: String,

    /// Name of the owning feature.
    pub feature_name: String,

    /// Tags split by level.
    pub tags: Tags,

    /// Overall result, known once the attempt has finished.
    pub overall: Option<Overall>,
}

/// Step attempt being executed.
#[derive(Clone, Debug, PartialEq)]
pub struct StepInfo {
    /// Identifier of the current attempt.
    pub identifier: Identifier,

    /// Resolved keyword.
    pub keyword: Keyword,

    /// Example-resolved text.
    pub text: String,

    /// Docstring, if any.
    pub docstring: Option<Docstring>,

    /// Docstring parsed as JSON, if declared so.
    pub docstring_json: Option<serde_json::Value>,

    /// Data table, if any.
    pub data_table: Option<DataTable>,

    /// Outcome of the handler, set before the `after_step` hook.
    pub outcome: Outcome,
}

/// Mutable state of a run, handed to every step handler and hook.
///
/// Every feature works on its own clone of the [`Context`] as it was after
/// the `before_all` hook, so data set while executing one feature is never
/// visible to another one.
#[derive(Clone, Debug, Default)]
pub struct Context {
    options: Options,
    data: HashMap<String, serde_json::Value>,
    feature: Option<FeatureInfo>,
    scenario: Option<ScenarioInfo>,
    step: Option<StepInfo>,
    attachments: Vec<Attachment>,
}

impl Context {
    /// Creates a new [`Context`] with the given [`Options`].
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self { options, ..Self::default() }
    }

    /// [`Options`] of the run.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Value stored under the `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Value stored under the `key`, deserialized into `T`.
    ///
    /// # Errors
    ///
    /// If the stored value doesn't represent a `T`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> serde_json::Result<Option<T>> {
        self.data
            .get(key)
            .map(|v| T::deserialize(v))
            .transpose()
    }

    /// Stores the `value` under the `key`, returning the replaced one.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Option<serde_json::Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Removes the value stored under the `key`.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Feature being executed.
    #[must_use]
    pub const fn feature(&self) -> Option<&FeatureInfo> {
        self.feature.as_ref()
    }

    /// Scenario attempt being executed.
    #[must_use]
    pub const fn scenario(&self) -> Option<&ScenarioInfo> {
        self.scenario.as_ref()
    }

    /// Step attempt being executed.
    #[must_use]
    pub const fn step(&self) -> Option<&StepInfo> {
        self.step.as_ref()
    }

    /// Content of the current step docstring.
    #[must_use]
    pub fn docstring(&self) -> Option<&str> {
        self.step()?.docstring.as_ref().map(|d| d.content.as_str())
    }

    /// Declared type of the current step docstring.
    #[must_use]
    pub fn docstring_type(&self) -> Option<&str> {
        self.step()?.docstring.as_ref()?.content_type.as_deref()
    }

    /// Current step docstring parsed as JSON, if its type is `json`.
    #[must_use]
    pub fn docstring_json(&self) -> Option<&serde_json::Value> {
        self.step()?.docstring_json.as_ref()
    }

    /// Data table of the current step.
    #[must_use]
    pub fn table(&self) -> Option<&DataTable> {
        self.step()?.data_table.as_ref()
    }

    /// Attaches plaintext `data` to the current step attempt.
    ///
    /// Without a `filename`, `<attempt-id>-<n>.txt` is used, `n` being the
    /// number of attachments made so far.
    ///
    /// # Errors
    ///
    /// With [`Error::NoCurrentStep`] outside of a step, or with
    /// [`Error::EmptyAttachment`] if the `data` is empty.
    pub fn attach_plaintext(
        &mut self,
        data: impl Into<String>,
        filename: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let step = self.step.as_ref().ok_or(Error::NoCurrentStep)?;
        let data = data.into();
        if data.is_empty() {
            return Err(Error::EmptyAttachment);
        }
        let filename = filename.map_or_else(
            || format!("{}-{}.txt", step.identifier, self.attachments.len()),
            ToOwned::to_owned,
        );
        self.attach(Attachment::plaintext(
            data,
            filename,
            description.map(ToOwned::to_owned),
        ));
        Ok(())
    }

    /// Attaches encoded image `data` to the current step attempt.
    ///
    /// # Errors
    ///
    /// With [`Error::NoCurrentStep`] outside of a step, or with
    /// [`Error::EmptyAttachment`] if the `data` is empty.
    pub fn attach_image(
        &mut self,
        data: impl Into<Vec<u8>>,
        filename: &str,
        description: Option<&str>,
    ) -> Result<()> {
        if self.step.is_none() {
            return Err(Error::NoCurrentStep);
        }
        let data = data.into();
        if data.is_empty() {
            return Err(Error::EmptyAttachment);
        }
        self.attach(Attachment::image(
            data,
            filename,
            description.map(ToOwned::to_owned),
        ));
        Ok(())
    }

    pub(crate) fn attach(&mut self, attachment: Attachment) {
        tracing::trace!(filename = attachment.filename(), "attached");
        self.attachments.push(attachment);
    }

    pub(crate) fn take_attachments(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.attachments)
    }

    pub(crate) fn enter_feature(&mut self, feature: FeatureInfo) {
        self.feature = Some(feature);
        self.scenario = None;
        self.step = None;
    }

    pub(crate) fn finish_feature(&mut self, overall: Option<Overall>) {
        if let Some(f) = &mut self.feature {
            f.overall = overall;
        }
    }

    pub(crate) fn enter_scenario(&mut self, scenario: ScenarioInfo) {
        self.scenario = Some(scenario);
        self.step = None;
    }

    pub(crate) fn finish_scenario(&mut self, overall: Overall) {
        if let Some(s) = &mut self.scenario {
            s.overall = Some(overall);
        }
    }

    pub(crate) fn enter_step(&mut self, step: StepInfo) {
        self.attachments.clear();
        self.step = Some(step);
    }

    pub(crate) fn finish_step(&mut self, outcome: Outcome) {
        if let Some(s) = &mut self.step {
            s.outcome = outcome;
        }
    }

    pub(crate) fn leave_step(&mut self) {
        self.step = None;
    }
}
