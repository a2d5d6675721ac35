// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compilation of a [`gherkin::Feature`] into [`Pickle`]s.

use std::iter;

use gherkin::StepType;
use lazy_regex::regex;

use crate::step::RawKeyword;

use super::{Argument, Pickle, PickleStep, Tags};

/// Compiles the given [`gherkin::Feature`] into [`Pickle`]s, one per
/// `Scenario` and one per `Examples` row of every `Scenario Outline`.
///
/// `Background` steps (of the `Feature` and of the enclosing `Rule`) prefix
/// the steps of every produced [`Pickle`]. Outline placeholders are
/// substituted in names, step texts, docstrings and table cells, the
/// templates being kept as [`Pickle::raw_name`] and
/// [`PickleStep::raw_text`].
#[must_use]
pub fn compile(feature: &gherkin::Feature) -> Vec<Pickle> {
    let uri = feature
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let feature_tags = feature.tags.iter().map(|t| tag(t)).collect::<Vec<_>>();
    let background = feature.background.iter().flat_map(|b| &b.steps);

    let top_level = feature
        .scenarios
        .iter()
        .map(|sc| (sc, background.clone().collect::<Vec<_>>(), Vec::new()));
    let in_rules = feature.rules.iter().flat_map(|rule| {
        let steps = background
            .clone()
            .chain(rule.background.iter().flat_map(|b| &b.steps))
            .collect::<Vec<_>>();
        let tags = rule.tags.iter().map(|t| tag(t)).collect::<Vec<_>>();
        rule.scenarios
            .iter()
            .map(move |sc| (sc, steps.clone(), tags.clone()))
    });

    top_level
        .chain(in_rules)
        .flat_map(|(scenario, background, rule_tags)| {
            let ctx = Scope {
                feature,
                uri: &uri,
                feature_tags: &feature_tags,
                rule_tags: &rule_tags,
                background: &background,
            };
            ctx.compile_scenario(scenario)
        })
        .collect()
}

/// Surroundings of a compiled [`gherkin::Scenario`].
struct Scope<'a> {
    feature: &'a gherkin::Feature,
    uri: &'a str,
    feature_tags: &'a [String],
    rule_tags: &'a [String],
    background: &'a [&'a gherkin::Step],
}

impl Scope<'_> {
    fn compile_scenario(&self, scenario: &gherkin::Scenario) -> Vec<Pickle> {
        let scenario_tags = self
            .rule_tags
            .iter()
            .cloned()
            .chain(scenario.tags.iter().map(|t| tag(t)))
            .collect::<Vec<_>>();

        if scenario.examples.is_empty() {
            let steps = self
                .background
                .iter()
                .copied()
                .chain(&scenario.steps)
                .map(|s| pickle_step(s, None))
                .collect();
            return vec![Pickle {
                feature_name: self.feature.name.clone(),
                name: scenario.name.clone(),
                raw_name: None,
                language: "en".to_owned(),
                examples_name: None,
                uri: self.uri.to_owned(),
                line: scenario.position.line,
                outline_line: None,
                tags: Tags {
                    feature: self.feature_tags.to_vec(),
                    scenario: scenario_tags,
                    example: Vec::new(),
                }
                .deduplicated(),
                steps,
            }];
        }

        scenario
            .examples
            .iter()
            .filter_map(|ex| {
                let table = ex.table.as_ref()?;
                let (header, rows) = table.rows.split_first()?;
                Some((ex, table, header, rows))
            })
            .flat_map(|(ex, table, header, rows)| {
                let examples_name: Option<String> = ex.name.clone().into();
                let examples_name = examples_name.filter(|n| !n.is_empty());
                let example_tags =
                    ex.tags.iter().map(|t| tag(t)).collect::<Vec<_>>();
                let scenario_tags = scenario_tags.clone();

                rows.iter().enumerate().map(move |(i, row)| {
                    let values = header.iter().zip(row).collect::<Vec<_>>();
                    let steps = self
                        .background
                        .iter()
                        .map(|s| pickle_step(s, None))
                        .chain(
                            scenario
                                .steps
                                .iter()
                                .map(|s| pickle_step(s, Some(values.as_slice()))),
                        )
                        .collect();
                    Pickle {
                        feature_name: self.feature.name.clone(),
                        name: substitute(&scenario.name, &values),
                        raw_name: Some(scenario.name.clone()),
                        language: "en".to_owned(),
                        examples_name: examples_name.clone(),
                        uri: self.uri.to_owned(),
                        line: table.position.line + i + 1,
                        outline_line: Some(scenario.position.line),
                        tags: Tags {
                            feature: self.feature_tags.to_vec(),
                            scenario: scenario_tags.clone(),
                            example: example_tags.clone(),
                        }
                        .deduplicated(),
                        steps,
                    }
                })
            })
            .collect()
    }
}

/// Compiles a single [`gherkin::Step`], substituting the outline `values`,
/// if any.
fn pickle_step(
    step: &gherkin::Step,
    values: Option<&[(&String, &String)]>,
) -> PickleStep {
    let resolve = |s: &str| values.map_or_else(|| s.to_owned(), |v| substitute(s, v));

    let argument = step
        .docstring
        .as_ref()
        .map(|content| Argument::DocString {
            content_type: None,
            content: resolve(content),
        })
        .or_else(|| {
            step.table.as_ref().map(|t| Argument::DataTable {
                rows: t
                    .rows
                    .iter()
                    .map(|r| r.iter().map(|c| resolve(c)).collect())
                    .collect(),
            })
        });

    PickleStep {
        keyword: raw_keyword(step),
        text: resolve(&step.value),
        raw_text: values.map(|_| step.value.clone()),
        argument,
        line: step.position.line,
    }
}

/// Recovers the keyword as written: `And`/`But` stay relative, while
/// [`gherkin`] already resolves them into a [`StepType`].
fn raw_keyword(step: &gherkin::Step) -> RawKeyword {
    match step.keyword.trim() {
        "And" => RawKeyword::And,
        "But" => RawKeyword::But,
        _ => match step.ty {
            StepType::Given => RawKeyword::Given,
            StepType::When => RawKeyword::When,
            StepType::Then => RawKeyword::Then,
        },
    }
}

/// Replaces `<name>` placeholders with the matching `values`, leaving unknown
/// ones intact.
fn substitute(template: &str, values: &[(&String, &String)]) -> String {
    regex!(r"<([^>\s]+)>")
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let name = caps.get(1).map_or("", |m| m.as_str());
            values
                .iter()
                .find_map(|(k, v)| (k.as_str() == name).then(|| v.as_str()))
                .unwrap_or(whole)
                .to_owned()
        })
        .into_owned()
}

/// Normalizes a tag to its `@`-prefixed form.
fn tag(t: &str) -> String {
    if t.starts_with('@') {
        t.to_owned()
    } else {
        iter::once('@').chain(t.chars()).collect()
    }
}
