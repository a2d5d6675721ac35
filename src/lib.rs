// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    trivial_casts,
    trivial_numeric_casts
)]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_import_braces,
    unused_labels,
    unused_qualifications,
    unused_results
)]

pub mod attachment;
pub mod cli;
pub mod context;
pub mod error;
pub mod feature;
pub mod history;
pub mod hook;
pub mod id;
pub mod logs;
pub mod outcome;
pub mod outline;
pub mod panic_trap;
pub mod parser;
pub mod pickle;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod scenario;
pub mod step;
pub mod summary;
pub mod tag;

#[doc(no_inline)]
pub use gherkin;

#[doc(inline)]
pub use self::{
    attachment::Attachment,
    context::{Context, Options},
    error::{Error, Result},
    feature::Feature,
    history::History,
    hook::Phase,
    id::Identifier,
    logs::ScenarioLogs,
    outcome::{Failure, Outcome, Overall, Status},
    outline::ScenarioOutline,
    pickle::{Document, Pickle},
    registry::{Register, Registry},
    reporter::Reporter,
    runner::{Filters, Run, Runner},
    scenario::Scenario,
    step::{Keyword, Step},
    summary::Summary,
    tag::Predicate,
};
