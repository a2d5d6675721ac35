// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Loading of [Gherkin] files from disk.
//!
//! As there is no async runtime-agnostic way to interact with io, loading is
//! blocking.
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

use std::{io, path::Path};

use crate::{pickle::Document, Error, Result};

/// Path loaded when no path is given.
pub const DEFAULT_PATH: &str = "features";

/// Parses the `.feature` file at the given `path`, or all the `.feature`
/// files found recursively under it, in path order.
///
/// # Errors
///
/// - [`Error::Io`] if the `path` doesn't exist;
/// - [`Error::NotAFeatureFile`] if the `path` is a file of another type;
/// - [`Error::Parse`] if any file is not valid [Gherkin].
///
/// [Gherkin]: https://cucumber.io/docs/gherkin/reference
pub fn parse(path: impl AsRef<Path>) -> Result<Vec<gherkin::Feature>> {
    let path = path.as_ref().canonicalize()?;

    if path.is_file() {
        let is_feature = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("feature"));
        if !is_feature {
            return Err(Error::NotAFeatureFile { path });
        }
        let env = gherkin::GherkinEnv::default();
        return Ok(vec![gherkin::Feature::parse_path(path, env)?]);
    }

    let mut files = globwalk::GlobWalkerBuilder::new(&path, "*.feature")
        .case_insensitive(true)
        .build()?
        .map(|entry| entry.map(globwalk::DirEntry::into_path))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(io::Error::from)?;
    files.sort();
    tracing::trace!(path = %path.display(), files = files.len(), "found feature files");

    files
        .into_iter()
        .map(|file| {
            let env = gherkin::GherkinEnv::default();
            gherkin::Feature::parse_path(file, env).map_err(Error::from)
        })
        .collect()
}

/// Loads and compiles the documents found under all the given `paths`.
///
/// Falls back to [`DEFAULT_PATH`] if no path is given.
///
/// # Errors
///
/// See [`parse()`].
pub fn load<I, P>(paths: I) -> Result<Vec<Document>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut paths = paths.into_iter().peekable();
    let features = if paths.peek().is_none() {
        parse(DEFAULT_PATH)?
    } else {
        let mut features = Vec::new();
        for path in paths {
            features.extend(parse(path)?);
        }
        features
    };
    Ok(features.iter().map(Document::compile).collect())
}
