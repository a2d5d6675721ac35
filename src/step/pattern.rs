// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step text patterns with named `{placeholders}`.
//!
//! A pattern is a literal text where `{name}` matches any non-empty text,
//! `{name:d}` an integer and `{name:w}` a single word. `{{` and `}}` stand for
//! literal braces. The whole step text must match.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use linked_hash_map::LinkedHashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Compiled step pattern.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    regex: Regex,
    placeholders: Vec<String>,
}

impl Pattern {
    /// Compiles the given `source` into a [`Pattern`].
    ///
    /// # Errors
    ///
    /// With [`Error::Pattern`] if braces are unbalanced, a placeholder is
    /// unnamed, duplicated or has an unknown format.
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let invalid = |reason: &str| Error::Pattern {
            pattern: source.clone(),
            reason: reason.to_owned(),
        };

        let mut re = String::from("^");
        let mut literal = String::new();
        let mut placeholders = Vec::<String>::new();
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    _ = chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    _ = chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unmatched `}`")),
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(invalid("unclosed placeholder"));
                            }
                            Some(c) => field.push(c),
                        }
                    }
                    let (name, format) =
                        field.split_once(':').unwrap_or((field.as_str(), ""));
                    if name.is_empty() {
                        return Err(invalid("placeholders must be named"));
                    }
                    if !is_identifier(name) {
                        return Err(invalid(&format!(
                            "`{name}` is not a valid placeholder name",
                        )));
                    }
                    if placeholders.iter().any(|p| p == name) {
                        return Err(invalid(&format!(
                            "placeholder `{name}` is used twice",
                        )));
                    }
                    let group = match format {
                        "" => r"(.+?)",
                        "d" => r"([-+]?\d+)",
                        "w" => r"(\w+)",
                        f => {
                            return Err(invalid(&format!(
                                "unsupported format `{f}` of `{name}`",
                            )));
                        }
                    };
                    re.push_str(&regex::escape(&literal));
                    literal.clear();
                    re.push_str(group);
                    placeholders.push(name.to_owned());
                }
                c => literal.push(c),
            }
        }
        re.push_str(&regex::escape(&literal));
        re.push('$');

        let regex = Regex::new(&re).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self { source, regex, placeholders })
    }

    /// Text this [`Pattern`] was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the placeholders, in order of appearance.
    #[must_use]
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Matches the whole `text`, extracting the placeholder values.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Args> {
        let caps = self.regex.captures(text)?;
        Some(Args(
            self.placeholders
                .iter()
                .zip(caps.iter().skip(1))
                .map(|(name, m)| {
                    let value = m.map(|m| m.as_str()).unwrap_or_default();
                    (name.clone(), value.to_owned())
                })
                .collect(),
        ))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Named arguments extracted from a step text, in placeholder order.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Args(LinkedHashMap<String, String>);

impl Args {
    /// Value of the placeholder with the given `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parses the value of the placeholder with the given `name`.
    ///
    /// Returns [`None`] if there is no such placeholder.
    pub fn parse<T: std::str::FromStr>(
        &self,
        name: &str,
    ) -> Option<std::result::Result<T, T::Err>> {
        self.get(name).map(str::parse)
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v:?}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_named_arguments() {
        let p = Pattern::new("a user which {status} with {count:d} items").unwrap();
        let args = p.captures("a user which exists with 42 items").unwrap();

        assert_eq!(p.placeholders(), ["status", "count"]);
        assert_eq!(args.get("status"), Some("exists"));
        assert_eq!(args.parse::<u32>("count"), Some(Ok(42)));
        assert_eq!(args.to_string(), r#"{status: "exists", count: "42"}"#);
    }

    #[test]
    fn matches_whole_text_only() {
        let p = Pattern::new("a {thing}").unwrap();

        assert!(p.captures("a cat").is_some());
        assert!(p.captures("not a cat").is_none());
        assert!(p.captures("a ").is_none());
    }

    #[test]
    fn escapes_literal_text() {
        let p = Pattern::new("price is $5.00 (or {{more}}) for {who:w}").unwrap();

        assert_eq!(
            p.captures("price is $5.00 (or {more}) for bob")
                .unwrap()
                .get("who"),
            Some("bob"),
        );
        assert!(p.captures("price is $5x00 (or {more}) for bob").is_none());
    }

    #[test]
    fn literal_patterns_have_no_arguments() {
        let p = Pattern::new("a clean database").unwrap();

        assert!(p.captures("a clean database").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_patterns() {
        for source in ["a {}", "a {x", "a }", "a {x} {x}", "a {x:q}", "{1x}"] {
            assert!(
                matches!(Pattern::new(source), Err(Error::Pattern { .. })),
                "{source} should be rejected",
            );
        }
    }
}
