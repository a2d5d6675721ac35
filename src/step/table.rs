// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Data tables of steps, keyed by their header row.

use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};

/// Single row of a [`DataTable`], mapping header cells to values.
pub type Row = LinkedHashMap<String, String>;

/// Data table of a [`Step`], one [`Row`] per non-header line.
///
/// [`Step`]: crate::Step
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataTable(Vec<Row>);

impl DataTable {
    /// Builds a [`DataTable`] out of raw `rows`, the first one being the
    /// header.
    ///
    /// Cells missing in short rows are left out of the resulting [`Row`].
    #[must_use]
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let Some((header, body)) = rows.split_first() else {
            return Self::default();
        };
        Self(
            body.iter()
                .map(|row| header.iter().cloned().zip(row.iter().cloned()).collect())
                .collect(),
        )
    }

    /// Rows of this [`DataTable`].
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.0
    }

    /// Renders this [`DataTable`] as a pretty-printed JSON array of objects,
    /// keeping the column order.
    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        let value = serde_json::Value::Array(
            self.0
                .iter()
                .map(|row| {
                    serde_json::Value::Object(
                        row.iter()
                            .map(|(k, v)| (k.clone(), v.clone().into()))
                            .collect(),
                    )
                })
                .collect(),
        );
        format!("{value:#}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|c| (*c).to_owned()).collect())
            .collect()
    }

    #[test]
    fn keys_rows_by_header() {
        let table = DataTable::from_rows(&rows(&[
            &["name", "role"],
            &["alice", "admin"],
            &["bob", "guest"],
        ]));

        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[1]["name"], "bob");
        assert_eq!(
            table.rows()[0].keys().map(String::as_str).collect::<Vec<_>>(),
            ["name", "role"],
        );
    }

    #[test]
    fn header_only_table_is_empty() {
        assert!(DataTable::from_rows(&rows(&[&["name"]])).rows().is_empty());
        assert!(DataTable::from_rows(&[]).rows().is_empty());
    }

    #[test]
    fn renders_json_in_column_order() {
        let table =
            DataTable::from_rows(&rows(&[&["z", "a"], &["1", "2"]]));

        assert_eq!(
            table.to_json_pretty(),
            "[\n  {\n    \"z\": \"1\",\n    \"a\": \"2\"\n  }\n]",
        );
    }
}
