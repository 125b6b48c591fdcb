// src/process/route.rs

use std::collections::HashSet;

use super::decode::ResponseRow;
use super::value::Fields;

/// Splits decoded rows into per-table field maps, dropping ignored fields.
#[derive(Debug, Clone, Default)]
pub struct Router {
    ignore: HashSet<String>,
}

impl Router {
    pub fn new<I, S>(ignore_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore: ignore_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// One `(table, fields)` pair per top-level key, in row order.
    /// The ignore set applies to every table alike.
    pub fn route(&self, row: ResponseRow) -> Vec<(String, Fields)> {
        row.into_iter()
            .map(|(table, mut fields)| {
                if !self.ignore.is_empty() {
                    fields.retain(|name, _| !self.ignore.contains(name));
                }
                (table, fields)
            })
            .collect()
    }
}
