// src/process/materialize.rs

use tracing::{debug, instrument, warn};

use super::batch::ResponseBatch;
use super::decode::decode_row;
use super::route::Router;
use super::table::{HeaderPolicy, TableSet};
use crate::error::QueryError;

/// Settings for one materialization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Field names dropped from every table.
    pub ignore_fields: Vec<String>,
    pub header_policy: HeaderPolicy,
}

/// Tables accumulated over a full drain of the batch sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub tables: TableSet,
    /// Rows seen, including the ones that failed to decode.
    pub rows: usize,
    pub decode_errors: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The query returned no rows at all.
    NoResults,
    Rows(Materialized),
}

impl QueryOutcome {
    pub fn tables(&self) -> Option<&TableSet> {
        match self {
            QueryOutcome::NoResults => None,
            QueryOutcome::Rows(materialized) => Some(&materialized.tables),
        }
    }

    pub fn decode_errors(&self) -> usize {
        match self {
            QueryOutcome::NoResults => 0,
            QueryOutcome::Rows(materialized) => materialized.decode_errors,
        }
    }
}

/// Folds response batches into a [`TableSet`], one batch at a time.
///
/// Each row is decoded and routed completely before any table is touched, so
/// stopping between batches always leaves whole rows behind.
#[derive(Debug)]
pub struct Materializer {
    router: Router,
    tables: TableSet,
    rows: usize,
    decode_errors: usize,
}

impl Materializer {
    pub fn new(options: &MaterializeOptions) -> Self {
        Self {
            router: Router::new(options.ignore_fields.iter().cloned()),
            tables: TableSet::new(options.header_policy),
            rows: 0,
            decode_errors: 0,
        }
    }

    #[instrument(level = "debug", skip_all, fields(rows = batch.len()))]
    pub fn push_batch(&mut self, batch: ResponseBatch) {
        for raw in &batch.results {
            self.rows += 1;
            match decode_row(raw) {
                Ok(row) => {
                    for (table, fields) in self.router.route(row) {
                        self.tables.ensure(table, fields);
                    }
                }
                Err(err) => {
                    self.decode_errors += 1;
                    warn!(error = %err, raw = %err.raw(), "skipping undecodable row");
                }
            }
        }
    }

    /// Rows seen so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn decode_errors(&self) -> usize {
        self.decode_errors
    }

    /// Tables accumulated so far.
    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn finish(self) -> QueryOutcome {
        debug!(
            rows = self.rows,
            tables = self.tables.len(),
            decode_errors = self.decode_errors,
            "materialization finished"
        );
        if self.rows == 0 {
            return QueryOutcome::NoResults;
        }
        QueryOutcome::Rows(Materialized {
            tables: self.tables,
            rows: self.rows,
            decode_errors: self.decode_errors,
        })
    }
}

/// Drain `batches` into tables. The first service error aborts the pass.
pub fn materialize<I>(batches: I, options: &MaterializeOptions) -> Result<QueryOutcome, QueryError>
where
    I: IntoIterator<Item = Result<ResponseBatch, QueryError>>,
{
    let mut materializer = Materializer::new(options);
    for batch in batches {
        materializer.push_batch(batch?);
    }
    Ok(materializer.finish())
}
