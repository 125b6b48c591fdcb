//! adsctl: query the Google Ads API with GAQL and materialize the streamed
//! result rows into named tables.
//!
//! The interesting part lives in [`process`]: rows arrive as nested objects
//! keyed by resource name (`campaign`, `metrics`, `campaignBudget`, ...) and are
//! folded into a [`process::TableSet`] whose headers are fixed on first sight.

pub mod app;
pub mod config;
pub mod error;
pub mod fetch;
pub mod process;
pub mod prompt;
pub mod render;

pub use app::{Application, Interruptible, Overrides};
pub use error::{ApiFailure, DecodeError, QueryError};
pub use process::{
    materialize, HeaderPolicy, MaterializeOptions, Materialized, Materializer, QueryOutcome,
    ResponseBatch, Table, TableSet, Value,
};
