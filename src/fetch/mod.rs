// src/fetch/mod.rs
//
// The query service the materializer pulls batches from. `ads` talks to the
// Google Ads REST API; `auth` keeps it supplied with OAuth access tokens.

pub mod ads;
pub mod auth;

pub use ads::{GoogleAdsService, SearchMode, ServiceSettings};
pub use auth::{OAuthCredentials, TokenSource};

use crate::error::QueryError;
use crate::process::ResponseBatch;

/// Lazy, forward-only sequence of response batches. Any item may be an error,
/// after which the sequence should not be polled again.
pub type BatchStream<'a> = Box<dyn Iterator<Item = Result<ResponseBatch, QueryError>> + 'a>;

/// Anything that can run a GAQL query for a customer.
pub trait QueryService {
    fn search<'a>(&'a self, customer_id: &str, query: &str)
        -> Result<BatchStream<'a>, QueryError>;
}
