// src/app.rs
//
// Wires the config, the query service and the materializer together. Both the
// one-shot `query` command and the interactive prompt go through here.

use anyhow::{bail, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::{normalize_customer_id, RootConfig};
use crate::error::QueryError;
use crate::fetch::{
    GoogleAdsService, OAuthCredentials, QueryService, SearchMode, ServiceSettings,
};
use crate::process::{HeaderPolicy, MaterializeOptions, Materializer, QueryOutcome};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub customer_id: Option<String>,
    pub account: Option<String>,
    /// Added to the config's `ignore_fields`
    pub ignore_fields: Vec<String>,
    pub include_first_row: bool,
    pub mode: SearchMode,
}

/// Result of a query that may have been interrupted between batches.
#[derive(Debug)]
pub struct Interruptible {
    pub outcome: QueryOutcome,
    pub interrupted: bool,
}

pub struct Application {
    customer_id: String,
    options: MaterializeOptions,
    service: Box<dyn QueryService>,
}

impl Application {
    /// Build an application talking to the Google Ads API.
    pub fn new(config: &RootConfig, overrides: Overrides) -> Result<Self> {
        let account_name = overrides
            .account
            .as_deref()
            .unwrap_or(config.current_account.as_str());
        let account = config.account_named(account_name)?;

        let raw_customer = overrides
            .customer_id
            .as_deref()
            .unwrap_or(account.customer_id.as_str());
        if raw_customer.trim().is_empty() {
            bail!(
                "no customer id: set `customer_id` for account `{}` or pass --customer-id",
                account_name
            );
        }
        let customer_id = normalize_customer_id(raw_customer)?;
        let login_customer_id = match account.login_customer_id.trim() {
            "" => None,
            login => Some(
                normalize_customer_id(login)
                    .with_context(|| format!("login_customer_id of account `{account_name}`"))?,
            ),
        };

        let service = GoogleAdsService::new(ServiceSettings {
            endpoint: config.endpoint.clone(),
            api_version: config.api_version.clone(),
            token_uri: config.token_uri.clone(),
            developer_token: account.developer_token.clone(),
            login_customer_id,
            credentials: OAuthCredentials {
                client_id: account.oauth.client_id.clone(),
                client_secret: account.oauth.client_secret.clone(),
                refresh_token: account.oauth.refresh_token.clone(),
            },
            mode: overrides.mode,
            timeout: REQUEST_TIMEOUT,
        })?;

        let mut options = config.materialize_options();
        options.ignore_fields.extend(overrides.ignore_fields);
        if overrides.include_first_row {
            options.header_policy = HeaderPolicy::FirstRowIsData;
        }

        info!(account = account_name, customer_id = %customer_id, "application ready");
        Ok(Self::with_service(Box::new(service), customer_id, options))
    }

    /// Build an application around any query service.
    pub fn with_service(
        service: Box<dyn QueryService>,
        customer_id: impl Into<String>,
        options: MaterializeOptions,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            options,
            service,
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn options(&self) -> &MaterializeOptions {
        &self.options
    }

    /// Run `query` and drain every batch into tables.
    pub fn query(&self, query: &str) -> Result<QueryOutcome, QueryError> {
        let never = AtomicBool::new(false);
        self.query_until(query, &never).map(|done| done.outcome)
    }

    /// Like [`Application::query`], but checks `stop` before each batch and
    /// returns what was gathered so far once it is set.
    #[instrument(level = "debug", skip(self, stop), fields(customer_id = %self.customer_id))]
    pub fn query_until(&self, query: &str, stop: &AtomicBool) -> Result<Interruptible, QueryError> {
        let mut materializer = Materializer::new(&self.options);
        let mut interrupted = false;
        for batch in self.service.search(&self.customer_id, query)? {
            if stop.load(Ordering::SeqCst) {
                interrupted = true;
                break;
            }
            materializer.push_batch(batch?);
        }
        if interrupted {
            debug!(rows = materializer.rows(), "query interrupted");
        }
        Ok(Interruptible {
            outcome: materializer.finish(),
            interrupted,
        })
    }
}
