// src/config/model.rs

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::process::{HeaderPolicy, MaterializeOptions};

/// Environment variables prefixed with this override file settings.
pub const ENV_PREFIX: &str = "ADSCTL_";

pub const DEFAULT_ACCOUNT: &str = "default";
pub const DEFAULT_API_VERSION: &str = "v17";
pub const DEFAULT_ENDPOINT: &str = "https://googleads.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuth {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
}

/// Credentials and ids for one Google Ads account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub developer_token: String,
    pub customer_id: String,
    /// Manager account to act through, if any
    pub login_customer_id: String,
    pub oauth: OAuth,
}

/// Root of the YAML config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    pub current_account: String,
    pub accounts: BTreeMap<String, AccountConfig>,
    /// Fields dropped from every result table, e.g. `resourceName`
    pub ignore_fields: Vec<String>,
    /// Keep the row that creates a table as data as well as header
    pub include_first_row: bool,
    pub api_version: String,
    pub endpoint: String,
    pub token_uri: String,
}

impl Default for RootConfig {
    fn default() -> Self {
        let mut accounts = BTreeMap::new();
        accounts.insert(DEFAULT_ACCOUNT.to_string(), AccountConfig::default());
        Self {
            current_account: DEFAULT_ACCOUNT.to_string(),
            accounts,
            ignore_fields: Vec::new(),
            include_first_row: false,
            api_version: DEFAULT_API_VERSION.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        }
    }
}

impl RootConfig {
    /// The account named by `current_account`.
    pub fn account(&self) -> Result<&AccountConfig> {
        self.account_named(&self.current_account)
    }

    pub fn account_named(&self, name: &str) -> Result<&AccountConfig> {
        self.accounts.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.accounts.keys().map(String::as_str).collect();
            anyhow!(
                "account `{}` is not configured (known accounts: {})",
                name,
                known.join(", ")
            )
        })
    }

    /// Apply `ADSCTL_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());
        if let Some(account) = var("CURRENT_ACCOUNT") {
            self.current_account = account;
        }
        if let Some(version) = var("API_VERSION") {
            self.api_version = version;
        }
    }

    /// Copy with tokens and secrets hidden, for display.
    pub fn masked(&self) -> RootConfig {
        let mut copy = self.clone();
        for account in copy.accounts.values_mut() {
            mask(&mut account.developer_token);
            mask(&mut account.oauth.client_secret);
            if let Some(token) = account.oauth.refresh_token.as_mut() {
                mask(token);
            }
        }
        copy
    }

    pub fn materialize_options(&self) -> MaterializeOptions {
        MaterializeOptions {
            ignore_fields: self.ignore_fields.clone(),
            header_policy: if self.include_first_row {
                HeaderPolicy::FirstRowIsData
            } else {
                HeaderPolicy::HeaderOnly
            },
        }
    }
}

fn mask(secret: &mut String) {
    if !secret.is_empty() {
        *secret = "*****".to_string();
    }
}

/// Strip separators from a customer id (`123-456-7890` → `1234567890`).
pub fn normalize_customer_id(raw: &str) -> Result<String> {
    let id: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();
    if id.is_empty() {
        bail!("customer id is empty");
    }
    if !id.chars().all(|c| c.is_ascii_digit()) {
        bail!("customer id `{}` must contain only digits and dashes", raw);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn strips_dashes_and_spaces() -> Result<()> {
        assert_eq!(normalize_customer_id("123-456-7890")?, "1234567890");
        assert_eq!(normalize_customer_id(" 1234567890 ")?, "1234567890");
        Ok(())
    }

    #[test]
    fn rejects_bad_customer_ids() {
        assert!(normalize_customer_id("").is_err());
        assert!(normalize_customer_id("--").is_err());
        assert!(normalize_customer_id("123-abc").is_err());
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() -> Result<()> {
        let yaml = r#"
current_account: work
accounts:
  work:
    developer_token: dev-token
    customer_id: 111-222-3333
    oauth:
      client_id: cid
"#;
        let config: RootConfig = serde_yaml::from_str(yaml)?;
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        let account = config.account()?;
        assert_eq!(account.developer_token, "dev-token");
        assert_eq!(account.oauth.client_id, "cid");
        assert_eq!(account.oauth.refresh_token, None);
        Ok(())
    }

    #[test]
    fn unknown_account_is_an_error() {
        let config = RootConfig::default();
        let err = config.account_named("missing").unwrap_err();
        assert!(err.to_string().contains("known accounts: default"));
    }

    #[test]
    fn env_overrides_current_account() {
        let env: HashMap<String, String> = [
            ("ADSCTL_CURRENT_ACCOUNT".to_string(), "client-b".to_string()),
            ("ADSCTL_API_VERSION".to_string(), String::new()),
        ]
        .into_iter()
        .collect();

        let mut config = RootConfig::default();
        config.apply_env_from(|key| env.get(key).cloned());
        assert_eq!(config.current_account, "client-b");
        // empty values are ignored
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn masked_hides_secrets_only() {
        let mut config = RootConfig::default();
        let account = config.accounts.entry(DEFAULT_ACCOUNT.into()).or_default();
        account.developer_token = "dev".into();
        account.customer_id = "123".into();
        account.oauth.client_secret = "shh".into();
        account.oauth.refresh_token = Some("refresh".into());

        let masked = config.masked();
        let account = masked.account().expect("default account");
        assert_eq!(account.developer_token, "*****");
        assert_eq!(account.oauth.client_secret, "*****");
        assert_eq!(account.oauth.refresh_token.as_deref(), Some("*****"));
        assert_eq!(account.customer_id, "123");
        // empty values stay empty so missing credentials are visible
        assert_eq!(account.oauth.client_id, "");
    }

    #[test]
    fn options_follow_config() {
        let config = RootConfig {
            ignore_fields: vec!["resourceName".into()],
            include_first_row: true,
            ..RootConfig::default()
        };
        let options = config.materialize_options();
        assert_eq!(options.ignore_fields, vec!["resourceName".to_string()]);
        assert_eq!(options.header_policy, HeaderPolicy::FirstRowIsData);
    }
}
