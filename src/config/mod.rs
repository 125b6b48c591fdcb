// src/config/mod.rs

pub mod file;
pub mod model;

pub use file::{history_path, load_config, Bootstrap, ConfigFile};
pub use model::{normalize_customer_id, AccountConfig, OAuth, RootConfig};
