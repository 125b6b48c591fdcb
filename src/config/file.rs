// src/config/file.rs

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use super::model::RootConfig;

const CONFIG_DIR: &str = ".adsctl";
const CONFIG_FILE: &str = "config.yaml";
const HISTORY_FILE: &str = "history";

/// `$HOME/.adsctl`, or `./.adsctl` when `HOME` is unset.
pub fn config_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(CONFIG_DIR)
}

/// Prompt history lives next to the config file.
pub fn history_path() -> PathBuf {
    config_dir().join(HISTORY_FILE)
}

/// A YAML config file on disk and its parsed contents.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    model: RootConfig,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            model: RootConfig::default(),
        }
    }

    pub fn default_path() -> PathBuf {
        config_dir().join(CONFIG_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn model(&self) -> &RootConfig {
        &self.model
    }

    /// Read and parse the file, then apply environment overrides.
    pub fn load(&mut self) -> Result<()> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading config file {}", self.path.display()))?;
        let mut model: RootConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", self.path.display()))?;
        model.apply_env();
        debug!(path = %self.path.display(), account = %model.current_account, "loaded config");
        self.model = model;
        Ok(())
    }

    /// Overwrite the file with default settings.
    pub fn restore(&mut self) -> Result<()> {
        self.model = RootConfig::default();
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        let yaml = serde_yaml::to_string(&self.model).context("serializing config")?;
        fs::write(&self.path, yaml)
            .with_context(|| format!("writing config file {}", self.path.display()))?;
        info!(path = %self.path.display(), "wrote config");
        Ok(())
    }
}

/// Result of locating the config file at startup.
#[derive(Debug)]
pub enum Bootstrap {
    Loaded(ConfigFile),
    /// No config existed at the default location; a default one was written.
    Created(PathBuf),
}

/// Load `explicit` if given (it must exist), otherwise the default file,
/// writing a default one when it is missing.
pub fn load_config(explicit: Option<&Path>) -> Result<Bootstrap> {
    load_config_at(explicit, &ConfigFile::default_path())
}

pub fn load_config_at(explicit: Option<&Path>, default_path: &Path) -> Result<Bootstrap> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("The selected config file `{}` does not exist.", path.display());
        }
        let mut file = ConfigFile::new(path);
        file.load()?;
        return Ok(Bootstrap::Loaded(file));
    }

    let mut file = ConfigFile::new(default_path);
    if !file.path().is_file() {
        file.restore().with_context(|| {
            format!(
                "Unable to create config file located at `{}`. Please check your permissions.",
                default_path.display()
            )
        })?;
        return Ok(Bootstrap::Created(default_path.to_path_buf()));
    }
    file.load()?;
    Ok(Bootstrap::Loaded(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::DEFAULT_ACCOUNT;
    use tempfile::tempdir;

    #[test]
    fn missing_default_file_is_created() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.yaml");

        match load_config_at(None, &path)? {
            Bootstrap::Created(created) => assert_eq!(created, path),
            other => panic!("expected Created, got {other:?}"),
        }
        assert!(path.is_file());

        // the second run loads what the first one wrote
        match load_config_at(None, &path)? {
            Bootstrap::Loaded(file) => {
                assert_eq!(file.model().accounts.len(), 1);
                assert!(file.model().accounts.contains_key(DEFAULT_ACCOUNT));
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn explicit_file_must_exist() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("nope.yaml");
        let err = load_config_at(Some(&missing), &dir.path().join("default.yaml")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(!dir.path().join("default.yaml").exists());
        Ok(())
    }

    #[test]
    fn explicit_file_is_loaded() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ads.yaml");
        fs::write(
            &path,
            "accounts:\n  default:\n    customer_id: 123-456-7890\nignore_fields: [resourceName]\n",
        )?;

        let Bootstrap::Loaded(file) = load_config_at(Some(&path), &dir.path().join("x.yaml"))?
        else {
            panic!("expected Loaded");
        };
        assert_eq!(file.model().account()?.customer_id, "123-456-7890");
        assert_eq!(file.model().ignore_fields, vec!["resourceName".to_string()]);
        Ok(())
    }

    #[test]
    fn malformed_yaml_names_the_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "accounts: [unclosed")?;
        let err = load_config_at(Some(&path), &path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.yaml"));
        Ok(())
    }
}
