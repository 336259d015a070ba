//! Configuration management for the s3events CLI
//!
//! Config file location: ~/.s3events/config.toml
//!
//! Example config:
//! ```toml
//! [default]
//! region = "eu-west-1"
//! batch_size = 30
//!
//! [localstack]
//! endpoint = "http://localhost:4566"
//! access_key = "test"
//! secret_key = "test"
//! path_style = true
//! filter_semantics = "last-rule-wins"
//! ```

use anyhow::{Context, Result};
use s3events_core::types::FilterSemantics;
use s3events_core::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// One profile of the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Custom endpoint URL (LocalStack, MinIO, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// AWS region; unset defers to the SDK region chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Path style S3 addressing
    #[serde(default)]
    pub path_style: bool,

    /// Objects dispatched concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub filter_semantics: FilterSemantics,

    /// Stop after the first batch with a failed dispatch
    #[serde(default = "default_true")]
    pub fail_fast: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: None,
            access_key: None,
            secret_key: None,
            path_style: false,
            batch_size: default_batch_size(),
            filter_semantics: FilterSemantics::default(),
            fail_fast: true,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Configuration file with multiple profiles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub profiles: BTreeMap<String, Config>,
}

impl ConfigFile {
    fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))
    }
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let home = directories::BaseDirs::new()
            .context("Could not determine home directory")?
            .home_dir()
            .to_path_buf();

        Ok(home.join(".s3events"))
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load a profile from the config file, then apply environment overrides
    pub fn load(profile: Option<&str>) -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?, profile)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load a profile from a specific file; missing file or profile yields defaults
    pub fn load_from(path: &Path, profile: Option<&str>) -> Result<Self> {
        let profile_name = profile.unwrap_or("default");
        let config_file = ConfigFile::read(path)?;

        Ok(config_file
            .profiles
            .get(profile_name)
            .cloned()
            .unwrap_or_default())
    }

    /// Apply `S3EVENTS_*` then `AWS_*` variables; the later source wins
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        const OVERRIDES: &[(&str, &str)] = &[
            ("S3EVENTS_ENDPOINT", "endpoint"),
            ("AWS_ENDPOINT_URL", "endpoint"),
            ("S3EVENTS_REGION", "region"),
            ("AWS_REGION", "region"),
            ("S3EVENTS_ACCESS_KEY", "access_key"),
            ("AWS_ACCESS_KEY_ID", "access_key"),
            ("S3EVENTS_SECRET_KEY", "secret_key"),
            ("AWS_SECRET_ACCESS_KEY", "secret_key"),
            ("S3EVENTS_BATCH_SIZE", "batch_size"),
            ("S3EVENTS_FILTER_SEMANTICS", "filter_semantics"),
            ("S3EVENTS_FAIL_FAST", "fail_fast"),
            ("S3EVENTS_LOG_LEVEL", "log_level"),
            ("S3EVENTS_LOG_FORMAT", "log_format"),
        ];

        for (var, key) in OVERRIDES {
            if let Some(value) = lookup(var) {
                self.set_value(key, &value)
                    .with_context(|| format!("Invalid value in {}", var))?;
            }
        }

        Ok(())
    }

    /// Save this profile, keeping the others in the file
    pub fn save(&self, profile: Option<&str>) -> Result<()> {
        self.save_to(&Self::config_path()?, profile)
    }

    pub fn save_to(&self, path: &Path, profile: Option<&str>) -> Result<()> {
        let mut config_file = ConfigFile::read(path)?;
        config_file
            .profiles
            .insert(profile.unwrap_or("default").to_string(), self.clone());
        config_file.write(path)
    }

    /// List all profiles
    pub fn list_profiles() -> Result<Vec<String>> {
        let config_file = ConfigFile::read(&Self::config_path()?)?;
        Ok(config_file.profiles.keys().cloned().collect())
    }

    /// Delete a profile
    pub fn delete_profile(profile: &str) -> Result<()> {
        Self::delete_profile_from(&Self::config_path()?, profile)
    }

    pub fn delete_profile_from(path: &Path, profile: &str) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let mut config_file = ConfigFile::read(path)?;
        if config_file.profiles.remove(profile).is_none() {
            anyhow::bail!("Profile not found: {}", profile);
        }
        config_file.write(path)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }

        if self.access_key.is_some() != self.secret_key.is_some() {
            anyhow::bail!(
                "access_key and secret_key must be set together. Use 's3events configure set'"
            );
        }

        Ok(())
    }

    /// Get a config value by key name
    pub fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "endpoint" => self.endpoint.clone(),
            "region" => self.region.clone(),
            "access_key" => self.access_key.clone(),
            "secret_key" => self.secret_key.as_ref().map(|_| "***".to_string()),
            "path_style" => Some(self.path_style.to_string()),
            "batch_size" => Some(self.batch_size.to_string()),
            "filter_semantics" => Some(self.filter_semantics.to_string()),
            "fail_fast" => Some(self.fail_fast.to_string()),
            "log_level" => Some(self.log_level.clone()),
            "log_format" => Some(
                match self.log_format {
                    LogFormat::Pretty => "pretty",
                    LogFormat::Json => "json",
                }
                .to_string(),
            ),
            _ => None,
        }
    }

    /// Set a config value by key name
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "endpoint" => self.endpoint = Some(value.to_string()),
            "region" => self.region = Some(value.to_string()),
            "access_key" => self.access_key = Some(value.to_string()),
            "secret_key" => self.secret_key = Some(value.to_string()),
            "path_style" => self.path_style = value.parse()?,
            "batch_size" => self.batch_size = value.parse()?,
            "filter_semantics" => self.filter_semantics = value.parse()?,
            "fail_fast" => self.fail_fast = value.parse()?,
            "log_level" => self.log_level = value.to_string(),
            "log_format" => {
                self.log_format = <LogFormat as clap::ValueEnum>::from_str(value, true)
                    .map_err(|e| anyhow::anyhow!(e))?
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get all config keys
    pub fn keys() -> &'static [&'static str] {
        &[
            "endpoint",
            "region",
            "access_key",
            "secret_key",
            "path_style",
            "batch_size",
            "filter_semantics",
            "fail_fast",
            "log_level",
            "log_format",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.region.is_none());
        assert_eq!(config.batch_size, 30);
        assert!(config.fail_fast);
        assert_eq!(config.filter_semantics, FilterSemantics::AllRules);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut local = Config::default();
        local.endpoint = Some("http://localhost:4566".to_string());
        local.path_style = true;
        local.filter_semantics = FilterSemantics::LastRuleWins;
        local.save_to(&path, Some("localstack")).unwrap();

        let mut default = Config::default();
        default.region = Some("eu-west-1".to_string());
        default.save_to(&path, None).unwrap();

        assert_eq!(Config::load_from(&path, Some("localstack")).unwrap(), local);
        assert_eq!(Config::load_from(&path, None).unwrap(), default);
        assert_eq!(Config::load_from(&path, Some("missing")).unwrap(), Config::default());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[localstack]"));
        assert!(content.contains("filter_semantics = \"last-rule-wins\""));

        Config::delete_profile_from(&path, "localstack").unwrap();
        assert_eq!(Config::load_from(&path, Some("localstack")).unwrap(), Config::default());
        assert!(Config::delete_profile_from(&path, "localstack").is_err());
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml"), None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("S3EVENTS_REGION", "eu-central-1"),
            ("AWS_REGION", "ap-south-1"),
            ("S3EVENTS_BATCH_SIZE", "5"),
            ("S3EVENTS_FAIL_FAST", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.region.as_deref(), Some("ap-south-1"));
        assert_eq!(config.batch_size, 5);
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = Config::default();
        let result = config.apply_env(|name| {
            (name == "S3EVENTS_FILTER_SEMANTICS").then(|| "sometimes".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_get_and_set_values() {
        let mut config = Config::default();
        config.set_value("secret_key", "hunter2").unwrap();
        config.set_value("log_format", "json").unwrap();
        config.set_value("batch_size", "12").unwrap();

        assert_eq!(config.get_value("secret_key").as_deref(), Some("***"));
        assert_eq!(config.get_value("log_format").as_deref(), Some("json"));
        assert_eq!(config.get_value("batch_size").as_deref(), Some("12"));
        assert!(config.set_value("batch_size", "many").is_err());
        assert!(config.set_value("color", "blue").is_err());

        for key in Config::keys() {
            assert!(
                matches!(*key, "endpoint" | "region" | "access_key")
                    || config.get_value(key).is_some(),
                "{} should have a value",
                key
            );
        }
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        config.access_key = Some("AKIA".to_string());
        assert!(config.validate().is_err());

        config.secret_key = Some("secret".to_string());
        assert!(config.validate().is_ok());

        config.batch_size = 0;
        assert!(config.validate().is_err());
    }
}
