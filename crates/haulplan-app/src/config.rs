//! Configuration management for haulplan
//!
//! Config stored at: ~/.config/haulplan/config.json

use std::path::PathBuf;

use haulplan_domain::service::DEFAULT_MAX_CANDIDATES;
use haulplan_types::{ConfigError, OutputFormat, Result};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Quote store directory override
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Truck catalog TOML (built-in catalog when unset)
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Legal threshold TOML (federal defaults when unset)
    #[serde(default)]
    pub thresholds_path: Option<PathBuf>,

    /// Tenant fee schedule TOML
    #[serde(default)]
    pub fee_schedule_path: Option<PathBuf>,

    /// Upper bound on truck configurations evaluated per plan
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Evaluate candidate trucks on worker threads
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Tenant new quotes are created for
    #[serde(default = "default_tenant")]
    pub tenant_id: String,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

fn default_true() -> bool {
    true
}

fn default_tenant() -> String {
    "default".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_format: default_output_format(),
            store_dir: None,
            catalog_path: None,
            thresholds_path: None,
            fee_schedule_path: None,
            max_candidates: default_max_candidates(),
            parallel: true,
            tenant_id: default_tenant(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("haulplan");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the quote store directory path
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }

        let store_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("haulplan");
        Ok(store_dir)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_json(&content)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse a config document; missing fields take their defaults
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .map_err(|e| ConfigError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }
}

fn display_path(path: &Option<PathBuf>, fallback: &str) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Haulplan Configuration")?;
        writeln!(f, "======================")?;
        writeln!(f)?;
        writeln!(f, "Tenant:          {}", self.tenant_id)?;
        writeln!(f, "Output format:   {}", self.output_format)?;
        writeln!(
            f,
            "Store dir:       {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Truck catalog:   {}", display_path(&self.catalog_path, "(built-in)"))?;
        writeln!(
            f,
            "Thresholds:      {}",
            display_path(&self.thresholds_path, "(federal defaults)")
        )?;
        writeln!(
            f,
            "Fee schedule:    {}",
            display_path(&self.fee_schedule_path, "(none)")
        )?;
        writeln!(f, "Max candidates:  {}", self.max_candidates)?;
        writeln!(f, "Parallel:        {}", self.parallel)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:     {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_takes_defaults() {
        let config = Config::from_json(r#"{"output_format": "json", "tenant_id": "acme"}"#).unwrap();
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.tenant_id, "acme");
        assert_eq!(config.max_candidates, DEFAULT_MAX_CANDIDATES);
        assert!(config.parallel);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_store_dir_override() {
        let config = Config {
            store_dir: Some(PathBuf::from("/tmp/quotes")),
            ..Config::default()
        };
        assert_eq!(config.store_dir().unwrap(), PathBuf::from("/tmp/quotes"));
    }

    #[test]
    fn test_bad_document_is_parse_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(
            err,
            haulplan_types::Error::Config(ConfigError::ParseError(_))
        ));
    }
}
