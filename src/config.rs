//! Configuration for FormFold
//!
//! All deployment-tunable constants live here: storage locations, artifact
//! expiry windows, and token generation parameters. The defaults match the
//! reference deployment (24 hour export TTL, 1 hour pre-upload window,
//! 12-character share tokens). Configuration can be loaded from a TOML file
//! or constructed programmatically.

use crate::error::{FormFoldError, FormFoldResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for a FormFold instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormFoldConfig {
    /// Directory holding the embedded database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory for uploaded submission files (claimed uploads)
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    /// Directory for staged pre-uploads awaiting a submission
    #[serde(default = "default_temp_uploads_dir")]
    pub temp_uploads_dir: PathBuf,

    /// Directory for generated CSV export artifacts
    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,

    /// Base URL prefix used when emitting attachment download links
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,

    /// Seconds an export artifact stays servable after creation
    #[serde(default = "default_export_ttl_secs")]
    pub export_ttl_secs: i64,

    /// Seconds an unclaimed pre-upload survives before it is garbage
    #[serde(default = "default_temp_upload_ttl_secs")]
    pub temp_upload_ttl_secs: i64,

    /// Length of generated public share tokens
    #[serde(default = "default_share_token_length")]
    pub share_token_length: usize,

    /// Attempts at generating a unique share token before giving up
    #[serde(default = "default_token_max_retries")]
    pub token_max_retries: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/db")
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("data/uploads")
}

fn default_temp_uploads_dir() -> PathBuf {
    PathBuf::from("data/uploads/tmp")
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from("data/exports")
}

fn default_download_base_url() -> String {
    "/files".to_string()
}

fn default_export_ttl_secs() -> i64 {
    24 * 60 * 60
}

fn default_temp_upload_ttl_secs() -> i64 {
    60 * 60
}

fn default_share_token_length() -> usize {
    12
}

fn default_token_max_retries() -> usize {
    5
}

impl Default for FormFoldConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            uploads_dir: default_uploads_dir(),
            temp_uploads_dir: default_temp_uploads_dir(),
            exports_dir: default_exports_dir(),
            download_base_url: default_download_base_url(),
            export_ttl_secs: default_export_ttl_secs(),
            temp_upload_ttl_secs: default_temp_upload_ttl_secs(),
            share_token_length: default_share_token_length(),
            token_max_retries: default_token_max_retries(),
        }
    }
}

impl FormFoldConfig {
    /// Loads configuration from a TOML file, falling back to defaults for
    /// any omitted keys.
    pub fn from_file(path: impl AsRef<Path>) -> FormFoldResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: FormFoldConfig = toml::from_str(&contents)
            .map_err(|e| FormFoldError::Serialization(format!("Invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration rooted entirely under one base directory.
    /// Useful for tests and single-directory deployments.
    pub fn rooted_at(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            data_dir: base.join("db"),
            uploads_dir: base.join("uploads"),
            temp_uploads_dir: base.join("uploads/tmp"),
            exports_dir: base.join("exports"),
            ..Self::default()
        }
    }

    /// Checks tunables for values that would misbehave at runtime.
    pub fn validate(&self) -> FormFoldResult<()> {
        if self.export_ttl_secs <= 0 {
            return Err(FormFoldError::Serialization(
                "export_ttl_secs must be positive".to_string(),
            ));
        }
        if self.temp_upload_ttl_secs <= 0 {
            return Err(FormFoldError::Serialization(
                "temp_upload_ttl_secs must be positive".to_string(),
            ));
        }
        if self.share_token_length == 0 {
            return Err(FormFoldError::Serialization(
                "share_token_length must be non-zero".to_string(),
            ));
        }
        if self.token_max_retries == 0 {
            return Err(FormFoldError::Serialization(
                "token_max_retries must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = FormFoldConfig::default();
        assert_eq!(config.export_ttl_secs, 86_400);
        assert_eq!(config.temp_upload_ttl_secs, 3_600);
        assert_eq!(config.share_token_length, 12);
        assert_eq!(config.token_max_retries, 5);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: FormFoldConfig = toml::from_str("export_ttl_secs = 3600").unwrap();
        assert_eq!(config.export_ttl_secs, 3_600);
        assert_eq!(config.share_token_length, 12);
        assert_eq!(config.data_dir, PathBuf::from("data/db"));
    }

    #[test]
    fn rooted_config_keeps_everything_under_base() {
        let config = FormFoldConfig::rooted_at("/tmp/formfold-test");
        assert!(config.uploads_dir.starts_with("/tmp/formfold-test"));
        assert!(config.exports_dir.starts_with("/tmp/formfold-test"));
    }

    #[test]
    fn zero_ttl_rejected() {
        let config = FormFoldConfig {
            export_ttl_secs: 0,
            ..FormFoldConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
