/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pipeline configuration.
//!
//! ```yaml
//! default-content-type: text/html
//! temp-file-threshold: 1048576   # or null to never spill
//! ```

use quarto_encoding::MediaType;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Characters a capture buffer holds in memory before spilling to disk.
pub const DEFAULT_TEMP_FILE_THRESHOLD: u64 = 4 * 1024 * 1024;

/// Settings shared by every producer in a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Container content type for the outermost producer when the
    /// response has none.
    pub default_content_type: String,

    /// Capture buffer spill threshold in characters; `None` keeps
    /// everything in memory.
    pub temp_file_threshold: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_content_type: MediaType::Xhtml.content_type().to_string(),
            temp_file_threshold: Some(DEFAULT_TEMP_FILE_THRESHOLD),
        }
    }
}

impl PipelineConfig {
    /// Parse configuration from YAML. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The media type named by `default_content_type`.
    pub fn default_media_type(&self) -> Result<MediaType> {
        Ok(MediaType::by_content_type(&self.default_content_type)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.default_media_type().unwrap(), MediaType::Xhtml);
        assert_eq!(config.temp_file_threshold, Some(DEFAULT_TEMP_FILE_THRESHOLD));
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = PipelineConfig::from_yaml("default-content-type: text/html\n").unwrap();
        assert_eq!(config.default_media_type().unwrap(), MediaType::Html);
        assert_eq!(config.temp_file_threshold, Some(DEFAULT_TEMP_FILE_THRESHOLD));
    }

    #[test]
    fn test_from_yaml_disables_spilling() {
        let config = PipelineConfig::from_yaml("temp-file-threshold: null\n").unwrap();
        assert_eq!(config.temp_file_threshold, None);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_keys() {
        assert!(PipelineConfig::from_yaml("default-type: text/html\n").is_err());
    }

    #[test]
    fn test_unsupported_default_content_type() {
        let config = PipelineConfig {
            default_content_type: "image/png".to_string(),
            ..Default::default()
        };
        assert!(config.default_media_type().is_err());
    }
}
