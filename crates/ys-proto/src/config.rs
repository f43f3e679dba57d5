//! TOML-based deployment configuration for the codec.
//!
//! Whether a transport appends footer bytes after each record differs from
//! one deployment to the next, so the oversized-buffer policy is read from
//! configuration instead of being hard-wired.  Example:
//!
//! ```toml
//! [decode]
//! trailing_bytes = "allow"
//! max_trailing_bytes = 4
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, so an empty file (or a
//! missing `[decode]` table) yields the strict default: buffers must be
//! exactly the size of their kind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::protocol::codec::DecodePolicy;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level codec configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodecConfig {
    #[serde(default)]
    pub decode: DecodeConfig,
}

/// How trailing bytes after a record are treated.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrailingMode {
    /// Buffers longer than the record are rejected.
    #[default]
    Reject,
    /// Up to `max_trailing_bytes` extra bytes are ignored.
    Allow,
}

/// Decode settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecodeConfig {
    #[serde(default)]
    pub trailing_bytes: TrailingMode,
    /// Only consulted when `trailing_bytes = "allow"`.
    #[serde(default = "default_max_trailing_bytes")]
    pub max_trailing_bytes: usize,
}

fn default_max_trailing_bytes() -> usize {
    0
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            trailing_bytes: TrailingMode::default(),
            max_trailing_bytes: default_max_trailing_bytes(),
        }
    }
}

impl CodecConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid for this schema.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid TOML for this schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!("loaded codec config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The decode policy this configuration selects.
    pub fn decode_policy(&self) -> DecodePolicy {
        match self.decode.trailing_bytes {
            TrailingMode::Reject => DecodePolicy::strict(),
            TrailingMode::Allow => DecodePolicy::allow_trailing(self.decode.max_trailing_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::TrailingBytes;

    #[test]
    fn test_empty_config_is_strict() {
        let config = CodecConfig::from_toml_str("").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.decode_policy(), DecodePolicy::strict());
    }

    #[test]
    fn test_allow_mode_selects_footer_tolerance() {
        let config = CodecConfig::from_toml_str(
            r#"
            [decode]
            trailing_bytes = "allow"
            max_trailing_bytes = 4
            "#,
        )
        .unwrap();
        assert_eq!(
            config.decode_policy().trailing_bytes,
            TrailingBytes::Allow { max: 4 }
        );
    }

    #[test]
    fn test_max_is_ignored_in_reject_mode() {
        let config = CodecConfig::from_toml_str(
            r#"
            [decode]
            trailing_bytes = "reject"
            max_trailing_bytes = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.decode_policy(), DecodePolicy::strict());
    }

    #[test]
    fn test_unknown_mode_is_a_parse_error() {
        let result = CodecConfig::from_toml_str("[decode]\ntrailing_bytes = \"maybe\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CodecConfig {
            decode: DecodeConfig {
                trailing_bytes: TrailingMode::Allow,
                max_trailing_bytes: 2,
            },
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(CodecConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = CodecConfig::load("/nonexistent/ys-proto/codec.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_reads_file() {
        let path =
            std::env::temp_dir().join(format!("ys-proto-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[decode]\ntrailing_bytes = \"allow\"\nmax_trailing_bytes = 1\n")
            .unwrap();
        let config = CodecConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.decode_policy(), DecodePolicy::allow_trailing(1));
    }
}
