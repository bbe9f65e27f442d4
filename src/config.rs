//! Configuration for the NIUC verification core and its ambient pipeline
//! wrapper.
//!
//! Layered configuration: compiled secure defaults, overridable by a
//! config file (YAML/TOML/JSON), overridable in turn by environment
//! variables.
//!
//! ## Configuration hierarchy
//!
//! 1. Compiled defaults (secure by default — `FailMode::Closed`,
//!    `RuntimeMode::Block`).
//! 2. Config file (`niuc.toml`, `niuc.yaml`, or `niuc.json`).
//! 3. Environment variables (`NIUC_*`).
//!
//! Note that [`FailMode`] and [`RuntimeMode`] govern only the
//! *ambient pipeline* behavior (see [`crate::pipeline`]) — the pure core
//! (`verify`/`process`) always computes its fail-closed
//! `VerificationResult`/certificate regardless of this configuration.
//! `FailMode` only controls whether the executor enforces a `Block`
//! outcome or overrides it to an audited allow.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

use crate::gate::RuntimeMode;
use crate::provenance::{
    SizeLimits, MAX_SEGMENTS, MAX_SEGMENT_BYTES, MAX_SOURCE_ID_CHARS, MAX_TOTAL_BYTES,
};

/// Errors that can occur while building a [`NiucPolicy`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file at {path}: {source}")]
    FileRead {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse {format} config: {source}")]
    ParseError {
        /// Format that failed to parse (YAML, TOML, JSON).
        format: String,
        /// Underlying parse error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Unsupported or unrecognized configuration file extension.
    #[error("unsupported config file format: {message}")]
    UnsupportedFormat {
        /// Description of the problem.
        message: String,
    },

    /// Configuration validation failed.
    #[error("policy validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// An environment variable held a value that could not be parsed.
    #[error("failed to parse environment variable {key}: {message}")]
    EnvParse {
        /// Environment variable key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Behavior of the ambient pipeline wrapper when a `Block` outcome occurs.
///
/// This has no effect on the pure core — `verify` and `process` always
/// compute their result and certificate the same way regardless of
/// `FailMode`. It only controls whether [`crate::pipeline::NiucStage`]'s
/// caller (the `PipelineExecutor`) turns a block into an enforced refusal
/// or an audited allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
    /// Enforce the block.
    Closed,
    /// Allow the request through but log the security event.
    Open,
    /// Log the event and continue (audit-only mode).
    LogOnly,
}

impl Default for FailMode {
    fn default() -> Self {
        Self::Closed // secure by default
    }
}

/// Top-level policy governing a [`crate::pipeline::NiucStage`] deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NiucPolicy {
    /// Policy version, for operator-facing compatibility tracking.
    #[validate(length(min = 1))]
    pub version: String,

    /// Global enable/disable flag for the stage.
    pub enabled: bool,

    /// What the ambient pipeline does with a `Block` outcome.
    pub fail_mode: FailMode,

    /// Which runtime gate mode `verify`'s caller should run in.
    pub runtime_mode: RuntimeMode,

    /// Maximum size of a single segment, in bytes. Mirrors the
    /// specification's 1 MiB-per-segment bound.
    #[validate(range(min = 1))]
    pub max_segment_bytes: usize,

    /// Maximum combined size of all segments, in bytes. Mirrors the
    /// specification's 10 MiB total bound.
    #[validate(range(min = 1))]
    pub max_total_bytes: usize,

    /// Maximum number of segments accepted in one call.
    #[validate(range(min = 1))]
    pub max_segments: usize,

    /// Maximum length of a `source_id` string, in characters.
    #[validate(range(min = 1))]
    pub max_source_id_chars: usize,
}

/// Default per-segment size bound: mirrors [`crate::provenance::MAX_SEGMENT_BYTES`].
pub const DEFAULT_MAX_SEGMENT_BYTES: usize = MAX_SEGMENT_BYTES;
/// Default total-input size bound: mirrors [`crate::provenance::MAX_TOTAL_BYTES`].
pub const DEFAULT_MAX_TOTAL_BYTES: usize = MAX_TOTAL_BYTES;
/// Default maximum segment count: mirrors [`crate::provenance::MAX_SEGMENTS`].
pub const DEFAULT_MAX_SEGMENTS: usize = MAX_SEGMENTS;
/// Default maximum `source_id` length: mirrors [`crate::provenance::MAX_SOURCE_ID_CHARS`].
pub const DEFAULT_MAX_SOURCE_ID_CHARS: usize = MAX_SOURCE_ID_CHARS;

impl Default for NiucPolicy {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            enabled: true,
            fail_mode: FailMode::Closed,
            runtime_mode: RuntimeMode::Block,
            max_segment_bytes: DEFAULT_MAX_SEGMENT_BYTES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_segments: DEFAULT_MAX_SEGMENTS,
            max_source_id_chars: DEFAULT_MAX_SOURCE_ID_CHARS,
        }
    }
}

impl NiucPolicy {
    /// Validate internal consistency beyond what `#[validate(...)]` checks
    /// (field-level attributes can't express `a <= b` across fields).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`]-shaped inconsistency as a plain
    /// string error wrapped by the caller; see [`PolicyBuilder::build`].
    fn check_consistency(&self) -> Result<(), String> {
        if self.max_segment_bytes > self.max_total_bytes {
            return Err(format!(
                "max_segment_bytes ({}) must not exceed max_total_bytes ({})",
                self.max_segment_bytes, self.max_total_bytes
            ));
        }
        Ok(())
    }

    /// Convert this policy's size-bound fields into a
    /// [`SizeLimits`] for [`crate::checker::verify_with_limits`] and
    /// [`crate::gate::process_with_limits`] to enforce.
    #[must_use]
    pub fn size_limits(&self) -> SizeLimits {
        SizeLimits {
            max_segment_bytes: self.max_segment_bytes,
            max_total_bytes: self.max_total_bytes,
            max_segments: self.max_segments,
            max_source_id_chars: self.max_source_id_chars,
        }
    }
}

/// Builder for constructing a [`NiucPolicy`] from layered sources.
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    base: NiucPolicy,
    use_env: bool,
}

impl PolicyBuilder {
    /// Start from the compiled secure defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: NiucPolicy::default(),
            use_env: false,
        }
    }

    /// Load policy from a configuration file (YAML, TOML, or JSON,
    /// selected by extension).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let policy: NiucPolicy = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    format: "YAML".to_string(),
                    source: Box::new(e),
                })?
            }
            Some("toml") => toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                format: "TOML".to_string(),
                source: Box::new(e),
            })?,
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                    format: "JSON".to_string(),
                    source: Box::new(e),
                })?
            }
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    message: "file extension must be .yaml, .yml, .toml, or .json".to_string(),
                });
            }
        };

        self.base = policy;
        Ok(self)
    }

    /// Enable loading overrides from environment variables.
    ///
    /// Looks for variables prefixed with `NIUC_`, e.g.:
    /// - `NIUC_ENABLED=false`
    /// - `NIUC_FAIL_MODE=open`
    /// - `NIUC_RUNTIME_MODE=certified_rewrite`
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    /// Build the final policy, applying environment overrides and then
    /// validating.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails or an environment
    /// variable holds an unparseable value.
    pub fn build(mut self) -> Result<NiucPolicy, ConfigError> {
        if self.use_env {
            dotenvy::dotenv().ok();

            if let Ok(enabled) = std::env::var("NIUC_ENABLED") {
                self.base.enabled = enabled.parse().map_err(|_| ConfigError::EnvParse {
                    key: "NIUC_ENABLED".to_string(),
                    message: "must be 'true' or 'false'".to_string(),
                })?;
            }

            if let Ok(fail_mode) = std::env::var("NIUC_FAIL_MODE") {
                self.base.fail_mode = match fail_mode.to_lowercase().as_str() {
                    "closed" => FailMode::Closed,
                    "open" => FailMode::Open,
                    "log_only" | "logonly" => FailMode::LogOnly,
                    _ => {
                        return Err(ConfigError::EnvParse {
                            key: "NIUC_FAIL_MODE".to_string(),
                            message: "must be 'closed', 'open', or 'log_only'".to_string(),
                        });
                    }
                };
            }

            if let Ok(runtime_mode) = std::env::var("NIUC_RUNTIME_MODE") {
                self.base.runtime_mode = match runtime_mode.to_lowercase().as_str() {
                    "block" => RuntimeMode::Block,
                    "certified_rewrite" | "certifiedrewrite" => RuntimeMode::CertifiedRewrite,
                    _ => {
                        return Err(ConfigError::EnvParse {
                            key: "NIUC_RUNTIME_MODE".to_string(),
                            message: "must be 'block' or 'certified_rewrite'".to_string(),
                        });
                    }
                };
            }
        }

        self.base.validate()?;
        self.base
            .check_consistency()
            .map_err(|message| ConfigError::EnvParse {
                key: "max_segment_bytes/max_total_bytes".to_string(),
                message,
            })?;

        Ok(self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_secure_by_default() {
        let policy = NiucPolicy::default();
        assert!(policy.enabled);
        assert_eq!(policy.fail_mode, FailMode::Closed);
        assert_eq!(policy.runtime_mode, RuntimeMode::Block);
        assert_eq!(policy.max_segment_bytes, DEFAULT_MAX_SEGMENT_BYTES);
    }

    #[test]
    fn builder_with_no_sources_yields_default() {
        let policy = PolicyBuilder::new().build().unwrap();
        assert!(policy.enabled);
    }

    #[test]
    fn fail_mode_serializes_snake_case() {
        let json = serde_json::to_string(&FailMode::LogOnly).unwrap();
        assert_eq!(json, r#""log_only""#);
        let parsed: FailMode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, FailMode::LogOnly);
    }

    #[test]
    fn inconsistent_bounds_rejected() {
        let mut base = NiucPolicy::default();
        base.max_segment_bytes = base.max_total_bytes + 1;
        let err = base.check_consistency();
        assert!(err.is_err());
    }

    #[test]
    fn loads_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("niuc.toml");
        std::fs::write(
            &path,
            r#"
            version = "2.0"
            enabled = true
            fail_mode = "open"
            runtime_mode = "certified_rewrite"
            max_segment_bytes = 2048
            max_total_bytes = 4096
            max_segments = 10
            max_source_id_chars = 64
            "#,
        )
        .unwrap();

        let policy = PolicyBuilder::new().with_file(&path).unwrap().build().unwrap();
        assert_eq!(policy.version, "2.0");
        assert_eq!(policy.fail_mode, FailMode::Open);
        assert_eq!(policy.runtime_mode, RuntimeMode::CertifiedRewrite);
    }

    #[test]
    fn unsupported_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("niuc.ini");
        std::fs::write(&path, "version=1.0").unwrap();

        let result = PolicyBuilder::new().with_file(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }
}
