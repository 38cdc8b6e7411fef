//! Generator configuration.
//!
//! This module defines the **wiring** of an effective-set run:
//! - WHERE output lands (file names for each partition)
//! - WHETHER provenance comments are written, and which files never get them
//! - HOW the run logs
//!
//! It does NOT define how parameters are merged or classified.

use crate::defaults::*;
use crate::errors::{self, FileNameValidationError};
use crate::render::CommentPolicy;
use crate::{Result, CONFIG_VERSION};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Validation strictness level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Standard validation (names are present, bare and distinct)
    Standard,

    /// Strict validation (output names must also carry a YAML extension)
    Strict,
}

/// Master configuration for an effective-set run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveSetConfig {
    /// Configuration schema version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Output file configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Output file configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write origin comments next to values
    #[serde(default)]
    pub enable_traceability: bool,

    /// File names that are always written without comments
    #[serde(default = "default_uncommented_files")]
    pub uncommented_files: Box<[String]>,

    /// File receiving the non-secure partition
    #[serde(default = "default_parameters_file")]
    pub parameters_file: String,

    /// File receiving the secure partition
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (machine-parseable)
    Json,
    /// Plain text format (human-readable)
    Text,
}

/// Log severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Trace messages
    Trace,
    /// Debug messages
    Debug,
    /// Informational messages
    Info,
    /// Warning messages
    Warn,
    /// Error messages
    Error,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enable_traceability: false,
            uncommented_files: default_uncommented_files(),
            parameters_file: default_parameters_file(),
            credentials_file: default_credentials_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for EffectiveSetConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl OutputConfig {
    /// Serializer comment policy for this output configuration.
    #[must_use]
    pub fn comment_policy(&self) -> CommentPolicy {
        CommentPolicy::new(self.enable_traceability)
            .with_excluded_files(self.uncommented_files.iter().cloned())
    }
}

impl EffectiveSetConfig {
    /// Load configuration from a TOML file with standard validation.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, TOML is invalid, or validation fails.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_mode(path, ValidationMode::Standard).await
    }

    /// Load configuration with specific validation mode.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, TOML is invalid, or validation fails.
    pub async fn from_file_with_mode<P: AsRef<Path>>(path: P, mode: ValidationMode) -> Result<Self> {
        let path = path.as_ref();

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| errors::io_read_error("load_config", path, e))?;

        Self::from_toml_str(&contents, mode)
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns error if TOML is invalid, the version does not match, or validation fails.
    pub fn from_toml_str(contents: &str, mode: ValidationMode) -> Result<Self> {
        let config: EffectiveSetConfig = toml::from_str(contents).map_err(|e| {
            let location = e
                .span()
                .map(|s| format!("line {}", contents[..s.start].matches('\n').count() + 1))
                .unwrap_or_else(|| "unknown location".to_string());
            let details = format!("Invalid TOML syntax at {}: {}", location, e.message());
            errors::parse_error("parse_config_toml", details, e)
        })?;

        if config.version != CONFIG_VERSION {
            let message = if config.version > CONFIG_VERSION {
                "Configuration version too new - upgrade generator"
            } else {
                "Configuration version outdated - update config"
            };

            return Err(errors::version_error(
                "validate_config_version",
                config.version,
                CONFIG_VERSION,
                message,
            ));
        }

        config.validate_with_mode(mode)?;

        Ok(config)
    }

    /// Validate configuration (standard mode).
    pub fn validate(&self) -> Result<()> {
        self.validate_with_mode(ValidationMode::Standard)
    }

    /// Validate configuration with specific mode.
    pub fn validate_with_mode(&self, mode: ValidationMode) -> Result<()> {
        self.validate_output(mode)
    }

    fn validate_output(&self, mode: ValidationMode) -> Result<()> {
        let output = &self.output;
        let named = [
            ("output.parameters_file", output.parameters_file.as_str()),
            ("output.credentials_file", output.credentials_file.as_str()),
        ];

        for (field, name) in named {
            validate_file_name(field, name)?;
            if mode == ValidationMode::Strict && !has_yaml_extension(name) {
                return Err(FileNameValidationError::not_yaml(field, name, "validate_output"));
            }
        }

        if output.parameters_file == output.credentials_file {
            return Err(FileNameValidationError::collision(
                "output.parameters_file",
                "output.credentials_file",
                &output.parameters_file,
                "validate_output",
            ));
        }

        for name in output.uncommented_files.iter() {
            validate_file_name("output.uncommented_files", name)?;
        }

        Ok(())
    }
}

fn validate_file_name(field: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(errors::missing_required("validate_output", field));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(FileNameValidationError::not_bare(field, name, "validate_output"));
    }
    Ok(())
}

fn has_yaml_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn default_config_validates() {
        let config = EffectiveSetConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.validate_with_mode(ValidationMode::Strict).is_ok());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = EffectiveSetConfig::from_toml_str("", ValidationMode::Standard).unwrap();
        assert_eq!(config, EffectiveSetConfig::default());
        assert_eq!(&*config.output.uncommented_files, ["mapping.yaml".to_string()]);
    }

    #[test]
    fn full_document_parses() {
        let toml = r#"
            version = 1

            [output]
            enable_traceability = true
            uncommented_files = ["mapping.yaml", "raw.yaml"]
            parameters_file = "deployment-parameters.yaml"
            credentials_file = "credentials.yaml"

            [logging]
            level = "DEBUG"
            format = "json"
        "#;
        let config = EffectiveSetConfig::from_toml_str(toml, ValidationMode::Strict).unwrap();
        assert!(config.output.enable_traceability);
        assert_eq!(config.output.parameters_file, "deployment-parameters.yaml");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn version_mismatch_rejected() {
        let err = EffectiveSetConfig::from_toml_str("version = 2", ValidationMode::Standard)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("too new"));
    }

    #[test]
    fn syntax_error_reports_line() {
        let err = EffectiveSetConfig::from_toml_str("version = 1\n[output\n", ValidationMode::Standard)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.details().contains("line 2"));
    }

    #[test]
    fn validation_catches_path_in_file_name() {
        let mut config = EffectiveSetConfig::default();
        config.output.parameters_file = "nested/parameters.yaml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_catches_empty_file_name() {
        let mut config = EffectiveSetConfig::default();
        config.output.credentials_file = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_catches_collision() {
        let mut config = EffectiveSetConfig::default();
        config.output.credentials_file = config.output.parameters_file.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn strict_mode_requires_yaml_extension() {
        let mut config = EffectiveSetConfig::default();
        config.output.parameters_file = "parameters.txt".to_string();
        assert!(config.validate().is_ok());
        assert!(config.validate_with_mode(ValidationMode::Strict).is_err());
    }

    #[test]
    fn comment_policy_follows_output_settings() {
        let mut output = OutputConfig::default();
        assert!(!output.comment_policy().is_enabled());

        output.enable_traceability = true;
        output.uncommented_files = vec!["plain.yaml".to_string()].into_boxed_slice();
        let policy = output.comment_policy();
        assert!(policy.allows(Path::new("mapping.yaml"), true));
        assert!(!policy.allows(Path::new("plain.yaml"), true));
    }
}
