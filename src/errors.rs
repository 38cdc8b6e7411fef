//! Centralized error definitions and helpers for effective-set.
//!
//! This module provides:
//! - Type-safe error construction
//! - Consistent error metadata
//! - A coarse [`ErrorKind`] split between I/O, parse and configuration failures
//!
//! Call sites never build [`EffectiveSetError`] by hand. They go through the
//! helpers below so that codes and metadata keys stay uniform.

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Boxed error used as the preserved cause of a failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, EffectiveSetError>;

/// Broad failure category.
///
/// `Io` covers unreadable or unwritable storage; `Parse` covers documents that
/// were read but are malformed (bad YAML/JSON/TOML, bad base64, wrong shape);
/// `Config` covers documents that parsed but failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Storage could not be read or written.
    Io,
    /// Content could not be decoded or deserialized.
    Parse,
    /// Content deserialized but is semantically invalid.
    Config,
}

/// Stable error code attached to every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Reading a file failed.
    IoReadFailed,
    /// Writing a file failed.
    IoWriteFailed,
    /// A document had invalid syntax or an unexpected shape.
    ParseFailed,
    /// A base64 envelope could not be decoded.
    DecodeFailed,
    /// Configuration schema version mismatch.
    VersionMismatch,
    /// A required field is missing or empty.
    MissingRequired,
    /// A field has an invalid value.
    InvalidValue,
}

impl ErrorCode {
    /// Category this code belongs to.
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::IoReadFailed | Self::IoWriteFailed => ErrorKind::Io,
            Self::ParseFailed | Self::DecodeFailed => ErrorKind::Parse,
            Self::VersionMismatch | Self::MissingRequired | Self::InvalidValue => ErrorKind::Config,
        }
    }

    /// Short identifier used in log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IoReadFailed => "IO_READ_FAILED",
            Self::IoWriteFailed => "IO_WRITE_FAILED",
            Self::ParseFailed => "PARSE_FAILED",
            Self::DecodeFailed => "DECODE_FAILED",
            Self::VersionMismatch => "CFG_VERSION_MISMATCH",
            Self::MissingRequired => "CFG_MISSING_REQUIRED",
            Self::InvalidValue => "CFG_INVALID_VALUE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every fallible operation in this crate.
#[derive(Debug, Error)]
#[error("[{code}] {operation}: {details}")]
pub struct EffectiveSetError {
    code: ErrorCode,
    operation: String,
    details: String,
    metadata: Vec<(&'static str, String)>,
    #[source]
    source: Option<BoxError>,
}

impl EffectiveSetError {
    fn new(code: ErrorCode, operation: &str, details: impl Into<String>) -> Self {
        Self {
            code,
            operation: operation.to_owned(),
            details: details.into(),
            metadata: Vec::new(),
            source: None,
        }
    }

    /// Attach a key/value pair of diagnostic context.
    #[must_use]
    pub(crate) fn with_metadata(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.metadata.push((key, value.into()));
        self
    }

    #[must_use]
    pub(crate) fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Stable code of this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Category of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Name of the operation that failed.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Human readable details.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Diagnostic metadata, in insertion order.
    #[must_use]
    pub fn metadata(&self) -> &[(&'static str, String)] {
        &self.metadata
    }

    /// Look up a single metadata value.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True when the failure was a missing file rather than a broken one.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.source
            .as_ref()
            .and_then(|s| s.downcast_ref::<std::io::Error>())
            .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
    }
}

// ============================================================================
// ERROR CONSTRUCTION HELPERS
// ============================================================================

/// Document parsing failed.
///
/// Use when YAML/JSON/TOML syntax is invalid or the shape does not match.
#[inline]
pub(crate) fn parse_error(
    operation: &str,
    details: impl Into<String>,
    cause: impl Into<BoxError>,
) -> EffectiveSetError {
    EffectiveSetError::new(ErrorCode::ParseFailed, operation, details).with_source(cause)
}

/// Parse failure tied to a file on disk.
#[inline]
pub(crate) fn file_parse_error<P: AsRef<Path>>(
    operation: &str,
    path: P,
    cause: impl Into<BoxError>,
) -> EffectiveSetError {
    let path = path.as_ref().display().to_string();
    let cause = cause.into();
    EffectiveSetError::new(
        ErrorCode::ParseFailed,
        operation,
        format!("failed to read file {}: {}", path, cause),
    )
    .with_metadata("path", path)
    .with_source(cause)
}

/// Base64 envelope could not be decoded.
#[inline]
pub(crate) fn decode_error(operation: &str, cause: impl Into<BoxError>) -> EffectiveSetError {
    EffectiveSetError::new(
        ErrorCode::DecodeFailed,
        operation,
        "Failed to parse encoded content",
    )
    .with_source(cause)
}

/// Configuration version mismatch.
#[inline]
pub(crate) fn version_error(
    operation: &str,
    file_version: u32,
    expected_version: u32,
    message: impl Into<String>,
) -> EffectiveSetError {
    EffectiveSetError::new(ErrorCode::VersionMismatch, operation, message)
        .with_metadata("file_version", file_version.to_string())
        .with_metadata("expected_version", expected_version.to_string())
}

/// Required configuration field is missing or empty.
#[inline]
pub(crate) fn missing_required(operation: &str, field: &str) -> EffectiveSetError {
    EffectiveSetError::new(
        ErrorCode::MissingRequired,
        operation,
        format!("{} cannot be empty", field),
    )
    .with_metadata("field", field.to_owned())
}

/// Configuration field has invalid value.
#[inline]
pub(crate) fn invalid_value(
    operation: &str,
    field: &str,
    reason: impl Into<String>,
) -> EffectiveSetError {
    EffectiveSetError::new(ErrorCode::InvalidValue, operation, reason)
        .with_metadata("field", field.to_owned())
}

/// File I/O read operation failed.
#[inline]
pub(crate) fn io_read_error<P: AsRef<Path>>(
    operation: &str,
    path: P,
    error: std::io::Error,
) -> EffectiveSetError {
    let path = path.as_ref().display().to_string();
    EffectiveSetError::new(
        ErrorCode::IoReadFailed,
        operation,
        format!("cannot read {}: {}", path, error),
    )
    .with_metadata("path", path)
    .with_source(error)
}

/// File I/O write operation failed.
#[inline]
pub(crate) fn io_write_error<P: AsRef<Path>>(
    operation: &str,
    path: P,
    error: std::io::Error,
) -> EffectiveSetError {
    let path = path.as_ref().display().to_string();
    EffectiveSetError::new(
        ErrorCode::IoWriteFailed,
        operation,
        format!("cannot write {}: {}", path, error),
    )
    .with_metadata("path", path)
    .with_source(error)
}

// ============================================================================
// VALIDATION ERROR BUILDERS
// ============================================================================

/// Builder for output file name validation errors.
pub(crate) struct FileNameValidationError;

impl FileNameValidationError {
    /// Name contains a path separator.
    #[inline]
    pub fn not_bare(field: &str, name: &str, operation: &str) -> EffectiveSetError {
        invalid_value(
            operation,
            field,
            format!("{} must be a bare file name, got {:?}", field, name),
        )
        .with_metadata("file_name", name.to_owned())
    }

    /// Name lacks a YAML extension.
    #[inline]
    pub fn not_yaml(field: &str, name: &str, operation: &str) -> EffectiveSetError {
        invalid_value(
            operation,
            field,
            format!("{} must end with .yaml or .yml", field),
        )
        .with_metadata("file_name", name.to_owned())
    }

    /// Two outputs would land in the same file.
    #[inline]
    pub fn collision(first: &str, second: &str, name: &str, operation: &str) -> EffectiveSetError {
        invalid_value(
            operation,
            first,
            format!("{} and {} both resolve to {:?}", first, second, name),
        )
        .with_metadata("conflicting_field", second.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn codes_map_to_kinds() {
        assert_eq!(ErrorCode::IoReadFailed.kind(), ErrorKind::Io);
        assert_eq!(ErrorCode::IoWriteFailed.kind(), ErrorKind::Io);
        assert_eq!(ErrorCode::ParseFailed.kind(), ErrorKind::Parse);
        assert_eq!(ErrorCode::DecodeFailed.kind(), ErrorKind::Parse);
        assert_eq!(ErrorCode::InvalidValue.kind(), ErrorKind::Config);
    }

    #[test]
    fn version_error_includes_metadata() {
        let err = version_error("test_op", 2, 1, "version mismatch");
        assert_eq!(err.metadata_value("file_version"), Some("2"));
        assert_eq!(err.metadata_value("expected_version"), Some("1"));
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn display_carries_code_and_operation() {
        let err = missing_required("validate_output", "output.parameters_file");
        let text = err.to_string();
        assert!(text.contains("CFG_MISSING_REQUIRED"));
        assert!(text.contains("validate_output"));
        assert!(text.contains("output.parameters_file cannot be empty"));
    }

    #[test]
    fn io_error_preserves_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = io_read_error("read_input", "/nowhere.yaml", io);
        assert_eq!(err.code(), ErrorCode::IoReadFailed);
        assert!(err.is_not_found());
        assert!(err.source().is_some());
        assert_eq!(err.metadata_value("path"), Some("/nowhere.yaml"));
    }

    #[test]
    fn decode_error_is_parse_kind() {
        let err = decode_error("decode_and_parse", "bad padding");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("Failed to parse encoded content"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn file_name_helpers() {
        let err = FileNameValidationError::not_bare("output.parameters_file", "a/b.yaml", "op");
        assert_eq!(err.code(), ErrorCode::InvalidValue);
        assert_eq!(err.metadata_value("file_name"), Some("a/b.yaml"));

        let err = FileNameValidationError::collision("a", "b", "x.yaml", "op");
        assert_eq!(err.metadata_value("conflicting_field"), Some("b"));
    }
}
