//! Default values for configuration.

use crate::{LogFormat, LogLevel, CONFIG_VERSION};

#[inline]
#[must_use]
pub(crate) fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Destination names that are always written without provenance comments.
#[inline]
#[must_use]
pub(crate) fn default_uncommented_files() -> Box<[String]> {
    vec!["mapping.yaml".to_string()].into_boxed_slice()
}

#[inline]
#[must_use]
pub(crate) fn default_parameters_file() -> String {
    "parameters.yaml".to_string()
}

#[inline]
#[must_use]
pub(crate) fn default_credentials_file() -> String {
    "credentials.yaml".to_string()
}

#[inline]
#[must_use]
pub(crate) fn default_log_format() -> LogFormat {
    LogFormat::Text
}

#[inline]
#[must_use]
pub(crate) fn default_log_level() -> LogLevel {
    LogLevel::Info
}
