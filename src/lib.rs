//! # Effective Set
//!
//! **Provenance-aware parameter trees for environment generation.**
//!
//! A run collects parameters from many source files, remembers where each
//! value came from, and writes the result as two YAML documents: one with
//! ordinary parameters and one with credentials.
//!
//! # Core Properties
//!
//! - **Provenance**: every value may carry the file it came from, written back
//!   as an inline `# origin` comment when traceability is on
//! - **Partitioning**: secured values are split out structurally, never by
//!   key name, and empty branches are dropped
//! - **Memory hygiene**: the secure side and credential strings are zeroized
//!   on drop and redacted from `Debug`
//!
//! # Example
//!
//! ```rust,no_run
//! use effective_set::{FileDataConverter, OutputConfig, Parameter, ParameterMap};
//!
//! # async fn run() -> effective_set::Result<()> {
//! let mut params = ParameterMap::new();
//! params.insert("paramString".into(), Parameter::new("value").with_origin("env.yml"));
//! params.insert(
//!     "paramSecret".into(),
//!     Parameter::new("hunter2").with_origin("creds.yml").secured(true),
//! );
//!
//! let converter = FileDataConverter::from_config(&OutputConfig::default());
//! converter.write_effective_set(&params, "/tmp/out").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

// Core modules
mod config;
mod convert;
mod defaults;
mod errors;
mod logging;
mod parameter;
mod partition;
mod registry;
mod render;
mod sbom;

// Re-export core types for public API
pub use config::{
    EffectiveSetConfig, LogFormat, LogLevel, LoggingConfig, OutputConfig, ValidationMode,
};
pub use convert::{FileDataConverter, WrittenFiles};
pub use errors::{BoxError, EffectiveSetError, ErrorCode, ErrorKind, Result};
pub use logging::{effective_level, init as init_logging, LOG_LEVEL_ENV};
pub use parameter::{strip_tree, to_tree, Node, Parameter, ParameterMap, Scalar, Tree};
pub use partition::{partition, split_by_secure, Partition, SecureParameters};
pub use registry::{DockerConfig, HelmConfig, MavenConfig, ProtectedString, RegistryDefinition};
pub use render::{CommentPolicy, ProvenanceRenderer};
pub use sbom::{Bom, Component, Metadata, Property, BOM_FORMAT};

/// Configuration schema version.
pub const CONFIG_VERSION: u32 = 1;
