//! File conversion façade.
//!
//! Writes rendered trees to disk and reads structured documents back. Reads
//! come in two forms:
//!
//! - [`FileDataConverter::parse_input_file`] is for optional inputs. A file
//!   that cannot be read is logged and yields `Ok(None)`; a file that was read
//!   but is malformed is still an error.
//! - [`FileDataConverter::read_required`] returns every failure; for inputs the
//!   run cannot do without.

use crate::config::OutputConfig;
use crate::errors;
use crate::parameter::{to_tree, Node, ParameterMap, Tree};
use crate::partition::partition;
use crate::render::{CommentPolicy, ProvenanceRenderer};
use crate::sbom::Bom;
use crate::{ErrorKind, Result};
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use zeroize::{Zeroize, Zeroizing};

/// Paths written by [`FileDataConverter::write_effective_set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenFiles {
    /// Non-secure partition, if it had content.
    pub parameters: Option<PathBuf>,
    /// Secure partition, if it had content.
    pub credentials: Option<PathBuf>,
}

/// Reads and writes effective-set documents.
#[derive(Debug, Clone)]
pub struct FileDataConverter {
    policy: CommentPolicy,
    parameters_file: String,
    credentials_file: String,
}

impl FileDataConverter {
    /// Converter with the given comment policy and default output names.
    #[must_use]
    pub fn new(policy: CommentPolicy) -> Self {
        let output = OutputConfig::default();
        Self {
            policy,
            parameters_file: output.parameters_file,
            credentials_file: output.credentials_file,
        }
    }

    /// Converter driven by an output configuration.
    #[must_use]
    pub fn from_config(output: &OutputConfig) -> Self {
        Self {
            policy: output.comment_policy(),
            parameters_file: output.parameters_file.clone(),
            credentials_file: output.credentials_file.clone(),
        }
    }

    /// Comment policy in force.
    #[must_use]
    pub fn policy(&self) -> &CommentPolicy {
        &self.policy
    }

    // ================= WRITE =================

    /// Write `tree` to `path`, with comments if the policy's switch is on.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the destination cannot be written.
    pub async fn write_to_file<P: AsRef<Path>>(&self, tree: &Tree, path: P) -> Result<()> {
        self.write_with_traceability(tree, path, self.policy.is_enabled())
            .await
    }

    /// Write `tree` to `path`, with comments if `enable_traceability` is set
    /// and the destination is not excluded.
    ///
    /// An empty tree writes nothing. Otherwise the destination is replaced by
    /// the complete rendered document.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the destination cannot be written.
    pub async fn write_with_traceability<P: AsRef<Path>>(
        &self,
        tree: &Tree,
        path: P,
        enable_traceability: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        if tree.is_empty() {
            debug!(path = %path.display(), "skipping write of empty tree");
            return Ok(());
        }

        let document = self.render_document(tree, path, enable_traceability);

        tokio::fs::write(path, document.as_bytes())
            .await
            .map_err(|e| {
                error!(path = %path.display(), error = %e, "failed to write effective set file");
                errors::io_write_error("write_to_file", path, e)
            })?;

        debug!(
            path = %path.display(),
            bytes = document.len(),
            "wrote effective set file"
        );
        Ok(())
    }

    /// Render `tree` as it would be written to `destination`.
    ///
    /// The text is wiped from memory when dropped, since it may hold secured
    /// values.
    #[must_use]
    pub fn render_document(
        &self,
        tree: &Tree,
        destination: &Path,
        enable_traceability: bool,
    ) -> Zeroizing<String> {
        let comments = self.policy.allows(destination, enable_traceability);
        Zeroizing::new(ProvenanceRenderer::new(comments).render(tree))
    }

    /// Partition `params` and write each side into `dir`.
    ///
    /// The non-secure side goes to the configured parameters file, the secure
    /// side to the credentials file. A side with no entries is not written.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if either file cannot be written.
    pub async fn write_effective_set<P: AsRef<Path>>(
        &self,
        params: &ParameterMap,
        dir: P,
    ) -> Result<WrittenFiles> {
        let dir = dir.as_ref();
        let split = partition(params);
        let mut written = WrittenFiles::default();

        if !split.insecure.is_empty() {
            let path = dir.join(&self.parameters_file);
            self.write_to_file(&to_tree(&split.insecure), &path).await?;
            written.parameters = Some(path);
        }

        if !split.secure.is_empty() {
            let path = dir.join(&self.credentials_file);
            let mut tree = to_tree(split.secure.as_map());
            let result = self.write_to_file(&tree, &path).await;
            for node in tree.values_mut() {
                node.zeroize();
            }
            result?;
            written.credentials = Some(path);
        }

        info!(
            dir = %dir.display(),
            parameters = split.insecure.len(),
            credentials = split.secure.len(),
            "effective set written"
        );
        Ok(written)
    }

    // ================= READ =================

    /// Read an optional document.
    ///
    /// A file that cannot be read (typically because it does not exist) is
    /// logged and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the file was read but does not deserialize
    /// into `T`. A malformed document is never treated as absent.
    pub async fn parse_input_file<T, P>(&self, path: P) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        match self.read_required(path).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::Io => {
                if err.is_not_found() {
                    debug!(path = %path.display(), "optional input absent");
                } else {
                    warn!(
                        path = %path.display(),
                        code = %err.code(),
                        "{}",
                        err.details()
                    );
                }
                Ok(None)
            }
            Err(err) => {
                error!(
                    path = %path.display(),
                    code = %err.code(),
                    "{}",
                    err.details()
                );
                Err(err)
            }
        }
    }

    /// Read a required document.
    ///
    /// YAML and JSON are both accepted.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, and a parse error if
    /// its content does not deserialize into `T`.
    pub async fn read_required<T, P>(&self, path: P) -> Result<T>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| errors::io_read_error("parse_input_file", path, e))?;

        serde_yaml::from_str(&contents)
            .map_err(|e| errors::file_parse_error("parse_input_file", path, e))
    }

    /// Read a document into a generic string-keyed tree.
    ///
    /// # Errors
    ///
    /// Same as [`read_required`](Self::read_required).
    pub async fn read_tree<P: AsRef<Path>>(&self, path: P) -> Result<Tree> {
        self.read_required(path).await
    }

    /// Read and validate a CycloneDX SBOM (JSON).
    ///
    /// # Errors
    ///
    /// Any read, syntax or format failure is returned as an error naming the file.
    pub async fn parse_sbom_file<P: AsRef<Path>>(&self, path: P) -> Result<Bom> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| errors::file_parse_error("parse_sbom_file", path, e))?;

        let bom: Bom = serde_json::from_slice(&contents)
            .map_err(|e| errors::file_parse_error("parse_sbom_file", path, e))?;
        bom.validate()?;

        debug!(path = %path.display(), components = bom.components.len(), "parsed sbom");
        Ok(bom)
    }

    /// Convert any serializable record into a generic tree.
    ///
    /// # Errors
    ///
    /// Returns a parse error if `input` does not serialize to a mapping.
    pub fn to_object_map<T: Serialize>(&self, input: &T) -> Result<Tree> {
        let value = serde_yaml::to_value(input)
            .map_err(|e| errors::parse_error("to_object_map", "value cannot be represented", e))?;
        match Node::from(value) {
            Node::Mapping(tree) => Ok(tree),
            _ => Err(errors::parse_error(
                "to_object_map",
                "value is not a mapping",
                "expected a mapping at the top level",
            )),
        }
    }

    /// Decode a base64 envelope and deserialize its YAML or JSON content.
    ///
    /// # Errors
    ///
    /// Returns a parse-kind error carrying the cause if decoding or
    /// deserialization fails.
    pub fn decode_and_parse<T: DeserializeOwned>(&self, encoded: &str) -> Result<T> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| errors::decode_error("decode_and_parse", e))?;

        serde_yaml::from_slice(&decoded).map_err(|e| errors::decode_error("decode_and_parse", e))
    }
}

impl Default for FileDataConverter {
    fn default() -> Self {
        Self::new(CommentPolicy::default())
    }
}
