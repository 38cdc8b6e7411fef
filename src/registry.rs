//! Artifact registry definitions.
//!
//! Registry definitions are plain documents on disk. They contribute values to
//! the effective set, some of which (credentials) must end up on the secure
//! side. [`RegistryDefinition::to_parameters`] does that classification.

use crate::parameter::{Node, Parameter, ParameterMap, Tree};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Protected string with automatic zeroization.
#[derive(Zeroize, ZeroizeOnDrop, Default, Clone, PartialEq, Eq)]
pub struct ProtectedString {
    inner: String,
}

impl ProtectedString {
    /// Create from string (takes ownership).
    #[inline]
    #[must_use]
    pub fn new(s: String) -> Self {
        Self { inner: s }
    }

    /// Access the inner string by reference.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Consume and return inner string.
    #[inline]
    #[must_use]
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.inner)
    }
}

impl fmt::Debug for ProtectedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProtectedString([REDACTED])")
    }
}

impl<'de> Deserialize<'de> for ProtectedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// A registry definition document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryDefinition {
    /// Registry name.
    pub name: String,
    /// Identifier of the credential set used to log in.
    #[serde(default)]
    pub credentials_id: Option<String>,
    /// Login user.
    #[serde(default)]
    pub username: Option<ProtectedString>,
    /// Login password.
    #[serde(default)]
    pub password: Option<ProtectedString>,
    /// Repository for releases.
    #[serde(default)]
    pub release_repository: Option<String>,
    /// Repository for snapshots.
    #[serde(default)]
    pub snapshot_repository: Option<String>,
    /// Repository for staged builds.
    #[serde(default)]
    pub staging_repository: Option<String>,
    /// Proxy/group repository.
    #[serde(default)]
    pub proxy_repository: Option<String>,
    /// Maven-specific settings.
    #[serde(default)]
    pub maven_config: Option<MavenConfig>,
    /// Docker-specific settings.
    #[serde(default)]
    pub docker_config: Option<DockerConfig>,
    /// Helm-specific settings.
    #[serde(default)]
    pub helm_config: Option<HelmConfig>,
}

/// Maven repository layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MavenConfig {
    /// Base URL of the repository host.
    #[serde(default)]
    pub repository_domain_name: Option<String>,
    /// Snapshot target repository.
    #[serde(default)]
    pub target_snapshot: Option<String>,
    /// Staging target repository.
    #[serde(default)]
    pub target_staging: Option<String>,
    /// Release target repository.
    #[serde(default)]
    pub target_release: Option<String>,
}

/// Docker registry layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerConfig {
    /// Snapshot registry address.
    #[serde(default)]
    pub snapshot_uri: Option<String>,
    /// Staging registry address.
    #[serde(default)]
    pub staging_uri: Option<String>,
    /// Release registry address.
    #[serde(default)]
    pub release_uri: Option<String>,
    /// Group registry address.
    #[serde(default)]
    pub group_uri: Option<String>,
}

/// Helm chart repository layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmConfig {
    /// Base URL of the repository host.
    #[serde(default)]
    pub repository_domain_name: Option<String>,
    /// Staging chart repository.
    #[serde(default)]
    pub helm_target_staging: Option<String>,
    /// Release chart repository.
    #[serde(default)]
    pub helm_target_release: Option<String>,
}

impl RegistryDefinition {
    /// Provenance-annotated view of this registry.
    ///
    /// Every value is tagged with `origin`; `username` and `password` are
    /// flagged secured. Absent fields are omitted.
    #[must_use]
    pub fn to_parameters(&self, origin: &str) -> ParameterMap {
        let open = |v: &str| Parameter::new(v).with_origin(origin).parsed(true);
        let secret = |v: &ProtectedString| {
            Parameter::new(v.as_str())
                .with_origin(origin)
                .parsed(true)
                .secured(true)
        };

        let mut params = ParameterMap::new();
        params.insert("name".to_owned(), open(&self.name));

        let optional = [
            ("credentialsId", &self.credentials_id),
            ("releaseRepository", &self.release_repository),
            ("snapshotRepository", &self.snapshot_repository),
            ("stagingRepository", &self.staging_repository),
            ("proxyRepository", &self.proxy_repository),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                params.insert(key.to_owned(), open(v));
            }
        }

        if let Some(user) = &self.username {
            params.insert("username".to_owned(), secret(user));
        }
        if let Some(password) = &self.password {
            params.insert("password".to_owned(), secret(password));
        }

        let sections = [
            ("mavenConfig", self.maven_config.as_ref().map(section)),
            ("dockerConfig", self.docker_config.as_ref().map(section)),
            ("helmConfig", self.helm_config.as_ref().map(section)),
        ];
        for (key, fields) in sections {
            let Some(fields) = fields else { continue };
            let tree: Tree = fields
                .into_iter()
                .map(|(k, v)| (k, Node::from(open(&v))))
                .collect();
            params.insert(key.to_owned(), open("").with_value(Node::Mapping(tree)));
        }

        params
    }
}

/// Flatten a sub-config into its present string fields, in declaration order.
fn section<T: Serialize>(config: &T) -> Vec<(String, String)> {
    let Ok(serde_yaml::Value::Mapping(map)) = serde_yaml::to_value(config) else {
        return Vec::new();
    };
    map.into_iter()
        .filter_map(|(k, v)| match (k, v) {
            (serde_yaml::Value::String(k), serde_yaml::Value::String(v)) => Some((k, v)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition;

    const REGISTRY: &str = r#"
name: central
credentialsId: registry-cred
username: deployer
password: p@ss
releaseRepository: releases
snapshotRepository: snapshots
unknownField: ignored
dockerConfig:
  snapshotUri: docker.example.com:17001
  releaseUri: docker.example.com:17002
"#;

    #[test]
    fn parses_and_redacts_credentials() {
        let registry: RegistryDefinition = serde_yaml::from_str(REGISTRY).unwrap();
        assert_eq!(registry.name, "central");
        assert_eq!(registry.password.as_ref().map(ProtectedString::as_str), Some("p@ss"));

        let debug = format!("{:?}", registry);
        assert!(!debug.contains("p@ss"));
        assert!(!debug.contains("deployer"));
    }

    #[test]
    fn credentials_land_on_secure_side() {
        let registry: RegistryDefinition = serde_yaml::from_str(REGISTRY).unwrap();
        let params = registry.to_parameters("registry.yml");

        assert_eq!(params["name"].origin(), Some("registry.yml"));
        assert!(params["password"].is_secured());

        let result = partition(&params);
        let secure = result.secure.as_map();
        assert_eq!(secure.keys().collect::<Vec<_>>(), vec!["username", "password"]);
        assert!(!result.insecure.contains_key("password"));

        let Node::Mapping(docker) = result.insecure["dockerConfig"].value() else {
            panic!("expected mapping");
        };
        assert_eq!(
            docker.keys().collect::<Vec<_>>(),
            vec!["snapshotUri", "releaseUri"]
        );
    }

    #[test]
    fn protected_string_redacts_in_debug() {
        let protected = ProtectedString::new("secret123".to_string());
        let debug = format!("{:?}", protected);
        assert!(!debug.contains("secret123"));
        assert!(debug.contains("REDACTED"));
        assert_eq!(protected.into_inner(), "secret123");
    }
}
