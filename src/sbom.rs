//! CycloneDX software bill of materials, the subset the generator reads.

use crate::errors;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Expected value of `bomFormat`.
pub const BOM_FORMAT: &str = "CycloneDX";

/// Top-level SBOM document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bom {
    /// Always `CycloneDX` for documents this crate accepts.
    pub bom_format: String,
    /// CycloneDX specification version, e.g. `1.6`.
    #[serde(default)]
    pub spec_version: Option<String>,
    /// `urn:uuid:` serial number.
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Document revision.
    #[serde(default = "default_bom_version")]
    pub version: u32,
    /// Document metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
    /// Top-level components.
    #[serde(default)]
    pub components: Vec<Component>,
}

fn default_bom_version() -> u32 {
    1
}

/// SBOM metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Creation timestamp, kept verbatim.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// The component this SBOM describes.
    #[serde(default)]
    pub component: Option<Component>,
}

/// A component entry. Components nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Component type (`application`, `library`, `data`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Unique reference inside the document.
    #[serde(rename = "bom-ref", default)]
    pub bom_ref: Option<String>,
    /// Name.
    pub name: String,
    /// Group or namespace.
    #[serde(default)]
    pub group: Option<String>,
    /// Version.
    #[serde(default)]
    pub version: Option<String>,
    /// Package URL.
    #[serde(default)]
    pub purl: Option<String>,
    /// MIME type, used by data components.
    #[serde(rename = "mime-type", default)]
    pub mime_type: Option<String>,
    /// Free-form name/value properties.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Child components.
    #[serde(default)]
    pub components: Vec<Component>,
}

/// Name/value property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Property value.
    #[serde(default)]
    pub value: Option<String>,
}

impl Component {
    /// Value of the first property called `name`.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }
}

impl Bom {
    /// Reject documents that are not CycloneDX.
    pub fn validate(&self) -> Result<()> {
        if self.bom_format != BOM_FORMAT {
            return Err(errors::invalid_value(
                "validate_sbom",
                "bomFormat",
                format!("expected {}, got {:?}", BOM_FORMAT, self.bom_format),
            ));
        }
        Ok(())
    }

    /// All components, depth first, parents before children.
    pub fn iter_components(&self) -> impl Iterator<Item = &Component> {
        let mut stack: Vec<&Component> = self.components.iter().rev().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.components.iter().rev());
            Some(next)
        })
    }

    /// First component named `name`, searching nested components too.
    #[must_use]
    pub fn find_component(&self, name: &str) -> Option<&Component> {
        self.iter_components().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SBOM: &str = r#"{
        "bomFormat": "CycloneDX",
        "specVersion": "1.6",
        "serialNumber": "urn:uuid:1b671687-395b-41f5-a30f-a58921a69b79",
        "version": 1,
        "metadata": {
            "timestamp": "2025-01-01T00:00:00Z",
            "component": { "type": "application", "name": "billing", "version": "1.2.0" }
        },
        "components": [
            {
                "type": "application",
                "bom-ref": "billing-app",
                "name": "billing-app",
                "version": "1.2.0",
                "properties": [ { "name": "deployPostfix", "value": "core" } ],
                "components": [
                    { "type": "data", "name": "deploy-params", "mime-type": "application/vnd.qubership.configuration.helm" }
                ]
            },
            { "type": "library", "name": "ui", "purl": "pkg:docker/ui@2.0" }
        ]
    }"#;

    #[test]
    fn parses_nested_components() {
        let bom: Bom = serde_json::from_str(SBOM).unwrap();
        assert!(bom.validate().is_ok());
        assert_eq!(bom.spec_version.as_deref(), Some("1.6"));

        let names: Vec<_> = bom.iter_components().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["billing-app", "deploy-params", "ui"]);

        let app = bom.find_component("billing-app").unwrap();
        assert_eq!(app.property("deployPostfix"), Some("core"));
        assert_eq!(app.property("missing"), None);

        let data = bom.find_component("deploy-params").unwrap();
        assert_eq!(data.kind, "data");
        assert!(data.mime_type.is_some());
    }

    #[test]
    fn rejects_foreign_format() {
        let bom: Bom = serde_json::from_str(r#"{"bomFormat": "SPDX"}"#).unwrap();
        assert!(bom.validate().is_err());
    }
}
