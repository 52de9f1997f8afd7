//! Artifact manifests.
//!
//! An artifact no longer carries code: it is the manifest of a statically
//! compiled unit (identity, revision, nested units, contract). The host checks
//! every manifest in a descriptor against its own registry before it
//! materializes anything.

use serde::{Deserialize, Serialize};

use crate::typed::task::Unit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub identity: String,
    pub revision: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
}

impl ArtifactManifest {
    pub fn of<U: Unit>() -> Self {
        Self {
            identity: U::IDENTITY.to_string(),
            revision: U::REVISION,
            requires: U::REQUIRES.iter().map(|s| s.to_string()).collect(),
            contract: U::CONTRACT.map(str::to_string),
        }
    }
}

/// The abstract contract a unit fulfils, shipped as `interfaceArtifact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractManifest {
    pub identity: String,
}
