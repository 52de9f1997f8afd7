//! DescriptorBuilder - Warpable を TaskDescriptor に変換する
//!
//! # フロー
//! 1. captured values（task 自身）を PayloadCodec で encode
//! 2. target unit の manifest を artifacts に入れる
//! 3. manifest の `requires` を Catalog でたどり、nested unit を全て集める
//! 4. 必要なら contract を interface artifact として付ける
//!
//! 副作用はなく、通信もしません。解決できない identity は
//! `BuildError::ArtifactUnavailable` になります（panic しない）。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::domain::artifact::{ArtifactManifest, ContractManifest};
use crate::domain::descriptor::TaskDescriptor;
use crate::domain::errors::BuildError;
use crate::typed::codec::PayloadCodec;
use crate::typed::task::{Unit, Warpable};

/// Catalog はクライアント側で取り出せる unit manifest の集合
///
/// 型付きの `build::<T>()` では target unit 自身は型から取れるので、
/// Catalog に必要なのは nested unit と、`build_raw` で名前指定する unit だけです。
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    manifests: HashMap<String, ArtifactManifest>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare<U: Unit>(&mut self) -> &mut Self {
        self.insert(ArtifactManifest::of::<U>());
        self
    }

    pub fn with<U: Unit>(mut self) -> Self {
        self.declare::<U>();
        self
    }

    pub fn insert(&mut self, manifest: ArtifactManifest) {
        self.manifests.insert(manifest.identity.clone(), manifest);
    }

    pub fn manifest(&self, identity: &str) -> Option<&ArtifactManifest> {
        self.manifests.get(identity)
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    catalog: Arc<Catalog>,
    include_interface: bool,
}

impl DescriptorBuilder {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            include_interface: false,
        }
    }

    /// contract も送ってホストに検証させる
    pub fn with_interface(mut self, include_interface: bool) -> Self {
        self.include_interface = include_interface;
        self
    }

    pub fn build<T: Warpable>(&self, task: &T) -> Result<TaskDescriptor, BuildError> {
        let arguments_payload = PayloadCodec::encode(task)?;
        let target = ArtifactManifest::of::<T::Unit>();
        self.assemble(T::OPERATION, target, arguments_payload)
    }

    /// 名前だけで組み立てる untyped 版。target も Catalog から解決する
    pub fn build_raw(
        &self,
        operation: &str,
        target: &str,
        captured: &[serde_json::Value],
    ) -> Result<TaskDescriptor, BuildError> {
        let arguments_payload = PayloadCodec::encode(captured)?;
        let target = self
            .catalog
            .manifest(target)
            .cloned()
            .ok_or_else(|| BuildError::ArtifactUnavailable(target.to_string()))?;
        self.assemble(operation, target, arguments_payload)
    }

    fn assemble(
        &self,
        operation: &str,
        target: ArtifactManifest,
        arguments_payload: String,
    ) -> Result<TaskDescriptor, BuildError> {
        let target_identity = target.identity.clone();
        let interface_artifact = match (&target.contract, self.include_interface) {
            (Some(contract), true) => Some(PayloadCodec::encode(&ContractManifest {
                identity: contract.clone(),
            })?),
            _ => None,
        };

        let mut artifacts = BTreeMap::new();
        let mut pending = vec![target];
        while let Some(manifest) = pending.pop() {
            if artifacts.contains_key(&manifest.identity) {
                continue;
            }
            for nested in &manifest.requires {
                if artifacts.contains_key(nested) {
                    continue;
                }
                let nested_manifest = self
                    .catalog
                    .manifest(nested)
                    .cloned()
                    .ok_or_else(|| BuildError::ArtifactUnavailable(nested.clone()))?;
                pending.push(nested_manifest);
            }
            artifacts.insert(manifest.identity.clone(), PayloadCodec::encode(&manifest)?);
        }

        debug!(
            target_identity = %target_identity,
            operation,
            artifacts = artifacts.len(),
            interface = interface_artifact.is_some(),
            "descriptor built"
        );

        Ok(TaskDescriptor {
            operation_name: operation.to_string(),
            target_identity,
            arguments_payload,
            artifacts,
            interface_artifact,
            request_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Add, Adder, Credit, Ledger, LedgerEntry};
    use serde_json::json;

    fn builder(catalog: Catalog) -> DescriptorBuilder {
        DescriptorBuilder::new(Arc::new(catalog))
    }

    #[test]
    fn builds_typed_descriptor() {
        let d = builder(Catalog::new()).build(&Add(2, 3)).unwrap();

        assert_eq!(d.operation_name, "add");
        assert_eq!(d.target_identity, "Adder");
        assert_eq!(PayloadCodec::decode_bytes(&d.arguments_payload).unwrap(), b"[2,3]");
        assert_eq!(d.artifacts.keys().collect::<Vec<_>>(), vec!["Adder"]);
        assert!(d.interface_artifact.is_none());

        let m: ArtifactManifest = PayloadCodec::decode(&d.artifacts["Adder"]).unwrap();
        assert_eq!(m, ArtifactManifest::of::<Adder>());
    }

    #[test]
    fn collects_nested_units() {
        let d = builder(Catalog::new().with::<LedgerEntry>())
            .build(&Credit(1))
            .unwrap();
        assert_eq!(
            d.artifacts.keys().cloned().collect::<Vec<_>>(),
            vec!["Ledger".to_string(), "Ledger$Entry".to_string()]
        );
    }

    #[test]
    fn missing_nested_unit_is_build_error() {
        let err = builder(Catalog::new()).build(&Credit(1)).unwrap_err();
        assert!(matches!(err, BuildError::ArtifactUnavailable(id) if id == "Ledger$Entry"));
    }

    #[test]
    fn interface_artifact_only_when_requested() {
        let d = builder(Catalog::new())
            .with_interface(true)
            .build(&Add(1, 1))
            .unwrap();
        let contract: ContractManifest =
            PayloadCodec::decode(d.interface_artifact.as_deref().unwrap()).unwrap();
        assert_eq!(contract.identity, "Calculator");

        // Ledger は contract を持たない
        let d = builder(Catalog::new().with::<LedgerEntry>())
            .with_interface(true)
            .build(&Credit(1))
            .unwrap();
        assert!(d.interface_artifact.is_none());
    }

    #[test]
    fn raw_build_resolves_target_from_catalog() {
        let catalog = Catalog::new().with::<Ledger>().with::<LedgerEntry>();
        let d = builder(catalog)
            .build_raw("credit", "Ledger", &[json!(7)])
            .unwrap();
        assert_eq!(d.artifacts.len(), 2);
        assert_eq!(PayloadCodec::decode_bytes(&d.arguments_payload).unwrap(), b"[7]");

        let err = builder(Catalog::new())
            .build_raw("credit", "Ledger", &[])
            .unwrap_err();
        assert!(matches!(err, BuildError::ArtifactUnavailable(id) if id == "Ledger"));
    }

    #[test]
    fn cyclic_requires_terminate() {
        let mut catalog = Catalog::new();
        catalog.insert(ArtifactManifest {
            identity: "A".into(),
            revision: 1,
            requires: vec!["B".into()],
            contract: None,
        });
        catalog.insert(ArtifactManifest {
            identity: "B".into(),
            revision: 1,
            requires: vec!["A".into()],
            contract: None,
        });
        let d = builder(catalog).build_raw("op", "A", &[]).unwrap();
        assert_eq!(d.artifacts.len(), 2);
    }
}
