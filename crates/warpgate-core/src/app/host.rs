//! Host - リモート実行ホスト（サーバ側のディスパッチ）
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - リクエストスコープの materialize（共有 mutable レジストリを持たない）
//!
//! # ディスパッチの流れ
//! 1. artifacts を全て decode し、ホストの registry と照合（request-local な scope を作る）
//! 2. target と、target が要求する nested unit が scope にあるか確認
//! 3. interface artifact があれば contract を照合
//! 4. (unit, operation) の DynHandler を引き、materialize → decode → invoke
//!
//! 1〜3 と materialize/decode の失敗は GateFailure、operation 自体の失敗は
//! task 側の Failure になります。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{Instrument, info_span, warn};

use crate::domain::artifact::{ArtifactManifest, ContractManifest};
use crate::domain::descriptor::TaskDescriptor;
use crate::domain::errors::GateFault;
use crate::domain::outcome::Outcome;
use crate::typed::codec::{EncodeError, PayloadCodec};
use crate::typed::{DynHandler, Handler, RegistryError, Services, Unit, UnitRegistry, Warpable};

/// HostBuilder はホストを構築
///
/// # 使用例
/// ```ignore
/// let host = HostBuilder::new()
///     .register::<Add>()?
///     .register_unit::<LedgerEntry>()?
///     .provide(Arc::new(Tally::default()))
///     .expect_units(&["Adder", "Ledger$Entry"])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect_units() で期待される unit を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
pub struct HostBuilder {
    registry: UnitRegistry,
    services: Services,
    expected_units: Option<Vec<String>>,
}

/// HostBuildError はホスト構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum HostBuildError {
    #[error("Missing units: {0:?}. These units were expected but not registered.")]
    MissingUnits(Vec<String>),
}

impl HostBuilder {
    pub fn new() -> Self {
        Self {
            registry: UnitRegistry::new(),
            services: Services::new(),
            expected_units: None,
        }
    }

    pub fn register<T>(mut self) -> Result<Self, RegistryError>
    where
        T: Warpable,
        T::Unit: Handler<T>,
    {
        self.registry.register::<T>()?;
        Ok(self)
    }

    pub fn register_unit<U: Unit>(mut self) -> Result<Self, RegistryError> {
        self.registry.register_unit::<U>()?;
        Ok(self)
    }

    /// unit の materialize 時に注入されるサービスを追加
    pub fn provide<S: Send + Sync + 'static>(mut self, service: Arc<S>) -> Self {
        self.services.provide(service);
        self
    }

    pub fn expect_units(mut self, identities: &[&str]) -> Self {
        self.expected_units = Some(identities.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<Host, HostBuildError> {
        if let Some(expected_units) = &self.expected_units {
            let missing: Vec<String> = expected_units
                .iter()
                .filter(|identity| self.registry.manifest(identity).is_none())
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(HostBuildError::MissingUnits(missing));
            }
        }
        Ok(Host {
            registry: self.registry,
            services: self.services,
        })
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Host は登録済みの unit だけを実行できるディスパッチャ
///
/// registry と services は構築後不変なので、`Arc<Host>` を複数の
/// リクエストから同時に使えます（グローバルロックなし）。
pub struct Host {
    registry: UnitRegistry,
    services: Services,
}

impl Host {
    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// descriptor を 1 件実行する。どんな失敗も Outcome として返る
    pub async fn dispatch(&self, descriptor: TaskDescriptor) -> Outcome {
        let span = info_span!(
            "dispatch",
            request_id = ?descriptor.request_id,
            target_identity = %descriptor.target_identity,
            operation = %descriptor.operation_name,
        );
        async move {
            let handler = match self.prepare(&descriptor) {
                Ok(handler) => handler,
                Err(fault) => {
                    warn!(error = %fault, "gate-level failure");
                    return Outcome::gate_failure(fault.into_remote());
                }
            };
            let outcome = handler
                .invoke(&self.services, &descriptor.arguments_payload)
                .await;
            if let Outcome::Failure { origin, error } = &outcome {
                warn!(?origin, error = %error, "warp failed");
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// dispatch して、応答用の text にする
    pub async fn serve(&self, descriptor: TaskDescriptor) -> Result<String, EncodeError> {
        let outcome = self.dispatch(descriptor).await;
        PayloadCodec::encode(&outcome)
    }

    fn prepare(&self, descriptor: &TaskDescriptor) -> Result<Arc<dyn DynHandler>, GateFault> {
        let scope = self.materialize_scope(descriptor)?;

        let target = descriptor.target_identity.as_str();
        if !scope.contains_key(target) {
            return Err(GateFault::ArtifactUnavailable(target.to_string()));
        }
        self.check_requires(target, &scope)?;

        if let Some(interface) = &descriptor.interface_artifact {
            self.check_contract(target, interface)?;
        }

        self.registry
            .get(target, &descriptor.operation_name)
            .ok_or_else(|| GateFault::OperationNotFound {
                unit: target.to_string(),
                operation: descriptor.operation_name.clone(),
            })
    }

    /// このリクエストだけの scope。registry 側は読むだけ
    fn materialize_scope<'a>(
        &'a self,
        descriptor: &TaskDescriptor,
    ) -> Result<HashMap<String, &'a ArtifactManifest>, GateFault> {
        let mut scope = HashMap::with_capacity(descriptor.artifacts.len());
        for (identity, encoded) in &descriptor.artifacts {
            let shipped: ArtifactManifest = PayloadCodec::decode(encoded).map_err(|source| {
                GateFault::MalformedArtifact {
                    identity: identity.clone(),
                    source,
                }
            })?;
            if shipped.identity != *identity {
                return Err(GateFault::ArtifactIdentityMismatch {
                    key: identity.clone(),
                    shipped: shipped.identity,
                });
            }
            let known = self
                .registry
                .manifest(&shipped.identity)
                .ok_or_else(|| GateFault::UnknownUnit(shipped.identity.clone()))?;
            if known.revision != shipped.revision {
                return Err(GateFault::RevisionMismatch {
                    identity: shipped.identity,
                    host: known.revision,
                    request: shipped.revision,
                });
            }
            scope.insert(identity.clone(), known);
        }
        Ok(scope)
    }

    /// ホスト側の manifest を正として requires を推移的に確認する
    fn check_requires(
        &self,
        target: &str,
        scope: &HashMap<String, &ArtifactManifest>,
    ) -> Result<(), GateFault> {
        let mut seen = HashSet::new();
        let mut pending = vec![target.to_string()];
        while let Some(identity) = pending.pop() {
            if !seen.insert(identity.clone()) {
                continue;
            }
            let manifest = scope
                .get(&identity)
                .ok_or_else(|| GateFault::ArtifactUnavailable(identity.clone()))?;
            pending.extend(manifest.requires.iter().cloned());
        }
        Ok(())
    }

    fn check_contract(&self, target: &str, interface: &str) -> Result<(), GateFault> {
        let shipped: ContractManifest =
            PayloadCodec::decode(interface).map_err(|source| GateFault::MalformedArtifact {
                identity: format!("{target} (interface)"),
                source,
            })?;
        let expected = self
            .registry
            .manifest(target)
            .and_then(|m| m.contract.clone());
        if expected.as_deref() != Some(shipped.identity.as_str()) {
            return Err(GateFault::ContractMismatch {
                identity: target.to_string(),
                expected,
                got: shipped.identity,
            });
        }
        Ok(())
    }
}
