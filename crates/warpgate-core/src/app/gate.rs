//! Gate - クライアント側の入口
//!
//! Descriptor Builder → Transport → Outcome Resolver を 1 回の呼び出しにまとめます。
//! セッションもキャッシュも持たず、呼び出しごとに descriptor を作り直します。

use std::sync::Arc;

use tracing::debug;
use ulid::Ulid;

use crate::app::descriptor_builder::{Catalog, DescriptorBuilder};
use crate::app::host::Host;
use crate::app::resolver;
use crate::config::GateConfig;
use crate::domain::errors::{BuildError, GateError, TransportError};
use crate::domain::handle::RemoteHandle;
use crate::impls::http_transport::HttpTransport;
use crate::impls::in_process::InProcessTransport;
use crate::ports::Transport;
use crate::typed::task::{Unit, Warpable};

/// `Gate::local` が使う名目上の endpoint
pub const LOCAL_ENDPOINT: &str = "in-process";

/// Gate は warpable をリモートホストで実行する
///
/// # 使用例
/// ```ignore
/// let gate = Gate::connect(&GateConfig::default(), Catalog::new())?;
/// let adder = gate.handle::<Adder>();
/// let sum = gate.warp(&adder, &Add(2, 3)).await?;
/// ```
pub struct Gate {
    transport: Arc<dyn Transport>,
    builder: DescriptorBuilder,
    endpoint: String,
}

impl Gate {
    /// HTTP で `config.endpoint` のホストにつなぐ
    pub fn connect(config: &GateConfig, catalog: Catalog) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(
            Self::with_transport(Arc::new(transport), catalog, config.endpoint.clone())
                .with_interface(config.include_interface),
        )
    }

    /// 同じプロセスの Host で実行するゲート（ネットワークを使わない）
    pub fn local(host: Arc<Host>, catalog: Catalog) -> Self {
        Self::with_transport(
            Arc::new(InProcessTransport::new(host)),
            catalog,
            LOCAL_ENDPOINT,
        )
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        catalog: Catalog,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            builder: DescriptorBuilder::new(Arc::new(catalog)),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_interface(mut self, include_interface: bool) -> Self {
        self.builder = self.builder.with_interface(include_interface);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn handle<U: Unit>(&self) -> RemoteHandle {
        RemoteHandle::of::<U>(self.endpoint.clone())
    }

    /// 往復が終わるまで待つ同期的な呼び出し
    pub async fn warp<T: Warpable>(
        &self,
        handle: &RemoteHandle,
        task: &T,
    ) -> Result<T::Output, GateError> {
        if handle.target() != T::Unit::IDENTITY {
            return Err(BuildError::TargetMismatch {
                handle: handle.target().to_string(),
                task: T::Unit::IDENTITY.to_string(),
            }
            .into());
        }
        let descriptor = self.builder.build(task)?.with_request_id(Ulid::new());
        debug!(request_id = ?descriptor.request_id, %handle, operation = T::OPERATION, "warp");

        let reply = self.transport.exchange(handle.endpoint(), &descriptor).await?;
        resolver::resolve(&reply)
    }

    /// 型を持たない呼び出し。captured values は JSON 配列として送られる
    pub async fn warp_raw(
        &self,
        handle: &RemoteHandle,
        operation: &str,
        captured: &[serde_json::Value],
    ) -> Result<serde_json::Value, GateError> {
        let descriptor = self
            .builder
            .build_raw(operation, handle.target(), captured)?
            .with_request_id(Ulid::new());
        debug!(request_id = ?descriptor.request_id, %handle, operation, "warp (raw)");

        let reply = self.transport.exchange(handle.endpoint(), &descriptor).await?;
        resolver::resolve(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, Add, Adder, Credit, Divide, Divider, Explode, Ledger, LedgerEntry};
    use serde_json::json;

    fn local_gate() -> (Gate, Arc<testing::Tally>) {
        let (host, tally) = testing::host();
        (Gate::local(Arc::new(host), testing::catalog()), tally)
    }

    #[tokio::test]
    async fn scenario_add() {
        let (gate, _) = local_gate();
        let sum = gate.warp(&gate.handle::<Adder>(), &Add(2, 3)).await.unwrap();
        assert_eq!(sum, 5);
    }

    #[tokio::test]
    async fn scenario_division_by_zero() {
        let (gate, _) = local_gate();
        let err = gate
            .warp(&gate.handle::<Divider>(), &Divide(10, 0))
            .await
            .unwrap_err();
        assert!(err.is_remote_task_failure());
        let remote = err.remote_error().unwrap();
        assert_eq!(remote.kind, "ArithmeticError");
        assert!(remote.message.contains("division by zero"));
    }

    #[tokio::test]
    async fn overflowing_division_is_not_reported_as_zero_divisor() {
        let (gate, _) = local_gate();
        let err = gate
            .warp(&gate.handle::<Divider>(), &Divide(i64::MIN, -1))
            .await
            .unwrap_err();
        let remote = err.remote_error().unwrap();
        assert_eq!(remote.kind, "ArithmeticError");
        assert_eq!(remote.message, "overflow");
    }

    #[tokio::test]
    async fn panicking_task_is_remote_task_failure() {
        let (gate, _) = local_gate();
        let err = gate
            .warp(&gate.handle::<Divider>(), &Explode("detonated".into()))
            .await
            .unwrap_err();
        assert!(err.is_remote_task_failure());
        assert!(err.to_string().contains("detonated"));
    }

    #[tokio::test]
    async fn missing_nested_unit_fails_before_sending() {
        let (host, _) = testing::host();
        // nested unit を知らない catalog
        let gate = Gate::local(Arc::new(host), Catalog::new());
        let err = gate
            .warp(&gate.handle::<Ledger>(), &Credit(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GateError::Build(BuildError::ArtifactUnavailable(id)) if id == LedgerEntry::IDENTITY
        ));
    }

    #[tokio::test]
    async fn host_without_nested_unit_is_gate_failure() {
        let host = crate::app::host::HostBuilder::new()
            .register::<Credit>()
            .unwrap()
            .provide(Arc::new(testing::Tally::default()))
            .build()
            .unwrap();
        let gate = Gate::local(Arc::new(host), testing::catalog());
        let err = gate
            .warp(&gate.handle::<Ledger>(), &Credit(1))
            .await
            .unwrap_err();
        assert!(err.is_gate_failure(), "got {err:?}");
        assert_eq!(err.remote_error().unwrap().kind, "UnknownUnit");
    }

    #[tokio::test]
    async fn handle_must_match_task_unit() {
        let (gate, _) = local_gate();
        let err = gate
            .warp(&gate.handle::<Divider>(), &Add(1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Build(BuildError::TargetMismatch { .. })));
    }

    #[tokio::test]
    async fn unit_returning_warp() {
        let (gate, tally) = local_gate();
        let ledger = gate.handle::<Ledger>();
        gate.warp(&ledger, &Credit(9)).await.unwrap();
        gate.warp(&ledger, &testing::Reset).await.unwrap();
        assert_eq!(tally.total(), 0);
    }

    #[tokio::test]
    async fn interface_shipping_round_trips() {
        let (host, _) = testing::host();
        let gate = Gate::local(Arc::new(host), testing::catalog()).with_interface(true);
        let sum = gate.warp(&gate.handle::<Adder>(), &Add(40, 2)).await.unwrap();
        assert_eq!(sum, 42);
    }

    #[tokio::test]
    async fn raw_warp_uses_catalog() {
        let (host, _) = testing::host();
        let catalog = testing::catalog().with::<Adder>();
        let gate = Gate::local(Arc::new(host), catalog);

        let sum = gate
            .warp_raw(&gate.handle::<Adder>(), "add", &[json!(2), json!(3)])
            .await
            .unwrap();
        assert_eq!(sum, json!(5));
    }
}
