//! warpgate-core
//!
//! テストを駆動するプロセスから、稼働中のホストのプロセス内で処理を
//! 実行させ、その結果（値または失敗）を受け取るためのゲート。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（descriptor, artifact, outcome, handle, errors）
//! - **typed**: 型付き API（Unit, Warpable, Handler, UnitRegistry, PayloadCodec, Services）
//! - **ports**: 抽象化レイヤー（Transport）
//! - **impls**: 実装（HttpTransport, InProcessTransport, axum サーバ）
//! - **app**: アプリケーションロジック（DescriptorBuilder, Gate, Scheduler, Host, resolver）
//! - **config**: 設定（GateConfig, HostConfig）
//!
//! ホストは名前付きの静的な unit を事前に登録し、クライアントは
//! unit 名・operation 名・encode 済みの引数だけを送ります。コードは運びません。

pub mod domain;
pub mod typed;
pub mod ports;
pub mod impls;
pub mod app;
pub mod config;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{Catalog, Gate, Host, HostBuilder, Scheduler, SchedulerConfig, WarpHandle};
pub use config::{DEFAULT_ENDPOINT, GateConfig, HostConfig, INSIDER_PATH, WarpgateConfig, make_url};
pub use domain::{GateError, RemoteError, RemoteHandle, TaskFailure};
pub use typed::{Handler, MaterializeError, Services, Unit, Warpable};
