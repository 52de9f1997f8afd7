//! Impls - ports の実装とサーバ
//!
//! # 含まれる実装
//! - **HttpTransport**: reqwest によるクライアント側の往復
//! - **InProcessTransport**: 同一プロセスの Host を直接呼ぶ（ローカル実行・テスト用）
//! - **http_server**: Host を axum の `POST /warpunit-insider` に載せる

pub mod http_server;
pub mod http_transport;
pub mod in_process;

// 主要な型を再エクスポート
pub use self::http_transport::HttpTransport;
pub use self::in_process::InProcessTransport;
