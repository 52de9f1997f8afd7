//! App - アプリケーション層
//!
//! typed / domain / ports を組み合わせてゲートの両端を実装します。
//!
//! # 主要コンポーネント
//! - **DescriptorBuilder**: Warpable → TaskDescriptor（クライアント側）
//! - **Gate**: build → exchange → resolve の 1 往復（クライアント側）
//! - **Scheduler**: Gate 呼び出しを非同期に投げるワーカープール
//! - **Host**: descriptor を受けて unit を materialize し実行（サーバ側）
//! - **resolver**: 応答を値かエラーに戻す

pub mod descriptor_builder;
pub mod gate;
pub mod host;
pub mod resolver;
pub mod scheduler;

// 主要な型を再エクスポート
pub use self::descriptor_builder::{Catalog, DescriptorBuilder};
pub use self::gate::Gate;
pub use self::host::{Host, HostBuildError, HostBuilder};
pub use self::scheduler::{Scheduler, SchedulerConfig, WarpHandle};
