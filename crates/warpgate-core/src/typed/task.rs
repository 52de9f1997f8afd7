//! Unit / Warpable trait - リモートで実行する処理の型付き定義
//!
//! # 学習ポイント
//! - Associated Constants (`const IDENTITY`, `const OPERATION`)
//! - Associated Types (`type Unit`, `type Output`)
//! - デフォルト付き associated const（`REVISION`, `REQUIRES`, `CONTRACT`）
//!
//! # 二つの役割
//! - **Unit**: ホスト側で materialize される実装単位（例: `Adder`）
//! - **Warpable**: unit 上の 1 operation と、その captured values を明示的に持つ task

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::services::{MaterializeError, Services};

/// Unit はホスト側で materialize される実装単位
///
/// # 使用例
/// ```ignore
/// struct Adder;
///
/// impl Unit for Adder {
///     const IDENTITY: &'static str = "Adder";
///
///     fn materialize(_services: &Services) -> Result<Self, MaterializeError> {
///         Ok(Adder)
///     }
/// }
/// ```
///
/// # 命名規約
/// - nested unit は `{Outer}${Inner}`（例: `Ledger$Entry`）
pub trait Unit: Send + Sync + Sized + 'static {
    /// ホスト側で一意な名前
    const IDENTITY: &'static str;

    /// artifact manifest の revision。クライアントとホストで一致しなければ GateFailure
    const REVISION: u32 = 1;

    /// この unit が依存する nested unit の identity
    const REQUIRES: &'static [&'static str] = &[];

    /// この unit が満たす contract（interface artifact を送るときだけ検証される）
    const CONTRACT: Option<&'static str> = None;

    /// リクエストごとに呼ばれる。`services` から依存を注入して組み立てる
    fn materialize(services: &Services) -> Result<Self, MaterializeError>;
}

/// Warpable は Unit 上の 1 operation 呼び出し
///
/// フィールドが captured values そのもので、シリアライズ結果が
/// `argumentsPayload` になります。tuple struct `Add(2, 3)` なら `[2,3]`。
///
/// # Trait Bounds
/// - `Serialize`: descriptor に載せるため
/// - `DeserializeOwned`: ホスト側で復元するため
/// - `Send + Sync + 'static`: Scheduler のワーカーへ移すため
pub trait Warpable: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Unit: Unit;
    type Output: Serialize + DeserializeOwned + Send + 'static;

    const OPERATION: &'static str;
}
