//! TaskDescriptor - ワイヤ上を運ばれる 1 回分の実行要求
//!
//! 呼び出しごとに作られ、Outcome を解決したら捨てられます。
//! 永続化も再利用もしません。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ulid::Ulid;

/// TaskDescriptor は「どの unit のどの operation を、どの引数で」を自己記述する
///
/// # フィールド
/// - `operation_name`: 実行する operation（例: `add`）
/// - `target_identity`: ホスト側で materialize する unit（例: `Adder`）
/// - `arguments_payload`: captured values を PayloadCodec で encode した text
/// - `artifacts`: identity → encode 済み ArtifactManifest。target と、
///   target が要求する nested unit をすべて含む必要がある
/// - `interface_artifact`: contract も検証させたい場合だけ付く
///
/// JSON では camelCase のフラットなレコードになります。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    pub operation_name: String,
    pub target_identity: String,
    pub arguments_payload: String,
    pub artifacts: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_artifact: Option<String>,
    /// ログの突き合わせ専用。ホストの動作には影響しない
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Ulid>,
}

impl TaskDescriptor {
    pub fn with_request_id(mut self, request_id: Ulid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// `artifacts` から identity を取り除いたコピー（テスト・診断用）
    pub fn without_artifact(mut self, identity: &str) -> Self {
        self.artifacts.remove(identity);
        self
    }
}
