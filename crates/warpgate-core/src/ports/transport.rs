//! Transport port - 1 回の request/response 往復
//!
//! # 契約
//! - 呼び出し 1 回につきネットワーク往復はちょうど 1 回
//! - リトライもバックオフもしない。接続できなければ即 TransportError
//! - 返すのは encode 済みの Outcome text（解釈は resolver の仕事）

use async_trait::async_trait;

use crate::domain::descriptor::TaskDescriptor;
use crate::domain::errors::TransportError;

/// Transport は descriptor を endpoint に送り、応答 text を受け取る
///
/// # 実装
/// - **HttpTransport**: reqwest で固定パスに POST（本番用）
/// - **InProcessTransport**: 同じプロセス内の Host を直接呼ぶ（テスト・ローカル実行用）
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(
        &self,
        endpoint: &str,
        descriptor: &TaskDescriptor,
    ) -> Result<String, TransportError>;
}
