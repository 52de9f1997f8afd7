//! Errors - ゲートのエラー分類
//!
//! # 分類
//! - **BuildError**: ローカルで descriptor を組み立てられない（通信前）
//! - **TransportError**: 往復そのものが失敗（接続拒否、non-2xx、壊れた応答）
//! - **GateFailure**: ホストがタスクを実行できなかった（unit 不明、artifact 欠落など）
//! - **RemoteTaskFailure**: 実行されたオペレーション自体がエラーを返した
//!
//! GateFailure と RemoteTaskFailure はどちらも `Outcome::Failure` として運ばれ、
//! `FailureOrigin` タグでクライアント側で区別されます。自動リトライはしません。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::typed::codec::{DecodeError, EncodeError};

/// RemoteError はワイヤ上で運ばれるエラー表現
///
/// 元のエラーの `Display` 文字列を `message` にそのまま保持し、
/// `source()` チェーンは `causes` に外側から順に入ります。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl RemoteError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// `err` とその source チェーンから RemoteError を作る
    pub fn from_error(kind: impl Into<String>, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            kind: kind.into(),
            message: err.to_string(),
            causes,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for cause in &self.causes {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteError {}

/// TaskFailure は Handler が返す「業務上の」失敗
///
/// # 使用例
/// ```ignore
/// if divisor == 0 {
///     return Err(TaskFailure::with_kind("ArithmeticError", "division by zero"));
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TaskFailure {
    kind: String,
    message: String,
    causes: Vec<String>,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind("TaskFailure", message)
    }

    pub fn with_kind(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// 任意のエラーを包む。kind には型名の最後のセグメントを使う（型引数は落とす）
    pub fn from_error<E: std::error::Error + 'static>(err: &E) -> Self {
        let remote = RemoteError::from_error(short_type_name::<E>(), err);
        Self {
            kind: remote.kind,
            message: remote.message,
            causes: remote.causes,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_remote(self) -> RemoteError {
        RemoteError {
            kind: self.kind,
            message: self.message,
            causes: self.causes,
        }
    }
}

/// `a::b::Wrapper<c::Inner>` → `Wrapper`
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// GateFault はホスト側で「タスクを動かす前」に起きた失敗
///
/// どれも `FailureOrigin::Gate` の Outcome になります。
#[derive(Debug, thiserror::Error)]
pub enum GateFault {
    #[error("artifact unavailable for identity {0}")]
    ArtifactUnavailable(String),

    #[error("malformed artifact for identity {identity}")]
    MalformedArtifact {
        identity: String,
        #[source]
        source: DecodeError,
    },

    #[error("artifact under {key} carries the manifest of {shipped}")]
    ArtifactIdentityMismatch { key: String, shipped: String },

    #[error("unknown unit {0}")]
    UnknownUnit(String),

    #[error("revision mismatch for {identity}: host has {host}, request sent {request}")]
    RevisionMismatch {
        identity: String,
        host: u32,
        request: u32,
    },

    #[error("contract mismatch for {identity}: expected {expected:?}, got {got}")]
    ContractMismatch {
        identity: String,
        expected: Option<String>,
        got: String,
    },

    #[error("operation {operation} is not registered on unit {unit}")]
    OperationNotFound { unit: String, operation: String },

    #[error("could not materialize {identity}")]
    Materialize {
        identity: String,
        #[source]
        source: crate::typed::services::MaterializeError,
    },

    #[error("could not decode arguments for {unit}.{operation}")]
    Arguments {
        unit: String,
        operation: String,
        #[source]
        source: DecodeError,
    },

    #[error("could not encode result of {unit}.{operation}")]
    EncodeResult {
        unit: String,
        operation: String,
        #[source]
        source: EncodeError,
    },
}

impl GateFault {
    fn kind(&self) -> &'static str {
        match self {
            Self::ArtifactUnavailable(_) => "ArtifactUnavailable",
            Self::MalformedArtifact { .. } => "MalformedArtifact",
            Self::ArtifactIdentityMismatch { .. } => "ArtifactIdentityMismatch",
            Self::UnknownUnit(_) => "UnknownUnit",
            Self::RevisionMismatch { .. } => "RevisionMismatch",
            Self::ContractMismatch { .. } => "ContractMismatch",
            Self::OperationNotFound { .. } => "OperationNotFound",
            Self::Materialize { .. } => "Materialize",
            Self::Arguments { .. } => "Arguments",
            Self::EncodeResult { .. } => "EncodeResult",
        }
    }

    pub fn into_remote(self) -> RemoteError {
        RemoteError::from_error(self.kind(), &self)
    }
}

/// BuildError はクライアント側で descriptor を作れなかったエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("artifact unavailable for identity {0}")]
    ArtifactUnavailable(String),

    #[error("handle targets {handle} but the task runs on {task}")]
    TargetMismatch { handle: String, task: String },

    #[error("could not encode captured values")]
    Encode(#[from] EncodeError),
}

/// TransportError は 1 回の往復そのものの失敗
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),

    #[error("could not build http client: {0}")]
    Client(String),

    #[error("could not reach {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("{endpoint} answered with status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

/// GateError はゲート呼び出し全体のエラー
///
/// テストでは `matches!(err, GateError::RemoteTaskFailure(_))` のように
/// どの層で失敗したかを判定できます。
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not decode remote value")]
    Decode(#[from] DecodeError),

    #[error("gate failed to run the task: {0}")]
    GateFailure(RemoteError),

    #[error("remote task failed: {0}")]
    RemoteTaskFailure(RemoteError),

    #[error("scheduler is closed")]
    SchedulerClosed,

    #[error("warp worker stopped: {0}")]
    Worker(String),
}

impl GateError {
    pub fn is_remote_task_failure(&self) -> bool {
        matches!(self, Self::RemoteTaskFailure(_))
    }

    pub fn is_gate_failure(&self) -> bool {
        matches!(self, Self::GateFailure(_))
    }

    /// ホストから運ばれてきたエラー（GateFailure / RemoteTaskFailure）
    pub fn remote_error(&self) -> Option<&RemoteError> {
        match self {
            Self::GateFailure(e) | Self::RemoteTaskFailure(e) => Some(e),
            _ => None,
        }
    }
}
