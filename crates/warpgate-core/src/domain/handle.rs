use std::fmt;

use crate::typed::task::Unit;

/// RemoteHandle はクライアントが持つ (endpoint, target) の組
///
/// 不変で、ホスト側に対応する状態はありません。
/// 呼び出しごとに TaskDescriptor を一から作り直します。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteHandle {
    endpoint: String,
    target: String,
}

impl RemoteHandle {
    pub fn new(endpoint: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            target: target.into(),
        }
    }

    pub fn of<U: Unit>(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, U::IDENTITY)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.target, self.endpoint)
    }
}
