//! Services - ホスト側の ambient な依存注入レイヤー
//!
//! # 学習ポイント
//! - `TypeId` をキーにした型消去マップ
//! - `Arc<dyn Any + Send + Sync>` から `Arc<T>` への downcast
//!
//! ホスト起動時に組み立てて以降は不変です。全リクエストで共有されますが、
//! materialize は読み取りだけなので、リクエスト間で状態が混ざりません。

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// MaterializeError は unit を組み立てられなかったエラー
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("service {0} is not provided by this host")]
    MissingService(&'static str),

    #[error("{0}")]
    Other(String),
}

/// Services はホストが提供するサービスの集合
///
/// # 使用例
/// ```ignore
/// let services = Services::new().with(Arc::new(Rendezvous::default()));
/// let rendezvous: Arc<Rendezvous> = services.get()?;
/// ```
#[derive(Clone, Default)]
pub struct Services {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同じ型が既にあれば置き換える
    pub fn provide<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.entries.insert(TypeId::of::<T>(), service);
    }

    pub fn with<T: Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        self.provide(service);
        self
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, MaterializeError> {
        self.entries
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
            .ok_or(MaterializeError::MissingService(std::any::type_name::<T>()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Counter(AtomicU32);

    #[test]
    fn provided_service_is_shared() {
        let services = Services::new().with(Arc::new(Counter(AtomicU32::new(0))));

        let a: Arc<Counter> = services.get().unwrap();
        let b: Arc<Counter> = services.get().unwrap();
        a.0.fetch_add(1, Ordering::SeqCst);
        assert_eq!(b.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_service_is_named() {
        let services = Services::new();
        let err = services.get::<Counter>().unwrap_err();
        assert!(matches!(err, MaterializeError::MissingService(name) if name.ends_with("Counter")));
    }

    #[test]
    fn provide_replaces_existing() {
        let mut services = Services::new();
        services.provide(Arc::new(7_u64));
        services.provide(Arc::new(9_u64));
        assert_eq!(services.len(), 1);
        assert_eq!(*services.get::<u64>().unwrap(), 9);
    }
}
