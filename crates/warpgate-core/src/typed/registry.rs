//! UnitRegistry - ホストに静的に登録された unit と operation の管理
//!
//! # 学習ポイント
//! - HashMap での型消去された trait object の管理
//! - Generic methods での登録と型安全性
//! - Arc による共有所有権
//!
//! 起動時に組み立て（mutable）、実行時は読み取りのみ（immutable）。
//! リクエストごとの materialize はここを書き換えないので、ロックは不要です。

use crate::domain::artifact::ArtifactManifest;
use crate::typed::handler::TypedHandler;

use super::handler::{DynHandler, Handler};
use super::task::{Unit, Warpable};
use std::collections::HashMap;
use std::sync::Arc;

/// UnitRegistry は (unit, operation) → DynHandler と、unit の manifest を保持
///
/// # 使用例
/// ```ignore
/// let mut registry = UnitRegistry::new();
/// registry.register::<Add>()?;          // Adder の manifest も登録される
/// registry.register_unit::<LedgerEntry>()?; // operation を持たない nested unit
///
/// let handler = registry.get("Adder", "add");
/// ```
#[derive(Default)]
pub struct UnitRegistry {
    units: HashMap<String, ArtifactManifest>,
    handlers: HashMap<(String, String), Arc<dyn DynHandler>>,
}

/// RegistryError は UnitRegistry の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("operation '{operation}' on unit '{unit}' is already registered")]
    AlreadyRegistered { unit: String, operation: String },

    #[error("unit '{0}' was registered twice with different manifests")]
    ConflictingManifest(String),
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// T::Unit 上の T::OPERATION を登録する
    pub fn register<T>(&mut self) -> Result<(), RegistryError>
    where
        T: Warpable,
        T::Unit: Handler<T>,
    {
        let key = (T::Unit::IDENTITY.to_string(), T::OPERATION.to_string());
        if self.handlers.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered {
                unit: key.0,
                operation: key.1,
            });
        }
        self.register_unit::<T::Unit>()?;
        self.handlers.insert(key, Arc::new(TypedHandler::<T>::new()));
        Ok(())
    }

    /// unit の manifest だけを登録する。同じ manifest の再登録は何もしない
    pub fn register_unit<U: Unit>(&mut self) -> Result<(), RegistryError> {
        let manifest = ArtifactManifest::of::<U>();
        match self.units.get(U::IDENTITY) {
            Some(existing) if *existing == manifest => Ok(()),
            Some(_) => Err(RegistryError::ConflictingManifest(U::IDENTITY.to_string())),
            None => {
                self.units.insert(U::IDENTITY.to_string(), manifest);
                Ok(())
            }
        }
    }

    pub fn get(&self, unit: &str, operation: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers
            .get(&(unit.to_string(), operation.to_string()))
            .cloned()
    }

    pub fn manifest(&self, identity: &str) -> Option<&ArtifactManifest> {
        self.units.get(identity)
    }

    pub fn registered_units(&self) -> Vec<String> {
        let mut units: Vec<String> = self.units.keys().cloned().collect();
        units.sort();
        units
    }

    pub fn registered_operations(&self, unit: &str) -> Vec<String> {
        let mut ops: Vec<String> = self
            .handlers
            .keys()
            .filter(|(u, _)| u == unit)
            .map(|(_, op)| op.clone())
            .collect();
        ops.sort();
        ops
    }
}
