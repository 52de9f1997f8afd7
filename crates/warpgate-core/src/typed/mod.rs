//! Typed - 型付き Unit / Warpable API
//!
//! このモジュールは operation 名や unit 名の typo を型で排除し、
//! Handler との対応付けを静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Unit`, `Warpable`, `Handler<T>` - 型安全
//! - **内部（Dyn）**: `DynHandler` - object-safe, type erasure

pub mod task;
pub mod handler;
pub mod registry;
pub mod codec;
pub mod services;

// 主要な trait/型 を再エクスポート
pub use self::task::{Unit, Warpable};
pub use self::handler::{DynHandler, Handler};
pub use self::registry::{RegistryError, UnitRegistry};
pub use self::codec::{DecodeError, EncodeError, PayloadCodec};
pub use self::services::{MaterializeError, Services};
