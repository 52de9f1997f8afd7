//! Handler trait - Unit 上で Warpable を実行する
//!
//! # 学習ポイント
//! - ジェネリック trait (Handler<T>)
//! - Object-safe trait (DynHandler)
//! - Type erasure パターン (TypedHandler<T> → DynHandler)

use super::codec::PayloadCodec;
use super::services::Services;
use super::task::{Unit, Warpable};
use crate::domain::errors::{GateFault, RemoteError, TaskFailure};
use crate::domain::outcome::Outcome;
use async_trait::async_trait;
use std::any::Any;
use std::marker::PhantomData;

/// Handler は materialize 済みの unit 上で task を実行する
///
/// # 使用例
/// ```ignore
/// #[async_trait]
/// impl Handler<Add> for Adder {
///     async fn handle(&self, task: Add) -> Result<i64, TaskFailure> {
///         Ok(task.0 + task.1)
///     }
/// }
/// ```
///
/// # ジェネリクスによる型安全性
/// - `Handler<Add>` の戻り値は `Add::Output` に固定される
/// - unit 型が `Handler<T>` を実装していなければ登録できない
#[async_trait]
pub trait Handler<T: Warpable>: Send + Sync {
    async fn handle(&self, task: T) -> Result<T::Output, TaskFailure>;
}

/// DynHandler は object-safe な Handler の抽象化
///
/// materialize → decode → invoke → encode を 1 つにまとめ、
/// 結果を常に Outcome として返します（panic も Outcome になる）。
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn invoke(&self, services: &Services, arguments: &str) -> Outcome;
    fn unit(&self) -> &'static str;
    fn operation(&self) -> &'static str;
}

pub struct TypedHandler<T: Warpable> {
    _marker: PhantomData<T>,
}

impl<T: Warpable> TypedHandler<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Warpable> Default for TypedHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> DynHandler for TypedHandler<T>
where
    T: Warpable,
    T::Unit: Handler<T>,
{
    async fn invoke(&self, services: &Services, arguments: &str) -> Outcome {
        // (1)-(3) の失敗は gate 側
        let unit = match T::Unit::materialize(services) {
            Ok(unit) => unit,
            Err(source) => {
                return Outcome::gate_failure(
                    GateFault::Materialize {
                        identity: T::Unit::IDENTITY.to_string(),
                        source,
                    }
                    .into_remote(),
                );
            }
        };
        let task: T = match PayloadCodec::decode(arguments) {
            Ok(task) => task,
            Err(source) => {
                return Outcome::gate_failure(
                    GateFault::Arguments {
                        unit: T::Unit::IDENTITY.to_string(),
                        operation: T::OPERATION.to_string(),
                        source,
                    }
                    .into_remote(),
                );
            }
        };

        // handler は別タスクで動かし、panic を task 側の失敗として拾う
        let joined = tokio::spawn(async move { unit.handle(task).await }).await;
        let output = match joined {
            Ok(Ok(output)) => output,
            Ok(Err(failure)) => return Outcome::task_failure(failure.into_remote()),
            Err(join_error) if join_error.is_panic() => {
                let message = panic_message(join_error.into_panic());
                return Outcome::task_failure(RemoteError::new("Panic", message));
            }
            Err(join_error) => {
                return Outcome::task_failure(RemoteError::new("Cancelled", join_error.to_string()));
            }
        };

        match PayloadCodec::encode(&output) {
            Ok(value) => Outcome::success(value),
            Err(source) => Outcome::gate_failure(
                GateFault::EncodeResult {
                    unit: T::Unit::IDENTITY.to_string(),
                    operation: T::OPERATION.to_string(),
                    source,
                }
                .into_remote(),
            ),
        }
    }

    fn unit(&self) -> &'static str {
        T::Unit::IDENTITY
    }

    fn operation(&self) -> &'static str {
        T::OPERATION
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
