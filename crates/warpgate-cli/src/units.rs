//! デモ用の unit 群。`warpgate serve` がこれを登録し、`warpgate warp` が呼び出す
//!
//! - `Adder` / `Divider`: 引数だけで完結する unit
//! - `Gatekeeper`: ホストの `Rendezvous` サービスを注入される unit（`Gatekeeper$Phase` を要求）

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use warpgate_core::app::{Catalog, Host, HostBuilder};
use warpgate_core::{Handler, MaterializeError, Services, TaskFailure, Unit, Warpable};

pub struct Adder;

impl Unit for Adder {
    const IDENTITY: &'static str = "Adder";
    const CONTRACT: Option<&'static str> = Some("Calculator");

    fn materialize(_services: &Services) -> Result<Self, MaterializeError> {
        Ok(Adder)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Add(pub i64, pub i64);

impl Warpable for Add {
    type Unit = Adder;
    type Output = i64;
    const OPERATION: &'static str = "add";
}

#[async_trait]
impl Handler<Add> for Adder {
    async fn handle(&self, task: Add) -> Result<i64, TaskFailure> {
        task.0
            .checked_add(task.1)
            .ok_or_else(|| TaskFailure::with_kind("ArithmeticError", "overflow"))
    }
}

pub struct Divider;

impl Unit for Divider {
    const IDENTITY: &'static str = "Divider";

    fn materialize(_services: &Services) -> Result<Self, MaterializeError> {
        Ok(Divider)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Divide(pub i64, pub i64);

impl Warpable for Divide {
    type Unit = Divider;
    type Output = i64;
    const OPERATION: &'static str = "divide";
}

#[async_trait]
impl Handler<Divide> for Divider {
    async fn handle(&self, task: Divide) -> Result<i64, TaskFailure> {
        if task.1 == 0 {
            return Err(TaskFailure::with_kind("ArithmeticError", "division by zero"));
        }
        task.0
            .checked_div(task.1)
            .ok_or_else(|| TaskFailure::with_kind("ArithmeticError", "overflow"))
    }
}

/// Rendezvous はホスト全体で 1 つだけ持つ同期点
///
/// 参加者（parties）が全員 arrive すると phase が 1 進みます。
/// テストが複数のリクエストをまたいで待ち合わせるために使います。
#[derive(Debug, Default)]
pub struct Rendezvous {
    state: Mutex<Phase>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub phase: u64,
    pub parties: u32,
    pub arrived: u32,
}

impl Rendezvous {
    fn update<R>(&self, f: impl FnOnce(&mut Phase) -> R) -> Result<R, TaskFailure> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| TaskFailure::with_kind("Poisoned", "rendezvous lock poisoned"))?;
        Ok(f(&mut state))
    }
}

pub struct Gatekeeper {
    rendezvous: Arc<Rendezvous>,
}

impl Unit for Gatekeeper {
    const IDENTITY: &'static str = "Gatekeeper";
    const REQUIRES: &'static [&'static str] = &["Gatekeeper$Phase"];

    fn materialize(services: &Services) -> Result<Self, MaterializeError> {
        Ok(Gatekeeper {
            rendezvous: services.get()?,
        })
    }
}

/// Phase を運ぶ nested unit（materialize されるだけで操作は持たない）
pub struct PhaseUnit;

impl Unit for PhaseUnit {
    const IDENTITY: &'static str = "Gatekeeper$Phase";

    fn materialize(_services: &Services) -> Result<Self, MaterializeError> {
        Ok(PhaseUnit)
    }
}

/// 参加者を 1 人増やす
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Join;

impl Warpable for Join {
    type Unit = Gatekeeper;
    type Output = Phase;
    const OPERATION: &'static str = "join";
}

#[async_trait]
impl Handler<Join> for Gatekeeper {
    async fn handle(&self, _task: Join) -> Result<Phase, TaskFailure> {
        self.rendezvous.update(|state| {
            state.parties += 1;
            *state
        })
    }
}

/// 到着を記録する。全員そろうと phase が進み arrived は 0 に戻る
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrive;

impl Warpable for Arrive {
    type Unit = Gatekeeper;
    type Output = Phase;
    const OPERATION: &'static str = "arrive";
}

#[async_trait]
impl Handler<Arrive> for Gatekeeper {
    async fn handle(&self, _task: Arrive) -> Result<Phase, TaskFailure> {
        self.rendezvous
            .update(|state| {
                if state.parties == 0 {
                    return Err(TaskFailure::with_kind(
                        "IllegalState",
                        "arrive without any registered party",
                    ));
                }
                state.arrived += 1;
                if state.arrived >= state.parties {
                    state.phase += 1;
                    state.arrived = 0;
                }
                Ok(*state)
            })
            .and_then(|r| r)
    }
}

/// 新しい Rendezvous に取り替える（phase も parties も 0 に戻る）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetRendezvous;

impl Warpable for ResetRendezvous {
    type Unit = Gatekeeper;
    type Output = ();
    const OPERATION: &'static str = "reset";
}

#[async_trait]
impl Handler<ResetRendezvous> for Gatekeeper {
    async fn handle(&self, _task: ResetRendezvous) -> Result<(), TaskFailure> {
        self.rendezvous.update(|state| *state = Phase::default())
    }
}

/// デモ unit を全て登録したホスト
pub fn host() -> anyhow::Result<Host> {
    let host = HostBuilder::new()
        .register::<Add>()?
        .register::<Divide>()?
        .register::<Join>()?
        .register::<Arrive>()?
        .register::<ResetRendezvous>()?
        .register_unit::<PhaseUnit>()?
        .provide(Arc::new(Rendezvous::default()))
        .build()?;
    Ok(host)
}

/// クライアント側で nested unit を解決するための catalog
pub fn catalog() -> Catalog {
    Catalog::new().with::<PhaseUnit>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpgate_core::Gate;

    fn gate() -> Gate {
        Gate::local(Arc::new(host().unwrap()), catalog())
    }

    #[tokio::test]
    async fn rendezvous_advances_when_all_parties_arrive() {
        let gate = gate();
        let keeper = gate.handle::<Gatekeeper>();

        gate.warp(&keeper, &Join).await.unwrap();
        gate.warp(&keeper, &Join).await.unwrap();

        let first = gate.warp(&keeper, &Arrive).await.unwrap();
        assert_eq!((first.phase, first.arrived), (0, 1));
        let second = gate.warp(&keeper, &Arrive).await.unwrap();
        assert_eq!((second.phase, second.arrived), (1, 0));

        gate.warp(&keeper, &ResetRendezvous).await.unwrap();
        let err = gate.warp(&keeper, &Arrive).await.unwrap_err();
        assert!(err.is_remote_task_failure());
        assert_eq!(err.remote_error().unwrap().kind, "IllegalState");
    }

    #[tokio::test]
    async fn demo_arithmetic() {
        let gate = gate();
        assert_eq!(gate.warp(&gate.handle::<Adder>(), &Add(2, 3)).await.unwrap(), 5);
        let err = gate
            .warp(&gate.handle::<Divider>(), &Divide(1, 0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("division by zero"));

        let err = gate
            .warp(&gate.handle::<Divider>(), &Divide(i64::MIN, -1))
            .await
            .unwrap_err();
        assert_eq!(err.remote_error().unwrap().message, "overflow");
    }
}
