//! テスト用の unit / warpable / ホスト。
//!
//! - `Adder`: 足し算（`Calculator` contract を持つ）
//! - `Divider`: 0 除算で失敗する / panic する
//! - `Ledger`: nested unit `Ledger$Entry` を要求し、`Tally` サービスを注入される

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use crate::app::descriptor_builder::Catalog;
use crate::app::host::{Host, HostBuilder};
use crate::domain::errors::TaskFailure;
use crate::typed::{Handler, MaterializeError, Services, Unit, Warpable};

pub struct Adder;

impl Unit for Adder {
    const IDENTITY: &'static str = "Adder";
    const CONTRACT: Option<&'static str> = Some("Calculator");

    fn materialize(_services: &Services) -> Result<Self, MaterializeError> {
        Ok(Adder)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Add(pub i64, pub i64);

impl Warpable for Add {
    type Unit = Adder;
    type Output = i64;
    const OPERATION: &'static str = "add";
}

#[async_trait]
impl Handler<Add> for Adder {
    async fn handle(&self, task: Add) -> Result<i64, TaskFailure> {
        Ok(task.0 + task.1)
    }
}

/// 待ってから足す。並行呼び出しの独立性を見るため
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowAdd {
    pub a: i64,
    pub b: i64,
    pub delay_ms: u64,
}

impl Warpable for SlowAdd {
    type Unit = Adder;
    type Output = i64;
    const OPERATION: &'static str = "slow_add";
}

#[async_trait]
impl Handler<SlowAdd> for Adder {
    async fn handle(&self, task: SlowAdd) -> Result<i64, TaskFailure> {
        tokio::time::sleep(Duration::from_millis(task.delay_ms)).await;
        Ok(task.a + task.b)
    }
}

pub struct Divider;

impl Unit for Divider {
    const IDENTITY: &'static str = "Divider";

    fn materialize(_services: &Services) -> Result<Self, MaterializeError> {
        Ok(Divider)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explode(pub String);

impl Warpable for Explode {
    type Unit = Divider;
    type Output = ();
    const OPERATION: &'static str = "explode";
}

#[async_trait]
impl Handler<Explode> for Divider {
    async fn handle(&self, task: Explode) -> Result<(), TaskFailure> {
        panic!("{}", task.0);
    }
}

/// ホストの app-scoped サービス
#[derive(Debug, Default)]
pub struct Tally {
    total: AtomicI64,
}

impl Tally {
    pub fn total(&self) -> i64 {
        self.total.load(Ordering::SeqCst)
    }
}

pub struct Ledger {
    tally: Arc<Tally>,
}

impl Unit for Ledger {
    const IDENTITY: &'static str = "Ledger";
    const REVISION: u32 = 2;
    const REQUIRES: &'static [&'static str] = &["Ledger$Entry"];

    fn materialize(services: &Services) -> Result<Self, MaterializeError> {
        Ok(Ledger {
            tally: services.get()?,
        })
    }
}

pub struct LedgerEntry;

impl Unit for LedgerEntry {
    const IDENTITY: &'static str = "Ledger$Entry";

    fn materialize(_services: &Services) -> Result<Self, MaterializeError> {
        Ok(LedgerEntry)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit(pub i64);

impl Warpable for Credit {
    type Unit = Ledger;
    type Output = i64;
    const OPERATION: &'static str = "credit";
}

#[async_trait]
impl Handler<Credit> for Ledger {
    async fn handle(&self, task: Credit) -> Result<i64, TaskFailure> {
        Ok(self.tally.total.fetch_add(task.0, Ordering::SeqCst) + task.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reset;

impl Warpable for Reset {
    type Unit = Ledger;
    type Output = ();
    const OPERATION: &'static str = "reset";
}

#[async_trait]
impl Handler<Reset> for Ledger {
    async fn handle(&self, _task: Reset) -> Result<(), TaskFailure> {
        self.tally.total.store(0, Ordering::SeqCst);
        Ok(())
    }
}

/// 全 fixture を登録したホストと、そのホストが使う Tally
pub fn host() -> (Host, Arc<Tally>) {
    let tally = Arc::new(Tally::default());
    let host = HostBuilder::new()
        .register::<Add>()
        .and_then(|b| b.register::<SlowAdd>())
        .and_then(|b| b.register::<Divide>())
        .and_then(|b| b.register::<Explode>())
        .and_then(|b| b.register::<Credit>())
        .and_then(|b| b.register::<Reset>())
        .and_then(|b| b.register_unit::<LedgerEntry>())
        .unwrap()
        .provide(tally.clone())
        .build()
        .unwrap();
    (host, tally)
}

/// nested unit を解決できるクライアント側 catalog
pub fn catalog() -> Catalog {
    Catalog::new().with::<LedgerEntry>()
}
