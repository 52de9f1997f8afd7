//! Scheduler - warp を待たずに投げるための非同期スケジューラ
//!
//! # 学習ポイント
//! - 明示的な生成と shutdown（グローバルなプールを持たない）
//! - Semaphore による同時実行数の上限
//! - JoinHandle を包んだ独自 Future（WarpHandle）
//!
//! # 方針
//! - `submit()` は決してブロックしない。上限を超えた分はプール内で順番を待つ
//! - 実行中の warp はキャンセルできない。WarpHandle を drop しても往復は最後まで走る
//! - `shutdown()` 以降の submit は `GateError::SchedulerClosed` で即座に終わる

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};

use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::app::gate::Gate;
use crate::domain::errors::GateError;
use crate::domain::handle::RemoteHandle;
use crate::typed::task::Warpable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// 同時に走らせる往復の上限（0 は 1 として扱う）
    pub max_in_flight: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_in_flight: 16 }
    }
}

/// Scheduler は呼び出し側が所有するワーカープール
///
/// tokio ランタイムの中で使います（`submit` は `tokio::spawn` する）。
pub struct Scheduler {
    gate: Arc<Gate>,
    permits: Arc<Semaphore>,
    tracker: Arc<Tracker>,
    closed: AtomicBool,
}

/// 投入済みで未完了の warp の数
#[derive(Default)]
struct Tracker {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// spawn したタスクと一緒に drop される
struct InFlight(Arc<Tracker>);

impl InFlight {
    fn enter(tracker: &Arc<Tracker>) -> Self {
        tracker.in_flight.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(tracker))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl Scheduler {
    pub fn new(gate: Arc<Gate>, config: SchedulerConfig) -> Self {
        let max_in_flight = config.max_in_flight.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            gate,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            tracker: Arc::new(Tracker::default()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 投入済みで未完了の warp の数
    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight.load(Ordering::Acquire)
    }

    /// warp をプールに投げる。往復は返された WarpHandle を待つと結果になる
    pub fn submit<T: Warpable>(&self, handle: RemoteHandle, task: T) -> WarpHandle<T::Output> {
        if self.is_closed() {
            return WarpHandle::rejected();
        }
        let gate = Arc::clone(&self.gate);
        let permits = Arc::clone(&self.permits);
        let guard = InFlight::enter(&self.tracker);

        let join = tokio::spawn(async move {
            let _guard = guard;
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| GateError::SchedulerClosed)?;
            gate.warp(&handle, &task).await
        });
        WarpHandle::spawned(join)
    }

    /// 新規の受付を止め、投入済みの warp が全て終わるまで待つ
    ///
    /// 以降の `submit` は `GateError::SchedulerClosed` を返す WarpHandle になる。
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        debug!(in_flight = self.in_flight(), "scheduler draining");
        loop {
            // notified() を先に作ってから数を見る（取りこぼし防止）
            let idle = self.tracker.idle.notified();
            if self.in_flight() == 0 {
                break;
            }
            idle.await;
        }
        self.permits.close();
        info!("scheduler stopped");
    }
}

enum Inner<R> {
    Spawned(JoinHandle<Result<R, GateError>>),
    Rejected,
    Done,
}

/// WarpHandle は投入した warp の結果を待つ Future
///
/// `Output = Result<R, GateError>`。drop しても warp は止まりません。
pub struct WarpHandle<R> {
    inner: Inner<R>,
}

impl<R> WarpHandle<R> {
    fn spawned(join: JoinHandle<Result<R, GateError>>) -> Self {
        Self {
            inner: Inner::Spawned(join),
        }
    }

    fn rejected() -> Self {
        Self {
            inner: Inner::Rejected,
        }
    }

    pub fn is_finished(&self) -> bool {
        match &self.inner {
            Inner::Spawned(join) => join.is_finished(),
            Inner::Rejected | Inner::Done => true,
        }
    }
}

impl<R> Future for WarpHandle<R> {
    type Output = Result<R, GateError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let result = match &mut this.inner {
            Inner::Spawned(join) => match Pin::new(join).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(result)) => result,
                Poll::Ready(Err(join_error)) => Err(GateError::Worker(join_error.to_string())),
            },
            Inner::Rejected => Err(GateError::SchedulerClosed),
            Inner::Done => Err(GateError::Worker("polled after completion".to_string())),
        };
        this.inner = Inner::Done;
        Poll::Ready(result)
    }
}
