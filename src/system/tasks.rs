//! Fire-and-forget background work
//!
//! Everything that must not hold up a response (cache sync after a
//! mutation, tap logging after a redirect) goes through [`BackgroundTasks`].
//!
//! Contract: a spawned task may fail silently. Its error is logged and
//! dropped; nothing is retried and the caller is never told. The only
//! thing the runner guarantees is that shutdown can wait, with a deadline,
//! for tasks still in flight.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, trace, warn};

#[derive(Default)]
struct Inner {
    in_flight: AtomicUsize,
    failed: AtomicU64,
    completed: AtomicU64,
    idle: Notify,
}

/// 后台任务运行器（可克隆，共享计数）
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

/// 在任务结束（包括 panic / 被取消）时递减 in_flight
struct InFlightGuard(Arc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 派发一个后台任务，不等待结果
    ///
    /// 失败只记录日志。
    pub fn spawn<F>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(self.inner.clone());

        tokio::spawn(async move {
            let guard = guard;
            match fut.await {
                Ok(()) => {
                    guard.0.completed.fetch_add(1, Ordering::Relaxed);
                    trace!("Background task '{}' completed", name);
                }
                Err(e) => {
                    guard.0.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Background task '{}' failed: {:#}", name, e);
                }
            }
        });
    }

    /// 当前未完成的任务数
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// 已失败的任务数（仅用于观测）
    pub fn failed(&self) -> u64 {
        self.inner.failed.load(Ordering::Relaxed)
    }

    /// 已成功完成的任务数
    pub fn completed(&self) -> u64 {
        self.inner.completed.load(Ordering::Relaxed)
    }

    /// 等待所有任务结束，最多等待 `timeout`
    ///
    /// 返回 `true` 表示在期限内清空。
    pub async fn drain(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.inner.idle.notified();
                if self.in_flight() == 0 {
                    return;
                }
                notified.await;
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(()) => {
                debug!("All background tasks drained");
                true
            }
            Err(_) => {
                warn!(
                    "{} background task(s) still running after {:?}",
                    self.in_flight(),
                    timeout
                );
                false
            }
        }
    }
}
