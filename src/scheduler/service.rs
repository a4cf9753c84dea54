use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{Evaluation, evaluate, parse_timezone};
use crate::errors::{Result, TaplinkerError};
use crate::storage::SeaOrmStorage;
use crate::storage::models::{Event, Window};
use crate::sync::RedirectMapSynchronizer;
use crate::system::BackgroundTasks;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub evaluated: u64,
    pub changed: u64,
    pub failed: u64,
}

/// 把 [`evaluate`] 的结果落库，并在变化时调度缓存同步
#[derive(Clone)]
pub struct WindowScheduler {
    storage: Arc<SeaOrmStorage>,
    synchronizer: Arc<RedirectMapSynchronizer>,
    tasks: BackgroundTasks,
}

impl WindowScheduler {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        synchronizer: Arc<RedirectMapSynchronizer>,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            storage,
            synchronizer,
            tasks,
        }
    }

    /// 重新评估单个活动（读或写窗口数据时调用）
    pub async fn refresh_event(&self, event_id: i64) -> Result<Evaluation> {
        self.refresh_event_at(event_id, Utc::now()).await
    }

    pub async fn refresh_event_at(&self, event_id: i64, now: DateTime<Utc>) -> Result<Evaluation> {
        let event = self.load_event(event_id).await?;
        let evaluation = self.reconcile(&event, now).await?;
        if evaluation.changed {
            self.schedule_sync(vec![event_id]);
        }
        Ok(evaluation)
    }

    /// 同步前对齐生效窗口
    ///
    /// 只写库，不调度同步。`None` 表示全部排期活动，返回发生切换的活动数。
    pub async fn reconcile_events(&self, event_ids: Option<&[i64]>) -> Result<u64> {
        let events = match event_ids {
            None => self.storage.list_scheduled_events().await?,
            Some(ids) => {
                let mut events = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Some(event) = self.storage.get_event(*id).await? {
                        events.push(event);
                    }
                }
                events
            }
        };

        let now = Utc::now();
        let mut changed = 0;
        for event in &events {
            if self.reconcile(event, now).await?.changed {
                changed += 1;
            }
        }
        if changed > 0 {
            debug!("Reconciled {} events before sync", changed);
        }
        Ok(changed)
    }

    /// 巡检所有开启排期模式的活动
    ///
    /// 单个活动失败只计数，不影响其余活动。
    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let events = self.storage.list_scheduled_events().await?;
        let mut report = SweepReport::default();
        let mut changed_ids = Vec::new();

        for event in &events {
            report.evaluated += 1;
            match self.reconcile(event, now).await {
                Ok(evaluation) if evaluation.changed => {
                    report.changed += 1;
                    changed_ids.push(event.id);
                }
                Ok(_) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!("Sweep failed for event {}: {}", event.id, e);
                }
            }
        }

        if !changed_ids.is_empty() {
            self.schedule_sync(changed_ids);
        }

        if report.changed > 0 || report.failed > 0 {
            info!(
                "Window sweep: {} evaluated, {} changed, {} failed",
                report.evaluated, report.changed, report.failed
            );
        } else {
            debug!("Window sweep: {} evaluated, no changes", report.evaluated);
        }
        Ok(report)
    }

    /// 手动切换窗口，同时关闭该活动的排期模式
    pub async fn set_window_active(&self, window_id: i64, active: bool) -> Result<Window> {
        let window = self
            .storage
            .set_window_active_manually(window_id, active)
            .await?;
        self.schedule_sync(vec![window.event_id]);
        Ok(window)
    }

    /// 开关排期模式；开启时立即评估一次
    pub async fn set_schedule_mode(&self, event_id: i64, enabled: bool) -> Result<Option<Evaluation>> {
        self.storage.set_schedule_mode(event_id, enabled).await?;

        let evaluation = if enabled {
            let event = self.load_event(event_id).await?;
            Some(self.reconcile(&event, Utc::now()).await?)
        } else {
            None
        };

        self.schedule_sync(vec![event_id]);
        Ok(evaluation)
    }

    async fn load_event(&self, event_id: i64) -> Result<Event> {
        self.storage
            .get_event(event_id)
            .await?
            .ok_or_else(|| TaplinkerError::not_found(format!("活动不存在: {}", event_id)))
    }

    /// 评估并在需要时写库；不调度同步
    async fn reconcile(&self, event: &Event, now: DateTime<Utc>) -> Result<Evaluation> {
        let windows = self.storage.list_windows(event.id).await?;

        if !event.schedule_mode || event.is_cancelled() {
            // 手动模式下保持操作员设置的状态
            let active = windows.iter().find(|w| w.is_active).map(|w| w.id);
            return Ok(Evaluation {
                changed: false,
                active_window_id: active,
            });
        }

        let evaluation = evaluate(&windows, now, parse_timezone(&event.timezone));
        if !evaluation.changed {
            return Ok(evaluation);
        }

        let applied = self
            .storage
            .apply_active_window(event.id, evaluation.active_window_id)
            .await?;
        if !applied {
            // 评估期间操作员接管了该活动
            let active = windows.iter().find(|w| w.is_active).map(|w| w.id);
            return Ok(Evaluation {
                changed: false,
                active_window_id: active,
            });
        }

        info!(
            "Event {} active window -> {:?}",
            event.id, evaluation.active_window_id
        );
        Ok(evaluation)
    }

    fn schedule_sync(&self, event_ids: Vec<i64>) {
        let synchronizer = self.synchronizer.clone();
        self.tasks.spawn("redirect-map-sync", async move {
            let report = synchronizer
                .sync(Some(&event_ids))
                .await
                .with_context(|| format!("redirect map sync for events {:?}", event_ids))?;
            debug!("Background sync finished: {:?}", report);
            Ok(())
        });
    }
}
