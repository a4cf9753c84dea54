use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::Result;
use crate::storage::SeaOrmStorage;
use crate::scheduler::WindowScheduler;
use crate::storage::models::{Band, EventStatus};
use crate::sync::RedirectMapSynchronizer;
use crate::system::BackgroundTasks;

/// 活动与手环的变更入口
///
/// 数据库写入同步完成；边缘缓存的更新交给后台任务，调用方不等待。
#[derive(Clone)]
pub struct EventService {
    storage: Arc<SeaOrmStorage>,
    synchronizer: Arc<RedirectMapSynchronizer>,
    scheduler: WindowScheduler,
    tasks: BackgroundTasks,
}

impl EventService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        synchronizer: Arc<RedirectMapSynchronizer>,
        scheduler: WindowScheduler,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            storage,
            synchronizer,
            scheduler,
            tasks,
        }
    }

    /// 取消活动并清除其全部缓存条目
    pub async fn cancel_event(&self, event_id: i64) -> Result<()> {
        self.set_status(event_id, EventStatus::Cancelled).await
    }

    /// 更新活动状态
    ///
    /// 取消 → 后台清除缓存；其他状态 → 先对齐排期窗口，再后台重新同步。
    pub async fn set_status(&self, event_id: i64, status: EventStatus) -> Result<()> {
        self.storage.set_event_status(event_id, status).await?;
        if status != EventStatus::Cancelled {
            self.scheduler.reconcile_events(Some(&[event_id])).await?;
        }

        let synchronizer = self.synchronizer.clone();
        if status == EventStatus::Cancelled {
            self.tasks.spawn("event-purge", async move {
                let report = synchronizer
                    .purge(event_id)
                    .await
                    .with_context(|| format!("purging event {}", event_id))?;
                debug!("Purge of event {} finished: {:?}", event_id, report);
                Ok(())
            });
        } else {
            self.tasks.spawn("redirect-map-sync", async move {
                synchronizer
                    .sync(Some(&[event_id]))
                    .await
                    .with_context(|| format!("redirect map sync for event {}", event_id))?;
                Ok(())
            });
        }

        info!("Event {} status updated to {}", event_id, status);
        Ok(())
    }

    /// 软删除手环并移除其缓存条目
    pub async fn delete_band(&self, band_id: i64) -> Result<Band> {
        let band = self.storage.soft_delete_band(band_id).await?;

        let synchronizer = self.synchronizer.clone();
        let code = band.code.clone();
        self.tasks.spawn("band-removal", async move {
            synchronizer
                .remove_bands(std::slice::from_ref(&code))
                .await
                .with_context(|| format!("removing band {} from edge cache", code))?;
            Ok(())
        });

        Ok(band)
    }
}
