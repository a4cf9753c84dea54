use std::sync::Arc;

use anyhow::Context;
use tracing::trace;

use super::keys::TapKeys;
use super::record::TapRecord;
use super::store::{FastStore, TapBatch};
use crate::system::BackgroundTasks;

/// 点击记录器
///
/// `log` 立即返回；批次在后台任务中执行，失败只写日志。
#[derive(Clone)]
pub struct TapLogger {
    store: Arc<dyn FastStore>,
    keys: TapKeys,
    velocity_ttl_secs: u64,
    tasks: BackgroundTasks,
}

impl TapLogger {
    pub fn new(
        store: Arc<dyn FastStore>,
        keys: TapKeys,
        velocity_ttl_secs: u64,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            store,
            keys,
            velocity_ttl_secs,
            tasks,
        }
    }

    pub fn log(&self, record: TapRecord) {
        let store = self.store.clone();
        let keys = self.keys.clone();
        let ttl = self.velocity_ttl_secs;

        self.tasks.spawn("tap-log", async move {
            let batch = TapBatch::for_tap(&record, &keys, ttl)
                .context("building tap batch")?;
            store.execute(&batch).await.with_context(|| {
                format!(
                    "tap pipeline for band {} (event {})",
                    record.band_id, record.event_id
                )
            })?;
            trace!("Tap logged: {} -> {}", record.band_id, record.mode);
            Ok(())
        });
    }

    pub fn store(&self) -> &Arc<dyn FastStore> {
        &self.store
    }
}
