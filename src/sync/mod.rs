//! Redirect map synchronizer
//!
//! Pushes the band → destination mapping from the database into the edge
//! cache. The cache is an eventually consistent copy: every call rebuilds the
//! entries of the selected events wholesale.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::cache::{EdgeCache, MAX_BATCH_SIZE, RedirectEntry};
use crate::errors::Result;
use crate::storage::SeaOrmStorage;
use crate::storage::models::{Event, RedirectMode, Window};

/// 同步器读取数据的来源
#[async_trait]
pub trait RedirectSource: Send + Sync {
    /// 未取消的活动，可按 id 过滤
    async fn live_events(&self, filter: Option<&[i64]>) -> Result<Vec<Event>>;

    async fn active_window(&self, event_id: i64) -> Result<Option<Window>>;

    async fn band_codes(&self, event_id: i64, include_deleted: bool) -> Result<Vec<String>>;
}

#[async_trait]
impl RedirectSource for SeaOrmStorage {
    async fn live_events(&self, filter: Option<&[i64]>) -> Result<Vec<Event>> {
        self.list_live_events(filter).await
    }

    async fn active_window(&self, event_id: i64) -> Result<Option<Window>> {
        SeaOrmStorage::active_window(self, event_id).await
    }

    async fn band_codes(&self, event_id: i64, include_deleted: bool) -> Result<Vec<String>> {
        self.list_band_codes(event_id, include_deleted).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub bands_written: u64,
    pub events_processed: u64,
    /// 没有目标 URL 的活动，其手环被移出缓存的数量
    pub bands_cleared: u64,
    pub skipped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub bands_removed: u64,
    pub skipped: bool,
}

/// 活动当前应跳转的目标
///
/// 生效窗口 URL → 活动兜底 URL → 无（手环不进缓存）。
pub fn resolve_target(event: &Event, active: Option<&Window>) -> Option<(String, RedirectMode, Option<i64>)> {
    if let Some(window) = active {
        return Some((window.url.clone(), window.kind.into(), Some(window.id)));
    }
    event
        .fallback_url
        .as_ref()
        .map(|url| (url.clone(), RedirectMode::Fallback, None))
}

pub struct RedirectMapSynchronizer {
    source: Arc<dyn RedirectSource>,
    cache: Arc<dyn EdgeCache>,
}

impl RedirectMapSynchronizer {
    pub fn new(source: Arc<dyn RedirectSource>, cache: Arc<dyn EdgeCache>) -> Self {
        Self { source, cache }
    }

    pub fn is_configured(&self) -> bool {
        self.cache.is_configured()
    }

    /// 重建所选活动的全部缓存条目
    ///
    /// 按批顺序写入，任一批失败则整次调用失败，由调用方整体重试。
    pub async fn sync(&self, event_filter: Option<&[i64]>) -> Result<SyncReport> {
        if !self.cache.is_configured() {
            debug!("Edge cache not configured, sync skipped");
            return Ok(SyncReport {
                skipped: true,
                ..Default::default()
            });
        }

        let events = self.source.live_events(event_filter).await?;
        let mut report = SyncReport::default();
        let mut pending: Vec<(String, RedirectEntry)> = Vec::new();

        for event in &events {
            let active = self.source.active_window(event.id).await?;
            let codes = self.source.band_codes(event.id, false).await?;

            match resolve_target(event, active.as_ref()) {
                Some((url, mode, window_id)) => {
                    let entry = RedirectEntry {
                        url,
                        event_id: event.id,
                        mode,
                        window_id,
                    };
                    for code in codes {
                        pending.push((code, entry.clone()));
                        if pending.len() == MAX_BATCH_SIZE {
                            report.bands_written += self.flush(&mut pending).await?;
                        }
                    }
                }
                None => {
                    trace!(
                        "Event {} has no active window and no fallback URL, clearing {} bands",
                        event.id,
                        codes.len()
                    );
                    report.bands_cleared += self.delete_in_batches(&codes).await?;
                }
            }
            report.events_processed += 1;
        }

        report.bands_written += self.flush(&mut pending).await?;

        info!(
            "Redirect map synced: {} bands written across {} events ({} cleared)",
            report.bands_written, report.events_processed, report.bands_cleared
        );
        Ok(report)
    }

    /// 删除活动全部手环（含已软删除的）的缓存条目
    pub async fn purge(&self, event_id: i64) -> Result<PurgeReport> {
        if !self.cache.is_configured() {
            return Ok(PurgeReport {
                bands_removed: 0,
                skipped: true,
            });
        }

        let codes = self.source.band_codes(event_id, true).await?;
        let removed = self.delete_in_batches(&codes).await?;

        info!("Purged {} edge cache entries of event {}", removed, event_id);
        Ok(PurgeReport {
            bands_removed: removed,
            skipped: false,
        })
    }

    /// 删除指定手环的缓存条目
    pub async fn remove_bands(&self, codes: &[String]) -> Result<PurgeReport> {
        if !self.cache.is_configured() {
            return Ok(PurgeReport {
                bands_removed: 0,
                skipped: true,
            });
        }

        let removed = self.delete_in_batches(codes).await?;
        debug!("Removed {} band entries from edge cache", removed);
        Ok(PurgeReport {
            bands_removed: removed,
            skipped: false,
        })
    }

    async fn flush(&self, pending: &mut Vec<(String, RedirectEntry)>) -> Result<u64> {
        if pending.is_empty() {
            return Ok(0);
        }
        let written = pending.len() as u64;
        self.cache.bulk_put(pending).await?;
        trace!("Flushed batch of {} entries to {}", written, self.cache.name());
        pending.clear();
        Ok(written)
    }

    async fn delete_in_batches(&self, codes: &[String]) -> Result<u64> {
        let mut removed = 0;
        for chunk in codes.chunks(MAX_BATCH_SIZE) {
            self.cache.bulk_delete(chunk).await?;
            removed += chunk.len() as u64;
        }
        Ok(removed)
    }
}
