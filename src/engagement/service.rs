use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{EngagementStats, compute_event};
use crate::errors::Result;
use crate::scheduler::parse_timezone;
use crate::storage::{SeaOrmStorage, TapSummary};

/// 从数据库加载窗口、点击历史和手环数并计算参与度
pub struct EngagementService {
    storage: Arc<SeaOrmStorage>,
}

impl EngagementService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// `band_counts` 为空时从数据库统计未删除手环数
    pub async fn compute(
        &self,
        event_ids: &[i64],
        band_counts: Option<&HashMap<i64, u64>>,
    ) -> Result<HashMap<i64, EngagementStats>> {
        self.compute_at(event_ids, band_counts, Utc::now()).await
    }

    pub async fn compute_at(
        &self,
        event_ids: &[i64],
        band_counts: Option<&HashMap<i64, u64>>,
        now: DateTime<Utc>,
    ) -> Result<HashMap<i64, EngagementStats>> {
        let mut events = Vec::with_capacity(event_ids.len());
        for event_id in event_ids {
            match self.storage.get_event(*event_id).await? {
                Some(event) => events.push(event),
                None => warn!("Engagement requested for unknown event {}", event_id),
            }
        }
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();

        let windows = self.storage.list_windows_for_events(&ids).await?;
        let summaries = self.storage.tap_summaries(&ids).await?;
        let loaded_counts;
        let counts = match band_counts {
            Some(counts) => counts,
            None => {
                loaded_counts = self.storage.count_bands(&ids).await?;
                &loaded_counts
            }
        };

        let empty = TapSummary::default();
        let mut result = HashMap::with_capacity(events.len());
        for event in &events {
            let stats = compute_event(
                event.id,
                windows.get(&event.id).map(Vec::as_slice).unwrap_or(&[]),
                summaries.get(&event.id).unwrap_or(&empty),
                counts.get(&event.id).copied().unwrap_or(0),
                now,
                parse_timezone(&event.timezone),
            );
            debug!(
                "Event {} engagement {}% ({} pairs, {} elapsed windows, {} bands)",
                event.id,
                stats.engagement_percent,
                stats.engaged_pairs,
                stats.elapsed_windows,
                stats.total_bands
            );
            result.insert(event.id, stats);
        }
        Ok(result)
    }
}
