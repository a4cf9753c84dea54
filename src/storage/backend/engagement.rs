//! Tap history aggregation for engagement reporting

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::model_to_tap_log;
use crate::errors::{Result, TaplinkerError};
use crate::storage::models::TapLog;

use migration::entities::{band, tap_log};

/// 一行 (活动, 手环, 窗口) 分组结果
#[derive(Debug, Clone, FromQueryResult)]
pub struct TapPairRow {
    pub event_id: i64,
    pub band_id: i64,
    pub window_id: Option<i64>,
    pub taps: i64,
}

/// 单个活动的点击历史摘要
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapSummary {
    pub total_taps: u64,
    /// 至少点击过一次的手环数（精确值）
    pub unique_bands: u64,
    /// 去重后的 (band_id, window_id) 组合
    pub pairs: HashSet<(i64, i64)>,
}

impl TapSummary {
    /// 有点击记录的窗口
    pub fn tapped_windows(&self) -> HashSet<i64> {
        self.pairs.iter().map(|(_, window_id)| *window_id).collect()
    }
}

/// 将分组行折叠为每个活动的摘要
pub fn summarize_pairs(rows: &[TapPairRow]) -> HashMap<i64, TapSummary> {
    let mut bands: HashMap<i64, HashSet<i64>> = HashMap::new();
    let mut summaries: HashMap<i64, TapSummary> = HashMap::new();

    for row in rows {
        let summary = summaries.entry(row.event_id).or_default();
        summary.total_taps += row.taps.max(0) as u64;
        bands.entry(row.event_id).or_default().insert(row.band_id);
        if let Some(window_id) = row.window_id {
            summary.pairs.insert((row.band_id, window_id));
        }
    }

    for (event_id, set) in bands {
        if let Some(summary) = summaries.get_mut(&event_id) {
            summary.unique_bands = set.len() as u64;
        }
    }
    summaries
}

impl SeaOrmStorage {
    /// 按 (event_id, band_id, window_id) 分组统计点击
    ///
    /// 已软删除手环的点击不计入，与手环总数的口径一致。
    pub async fn tap_pairs(&self, event_ids: &[i64]) -> Result<Vec<TapPairRow>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let deleted_bands = band::Entity::find()
            .select_only()
            .column(band::Column::Id)
            .filter(band::Column::EventId.is_in(event_ids.iter().copied()))
            .filter(band::Column::DeletedAt.is_not_null())
            .into_query();

        let rows = tap_log::Entity::find()
            .select_only()
            .column(tap_log::Column::EventId)
            .column(tap_log::Column::BandId)
            .column(tap_log::Column::WindowId)
            .column_as(tap_log::Column::Id.count(), "taps")
            .filter(tap_log::Column::EventId.is_in(event_ids.iter().copied()))
            .filter(tap_log::Column::BandId.not_in_subquery(deleted_bands))
            .group_by(tap_log::Column::EventId)
            .group_by(tap_log::Column::BandId)
            .group_by(tap_log::Column::WindowId)
            .into_model::<TapPairRow>()
            .all(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("统计点击组合失败: {}", e)))?;

        debug!(
            "Loaded {} tap pair rows for {} events",
            rows.len(),
            event_ids.len()
        );
        Ok(rows)
    }

    /// 活动最近的点击记录，最新的在前
    pub async fn recent_taps(&self, event_id: i64, limit: u64) -> Result<Vec<TapLog>> {
        let models = tap_log::Entity::find()
            .filter(tap_log::Column::EventId.eq(event_id))
            .order_by_desc(tap_log::Column::TappedAt)
            .order_by_desc(tap_log::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("查询点击记录失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_tap_log).collect())
    }

    /// 每个活动的点击摘要；没有点击的活动返回空摘要
    pub async fn tap_summaries(&self, event_ids: &[i64]) -> Result<HashMap<i64, TapSummary>> {
        let rows = self.tap_pairs(event_ids).await?;
        let mut summaries = summarize_pairs(&rows);
        for event_id in event_ids {
            summaries.entry(*event_id).or_default();
        }
        Ok(summaries)
    }
}
