//! Query operations for SeaOrmStorage
//!
//! Read-only access to events, windows and bands. Reads go through the
//! retry wrapper; failures after retries surface as `DatabaseOperation`.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::trace;

use super::converters::{model_to_band, model_to_event, model_to_window};
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, TaplinkerError};
use crate::storage::models::{Band, Event, EventStatus, Window};

use migration::entities::{band, event, window};

impl SeaOrmStorage {
    pub async fn get_event(&self, event_id: i64) -> Result<Option<Event>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("get_event({})", event_id),
            self.retry_config,
            || async { event::Entity::find_by_id(event_id).one(db).await },
        )
        .await
        .map_err(|e| TaplinkerError::database_operation(format!("查询活动失败: {}", e)))?;

        Ok(model.map(model_to_event))
    }

    /// 未取消的活动，可按 id 过滤
    pub async fn list_live_events(&self, filter: Option<&[i64]>) -> Result<Vec<Event>> {
        let db = &self.db;
        let ids: Option<Vec<i64>> = filter.map(<[i64]>::to_vec);

        let models = retry::with_retry("list_live_events", self.retry_config, || {
            let ids = ids.clone();
            async move {
                let mut query = event::Entity::find()
                    .filter(event::Column::Status.ne(EventStatus::Cancelled.as_ref()));
                if let Some(ids) = ids {
                    query = query.filter(event::Column::Id.is_in(ids));
                }
                query.order_by_asc(event::Column::Id).all(db).await
            }
        })
        .await
        .map_err(|e| TaplinkerError::database_operation(format!("查询活动列表失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_event).collect())
    }

    /// 开启排期模式且未取消的活动（定时巡检范围）
    pub async fn list_scheduled_events(&self) -> Result<Vec<Event>> {
        let db = &self.db;
        let models = retry::with_retry("list_scheduled_events", self.retry_config, || async {
            event::Entity::find()
                .filter(event::Column::ScheduleMode.eq(true))
                .filter(event::Column::Status.ne(EventStatus::Cancelled.as_ref()))
                .order_by_asc(event::Column::Id)
                .all(db)
                .await
        })
        .await
        .map_err(|e| TaplinkerError::database_operation(format!("查询排期活动失败: {}", e)))?;

        trace!("Loaded {} schedule-mode events", models.len());
        Ok(models.into_iter().map(model_to_event).collect())
    }

    /// 活动的全部窗口，按创建时间升序（同一时刻按 id）
    pub async fn list_windows(&self, event_id: i64) -> Result<Vec<Window>> {
        let db = &self.db;
        let models = retry::with_retry(
            &format!("list_windows({})", event_id),
            self.retry_config,
            || async {
                window::Entity::find()
                    .filter(window::Column::EventId.eq(event_id))
                    .order_by_asc(window::Column::CreatedAt)
                    .order_by_asc(window::Column::Id)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| TaplinkerError::database_operation(format!("查询窗口失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_window).collect())
    }

    /// 多个活动的窗口，按活动分组
    pub async fn list_windows_for_events(
        &self,
        event_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Window>>> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = window::Entity::find()
            .filter(window::Column::EventId.is_in(event_ids.iter().copied()))
            .order_by_asc(window::Column::CreatedAt)
            .order_by_asc(window::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("查询窗口失败: {}", e)))?;

        let mut grouped: HashMap<i64, Vec<Window>> = HashMap::new();
        for model in models {
            let window = model_to_window(model);
            grouped.entry(window.event_id).or_default().push(window);
        }
        Ok(grouped)
    }

    /// 当前生效窗口
    ///
    /// 正常情况下最多一个；数据异常出现多个时取最早创建的。
    pub async fn active_window(&self, event_id: i64) -> Result<Option<Window>> {
        let model = window::Entity::find()
            .filter(window::Column::EventId.eq(event_id))
            .filter(window::Column::IsActive.eq(true))
            .order_by_asc(window::Column::CreatedAt)
            .order_by_asc(window::Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("查询生效窗口失败: {}", e)))?;

        Ok(model.map(model_to_window))
    }

    pub async fn get_window(&self, window_id: i64) -> Result<Option<Window>> {
        let model = window::Entity::find_by_id(window_id)
            .one(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("查询窗口失败: {}", e)))?;

        Ok(model.map(model_to_window))
    }

    pub async fn get_band(&self, band_id: i64) -> Result<Option<Band>> {
        let model = band::Entity::find_by_id(band_id)
            .one(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("查询手环失败: {}", e)))?;

        Ok(model.map(model_to_band))
    }

    /// 活动下手环编码
    ///
    /// `include_deleted = false` 时只返回未软删除的手环。
    pub async fn list_band_codes(&self, event_id: i64, include_deleted: bool) -> Result<Vec<String>> {
        let db = &self.db;
        let codes = retry::with_retry(
            &format!("list_band_codes({})", event_id),
            self.retry_config,
            || async {
                let mut query = band::Entity::find()
                    .select_only()
                    .column(band::Column::Code)
                    .filter(band::Column::EventId.eq(event_id));
                if !include_deleted {
                    query = query.filter(band::Column::DeletedAt.is_null());
                }
                query
                    .order_by_asc(band::Column::Id)
                    .into_tuple::<String>()
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| TaplinkerError::database_operation(format!("查询手环编码失败: {}", e)))?;

        Ok(codes)
    }

    /// 活动下未删除的手环，按登记顺序
    pub async fn list_bands(&self, event_id: i64) -> Result<Vec<Band>> {
        let models = band::Entity::find()
            .filter(band::Column::EventId.eq(event_id))
            .filter(band::Column::DeletedAt.is_null())
            .order_by_asc(band::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("查询手环列表失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_band).collect())
    }

    /// 每个活动的未删除手环数
    ///
    /// 没有手环的活动也会出现在结果中（值为 0）。
    pub async fn count_bands(&self, event_ids: &[i64]) -> Result<HashMap<i64, u64>> {
        let mut counts: HashMap<i64, u64> = event_ids.iter().map(|id| (*id, 0)).collect();
        if event_ids.is_empty() {
            return Ok(counts);
        }

        let rows: Vec<(i64, i64)> = band::Entity::find()
            .select_only()
            .column(band::Column::EventId)
            .column_as(band::Column::Id.count(), "bands")
            .filter(band::Column::EventId.is_in(event_ids.iter().copied()))
            .filter(band::Column::DeletedAt.is_null())
            .group_by(band::Column::EventId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("统计手环失败: {}", e)))?;

        for (event_id, count) in rows {
            counts.insert(event_id, count.max(0) as u64);
        }
        Ok(counts)
    }

    /// 所有活动数（健康检查用）
    pub async fn count_events(&self) -> Result<u64> {
        event::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("统计活动失败: {}", e)))
    }
}
