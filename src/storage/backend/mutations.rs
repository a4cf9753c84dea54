//! Mutation operations for SeaOrmStorage
//!
//! `is_active` on windows is only ever written here, and only through
//! the two-step "deactivate all, then activate one" sequence inside a
//! single transaction.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::Expr,
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::{
    model_to_band, model_to_event, model_to_window, new_band_to_active_model,
    new_event_to_active_model, new_tap_log_to_active_model, new_window_to_active_model,
};
use crate::errors::{Result, TaplinkerError};
use crate::storage::models::{Band, Event, EventStatus, NewEvent, NewTapLog, NewWindow, Window};

use migration::entities::{band, event, tap_log, window};

/// 单次 insert_many 的最大行数（避开 SQLite 变量上限）
const INSERT_CHUNK: usize = 500;

/// 在给定连接（通常是事务）上执行 "全部停用，再启用一个"
async fn switch_active_window<C: ConnectionTrait>(
    conn: &C,
    event_id: i64,
    window_id: Option<i64>,
) -> std::result::Result<(), sea_orm::DbErr> {
    window::Entity::update_many()
        .col_expr(window::Column::IsActive, Expr::value(false))
        .filter(window::Column::EventId.eq(event_id))
        .exec(conn)
        .await?;

    if let Some(window_id) = window_id {
        let result = window::Entity::update_many()
            .col_expr(window::Column::IsActive, Expr::value(true))
            .filter(window::Column::Id.eq(window_id))
            .filter(window::Column::EventId.eq(event_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(sea_orm::DbErr::RecordNotFound(format!(
                "window {} does not belong to event {}",
                window_id, event_id
            )));
        }
    }

    Ok(())
}

impl SeaOrmStorage {
    pub async fn insert_event(&self, new: NewEvent) -> Result<Event> {
        let model = new_event_to_active_model(&new)
            .insert(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("创建活动失败: {}", e)))?;

        info!("Event created: {} ({})", model.id, model.name);
        Ok(model_to_event(model))
    }

    pub async fn insert_window(&self, new: NewWindow) -> Result<Window> {
        let model = new_window_to_active_model(&new)
            .insert(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("创建窗口失败: {}", e)))?;

        debug!("Window {} created for event {}", model.id, model.event_id);
        Ok(model_to_window(model))
    }

    /// 批量登记手环，返回写入条数
    pub async fn insert_bands(&self, event_id: i64, codes: &[String]) -> Result<u64> {
        if codes.is_empty() {
            return Ok(0);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("开始事务失败: {}", e)))?;

        for chunk in codes.chunks(INSERT_CHUNK) {
            let models: Vec<band::ActiveModel> = chunk
                .iter()
                .map(|code| new_band_to_active_model(event_id, code))
                .collect();
            band::Entity::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| TaplinkerError::database_operation(format!("登记手环失败: {}", e)))?;
        }

        txn.commit()
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("提交事务失败: {}", e)))?;

        info!("Registered {} bands for event {}", codes.len(), event_id);
        Ok(codes.len() as u64)
    }

    /// 追加点击历史（队列消费方写入接口）
    pub async fn append_tap_logs(&self, logs: &[NewTapLog]) -> Result<u64> {
        if logs.is_empty() {
            return Ok(0);
        }

        for chunk in logs.chunks(INSERT_CHUNK) {
            let models: Vec<tap_log::ActiveModel> =
                chunk.iter().map(new_tap_log_to_active_model).collect();
            tap_log::Entity::insert_many(models)
                .exec(&self.db)
                .await
                .map_err(|e| TaplinkerError::database_operation(format!("写入点击历史失败: {}", e)))?;
        }

        debug!("Appended {} tap logs", logs.len());
        Ok(logs.len() as u64)
    }

    /// 排期切换：将活动的生效窗口切换为 `window_id`（None 表示全部停用）
    ///
    /// 活动不存在、已退出排期模式或已取消时不写入，返回 `false`。
    pub async fn apply_active_window(&self, event_id: i64, window_id: Option<i64>) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("开始事务失败: {}", e)))?;

        // 先写活动行：与手动切换互斥，并在事务内确认仍处于排期模式
        let claimed = event::Entity::update_many()
            .col_expr(event::Column::ScheduleMode, Expr::value(true))
            .filter(event::Column::Id.eq(event_id))
            .filter(event::Column::ScheduleMode.eq(true))
            .filter(event::Column::Status.ne(EventStatus::Cancelled.as_ref()))
            .exec(&txn)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("确认排期模式失败: {}", e)))?;

        if claimed.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| TaplinkerError::database_operation(format!("回滚事务失败: {}", e)))?;
            debug!(
                "Event {} is not schedule-driven, keeping its current window",
                event_id
            );
            return Ok(false);
        }

        switch_active_window(&txn, event_id, window_id)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("切换生效窗口失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("提交事务失败: {}", e)))?;

        debug!(
            "Event {} active window set to {:?}",
            event_id, window_id
        );
        Ok(true)
    }

    /// 手动切换窗口
    ///
    /// 同一事务内关闭该活动的排期模式，再切换生效窗口。
    /// `active = false` 时该活动不再有生效窗口。
    pub async fn set_window_active_manually(&self, window_id: i64, active: bool) -> Result<Window> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("开始事务失败: {}", e)))?;

        let model = window::Entity::find_by_id(window_id)
            .one(&txn)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("查询窗口失败: {}", e)))?
            .ok_or_else(|| TaplinkerError::not_found(format!("窗口不存在: {}", window_id)))?;
        let event_id = model.event_id;

        event::Entity::update_many()
            .col_expr(event::Column::ScheduleMode, Expr::value(false))
            .filter(event::Column::Id.eq(event_id))
            .exec(&txn)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("关闭排期模式失败: {}", e)))?;

        let target = if active { Some(window_id) } else { None };
        switch_active_window(&txn, event_id, target)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("切换生效窗口失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("提交事务失败: {}", e)))?;

        info!(
            "Window {} manually set {} (event {}, schedule mode off)",
            window_id,
            if active { "active" } else { "inactive" },
            event_id
        );

        let mut window = model_to_window(model);
        window.is_active = active;
        Ok(window)
    }

    pub async fn set_schedule_mode(&self, event_id: i64, enabled: bool) -> Result<()> {
        let result = event::Entity::update_many()
            .col_expr(event::Column::ScheduleMode, Expr::value(enabled))
            .filter(event::Column::Id.eq(event_id))
            .exec(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("更新排期模式失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(TaplinkerError::not_found(format!(
                "活动不存在: {}",
                event_id
            )));
        }
        Ok(())
    }

    pub async fn set_event_status(&self, event_id: i64, status: EventStatus) -> Result<()> {
        let result = event::Entity::update_many()
            .col_expr(event::Column::Status, Expr::value(status.as_ref()))
            .filter(event::Column::Id.eq(event_id))
            .exec(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("更新活动状态失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(TaplinkerError::not_found(format!(
                "活动不存在: {}",
                event_id
            )));
        }
        info!("Event {} status -> {}", event_id, status);
        Ok(())
    }

    /// 软删除手环，返回删除后的记录
    pub async fn soft_delete_band(&self, band_id: i64) -> Result<Band> {
        let model = band::Entity::find_by_id(band_id)
            .one(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("查询手环失败: {}", e)))?
            .ok_or_else(|| TaplinkerError::not_found(format!("手环不存在: {}", band_id)))?;

        if model.deleted_at.is_some() {
            return Ok(model_to_band(model));
        }

        let mut active: band::ActiveModel = model.into();
        active.deleted_at = sea_orm::ActiveValue::Set(Some(chrono::Utc::now()));
        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| TaplinkerError::database_operation(format!("删除手环失败: {}", e)))?;

        info!("Band {} ({}) soft-deleted", updated.id, updated.code);
        Ok(model_to_band(updated))
    }
}
