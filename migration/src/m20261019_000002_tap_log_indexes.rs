//! tap_logs 索引
//!
//! 参与度计算按 (event_id, band_id, window_id) 分组，
//! 时间范围查询走 (event_id, tapped_at)。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tap_logs_event_band_window")
                    .table(TapLogs::Table)
                    .col(TapLogs::EventId)
                    .col(TapLogs::BandId)
                    .col(TapLogs::WindowId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tap_logs_event_time")
                    .table(TapLogs::Table)
                    .col(TapLogs::EventId)
                    .col(TapLogs::TappedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_tap_logs_event_time").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_tap_logs_event_band_window")
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum TapLogs {
    #[sea_orm(iden = "tap_logs")]
    Table,
    EventId,
    BandId,
    WindowId,
    TappedAt,
}
