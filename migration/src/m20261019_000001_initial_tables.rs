//! 初始表结构
//!
//! - events: 活动（时区、排期模式、兜底 URL）
//! - windows: 活动下的时间窗口（pre / live / post）
//! - bands: 手环
//! - tap_logs: 点击（轻触）历史，只追加

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Events::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(Events::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Events::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Events::ScheduleMode)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Events::FallbackUrl).text().null())
                    .col(
                        ColumnDef::new(Events::Timezone)
                            .string_len(64)
                            .not_null()
                            .default("UTC"),
                    )
                    .col(ColumnDef::new(Events::EstimatedAttendees).big_integer().null())
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Windows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Windows::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Windows::EventId).big_integer().not_null())
                    .col(ColumnDef::new(Windows::Kind).string_len(8).not_null())
                    .col(ColumnDef::new(Windows::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Windows::Url).text().not_null())
                    .col(ColumnDef::new(Windows::StartAt).date_time().null())
                    .col(ColumnDef::new(Windows::EndAt).date_time().null())
                    .col(
                        ColumnDef::new(Windows::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Windows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_windows_event_id")
                    .table(Windows::Table)
                    .col(Windows::EventId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bands::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bands::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bands::EventId).big_integer().not_null())
                    .col(ColumnDef::new(Bands::Code).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Bands::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Bands::TapCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bands::LastTappedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Bands::Tag).string_len(64).null())
                    .to_owned(),
            )
            .await?;

        // 手环编码在同一活动内唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bands_event_code")
                    .table(Bands::Table)
                    .col(Bands::EventId)
                    .col(Bands::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TapLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TapLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TapLogs::BandId).big_integer().not_null())
                    .col(ColumnDef::new(TapLogs::EventId).big_integer().not_null())
                    .col(ColumnDef::new(TapLogs::WindowId).big_integer().null())
                    .col(ColumnDef::new(TapLogs::Url).text().not_null())
                    .col(ColumnDef::new(TapLogs::Mode).string_len(16).not_null())
                    .col(ColumnDef::new(TapLogs::UserAgent).text().null())
                    .col(ColumnDef::new(TapLogs::IpAddress).string_len(45).null())
                    .col(
                        ColumnDef::new(TapLogs::TappedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TapLogs::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bands_event_code").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bands::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_windows_event_id").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Windows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Events {
    #[sea_orm(iden = "events")]
    Table,
    Id,
    OrgId,
    Name,
    Status,
    ScheduleMode,
    FallbackUrl,
    Timezone,
    EstimatedAttendees,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Windows {
    #[sea_orm(iden = "windows")]
    Table,
    Id,
    EventId,
    Kind,
    Title,
    Url,
    StartAt,
    EndAt,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Bands {
    #[sea_orm(iden = "bands")]
    Table,
    Id,
    EventId,
    Code,
    DeletedAt,
    TapCount,
    LastTappedAt,
    Tag,
}

#[derive(DeriveIden)]
enum TapLogs {
    #[sea_orm(iden = "tap_logs")]
    Table,
    Id,
    BandId,
    EventId,
    WindowId,
    Url,
    Mode,
    UserAgent,
    IpAddress,
    TappedAt,
}
