//! Tap log entity, append-only record of a resolved tap

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tap_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub band_id: i64,
    pub event_id: i64,
    pub window_id: Option<i64>,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    /// pre / live / post / fallback
    pub mode: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub tapped_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
