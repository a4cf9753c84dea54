//! Redirect window entity
//!
//! `start_at` / `end_at` are wall-clock times in the owning event's timezone.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "windows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    /// pre / live / post
    pub kind: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    pub start_at: Option<DateTime>,
    pub end_at: Option<DateTime>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
