use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub org_id: i64,
    pub name: String,
    /// draft / active / completed / cancelled
    pub status: String,
    pub schedule_mode: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub fallback_url: Option<String>,
    /// IANA 时区名，例如 "Europe/Berlin"
    pub timezone: String,
    pub estimated_attendees: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
