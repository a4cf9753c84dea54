use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::{SeaOrmStorage, TapPairRow, TapSummary};
pub use models::{
    Band, Event, EventStatus, NewEvent, NewTapLog, NewWindow, RedirectMode, TapLog, Window,
    WindowKind,
};

pub struct StorageFactory;

impl StorageFactory {
    /// 按配置连接数据库（自动运行迁移）
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let storage = SeaOrmStorage::new(config).await?;
        Ok(Arc::new(storage))
    }
}
