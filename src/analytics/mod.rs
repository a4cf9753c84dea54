//! Tap analytics on the fast store
//!
//! Each tap becomes one pipelined batch: counters, a distinct-band sketch and
//! a JSON record pushed onto the pending queue. The queue is the durability
//! boundary; everything else is best-effort.

pub mod keys;
pub mod logger;
pub mod memory;
pub mod record;
pub mod redis;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub use keys::TapKeys;
pub use logger::TapLogger;
pub use memory::MemoryFastStore;
pub use record::{AnalyticsCounters, ApproxCount, TapRecord};
pub use self::redis::RedisFastStore;
pub use store::{FastStore, FastStoreOp, TapBatch};

use crate::config::FastStoreConfig;
use crate::errors::Result;

/// 未配置快速存储时使用：批次直接丢弃
pub struct NullFastStore;

#[async_trait]
impl FastStore for NullFastStore {
    async fn execute(&self, _batch: &TapBatch) -> Result<()> {
        Ok(())
    }

    async fn read_counters(&self, event_id: i64, _now: DateTime<Utc>) -> Result<AnalyticsCounters> {
        Ok(AnalyticsCounters {
            event_id,
            ..Default::default()
        })
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// 按配置创建快速存储
pub fn create_fast_store(config: &FastStoreConfig) -> Result<Arc<dyn FastStore>> {
    let keys = TapKeys::from_config(config);
    match config.redis_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let store = RedisFastStore::new(url, keys)?;
            info!("Fast store: redis (queue '{}')", config.queue_key);
            Ok(Arc::new(store))
        }
        _ => {
            warn!("Fast store not configured, taps are counted in memory only");
            Ok(Arc::new(MemoryFastStore::new(keys)))
        }
    }
}
