use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use super::keys::TapKeys;
use super::record::{AnalyticsCounters, ApproxCount};
use super::store::{FastStore, FastStoreOp, TapBatch};
use crate::errors::{Result, TaplinkerError};
use crate::storage::models::RedirectMode;
use crate::utils::redis::RedisHandle;

/// Redis 快速存储：计数器 + HyperLogLog + 待处理队列
pub struct RedisFastStore {
    handle: RedisHandle,
    keys: TapKeys,
}

impl RedisFastStore {
    pub fn new(url: &str, keys: TapKeys) -> Result<Self> {
        debug!("RedisFastStore created, queue '{}'", keys.queue());
        Ok(Self {
            handle: RedisHandle::open(url)?,
            keys,
        })
    }

    fn build_pipeline(batch: &TapBatch) -> redis::Pipeline {
        let mut pipe = redis::pipe();
        for op in batch.ops() {
            match op {
                FastStoreOp::Incr { key } => {
                    pipe.incr(key, 1).ignore();
                }
                FastStoreOp::PfAdd { key, member } => {
                    pipe.pfadd(key, member).ignore();
                }
                FastStoreOp::Expire { key, secs } => {
                    pipe.expire(key, *secs as i64).ignore();
                }
                FastStoreOp::LPush { key, value } => {
                    pipe.lpush(key, value).ignore();
                }
            }
        }
        pipe
    }
}

#[async_trait]
impl FastStore for RedisFastStore {
    async fn execute(&self, batch: &TapBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let pipe = Self::build_pipeline(batch);
        let mut conn = self.handle.get_connection().await.map_err(|e| {
            TaplinkerError::fast_store(format!("获取 Redis 连接失败: {}", e))
        })?;

        if let Err(e) = pipe.query_async::<()>(&mut conn).await {
            self.handle.reset_connection().await;
            return Err(TaplinkerError::fast_store(format!(
                "执行点击批次失败: {}",
                e
            )));
        }

        trace!("Executed tap batch of {} commands", batch.len());
        Ok(())
    }

    async fn read_counters(&self, event_id: i64, now: DateTime<Utc>) -> Result<AnalyticsCounters> {
        let modes = [
            RedirectMode::Pre,
            RedirectMode::Live,
            RedirectMode::Post,
            RedirectMode::Fallback,
        ];

        let mut pipe = redis::pipe();
        pipe.get(self.keys.total(event_id))
            .pfcount(self.keys.bands(event_id))
            .get(self.keys.hour(event_id, now))
            .get(self.keys.velocity(event_id, now));
        for mode in modes {
            pipe.get(self.keys.mode(event_id, mode));
        }

        let mut conn = self.handle.get_connection().await.map_err(|e| {
            TaplinkerError::fast_store(format!("获取 Redis 连接失败: {}", e))
        })?;

        type Row = (
            Option<u64>,
            u64,
            Option<u64>,
            Option<u64>,
            Option<u64>,
            Option<u64>,
            Option<u64>,
            Option<u64>,
        );
        let row: Row = match pipe.query_async(&mut conn).await {
            Ok(row) => row,
            Err(e) => {
                self.handle.reset_connection().await;
                return Err(TaplinkerError::fast_store(format!(
                    "读取活动 {} 计数失败: {}",
                    event_id, e
                )));
            }
        };

        let (total, bands, hour, velocity, pre, live, post, fallback) = row;
        let by_mode: HashMap<RedirectMode, u64> = modes
            .into_iter()
            .zip([pre, live, post, fallback])
            .map(|(mode, count)| (mode, count.unwrap_or(0)))
            .collect();

        Ok(AnalyticsCounters {
            event_id,
            total_taps: total.unwrap_or(0),
            unique_bands: ApproxCount::new(bands),
            by_mode,
            current_hour: hour.unwrap_or(0),
            current_velocity: velocity.unwrap_or(0),
        })
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
