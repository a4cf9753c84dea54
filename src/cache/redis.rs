use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, error, trace};

use crate::cache::traits::{EdgeCache, MAX_BATCH_SIZE, RedirectEntry};
use crate::config::EdgeCacheConfig;
use crate::errors::{Result, TaplinkerError};
use crate::utils::redis::RedisHandle;

/// Redis 作为边缘缓存
pub struct RedisEdgeCache {
    handle: RedisHandle,
    key_prefix: String,
}

impl RedisEdgeCache {
    pub fn new(url: &str, config: &EdgeCacheConfig) -> Result<Self> {
        debug!(
            "RedisEdgeCache created with prefix: '{}'",
            config.key_prefix
        );
        Ok(Self {
            handle: RedisHandle::open(url)?,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn make_key(&self, band_code: &str) -> String {
        format!("{}{}", self.key_prefix, band_code)
    }

    fn check_batch(len: usize) -> Result<()> {
        if len > MAX_BATCH_SIZE {
            return Err(TaplinkerError::validation(format!(
                "批量大小 {} 超过上限 {}",
                len, MAX_BATCH_SIZE
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EdgeCache for RedisEdgeCache {
    async fn get(&self, band_code: &str) -> Result<Option<RedirectEntry>> {
        let mut conn = match self.handle.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                self.handle.reset_connection().await;
                return Err(TaplinkerError::cache_connection(format!(
                    "获取 Redis 连接失败: {}",
                    e
                )));
            }
        };

        let data: Option<String> = match conn.get(self.make_key(band_code)).await {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to get band '{}': {}", band_code, e);
                // 连接可能已断开，重置连接
                self.handle.reset_connection().await;
                return Err(e.into());
            }
        };

        match data {
            Some(data) => {
                trace!("Edge cache hit: {}", band_code);
                Ok(Some(RedirectEntry::from_json(&data)?))
            }
            None => {
                trace!("Edge cache miss: {}", band_code);
                Ok(None)
            }
        }
    }

    async fn bulk_put(&self, entries: &[(String, RedirectEntry)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        Self::check_batch(entries.len())?;

        let mut pipe = redis::pipe();
        for (band_code, entry) in entries {
            pipe.set(self.make_key(band_code), entry.to_json()?).ignore();
        }

        let mut conn = self.handle.get_connection().await.map_err(|e| {
            TaplinkerError::cache_connection(format!("获取 Redis 连接失败: {}", e))
        })?;
        if let Err(e) = pipe.query_async::<()>(&mut conn).await {
            self.handle.reset_connection().await;
            return Err(TaplinkerError::cache_write(format!(
                "批量写入 {} 条失败: {}",
                entries.len(),
                e
            )));
        }

        trace!("Wrote {} edge cache entries", entries.len());
        Ok(())
    }

    async fn bulk_delete(&self, band_codes: &[String]) -> Result<()> {
        if band_codes.is_empty() {
            return Ok(());
        }
        Self::check_batch(band_codes.len())?;

        let keys: Vec<String> = band_codes.iter().map(|c| self.make_key(c)).collect();
        let mut conn = self.handle.get_connection().await.map_err(|e| {
            TaplinkerError::cache_connection(format!("获取 Redis 连接失败: {}", e))
        })?;

        match conn.del::<_, i64>(keys).await {
            Ok(removed) => {
                trace!(
                    "Removed {} of {} edge cache entries",
                    removed,
                    band_codes.len()
                );
                Ok(())
            }
            Err(e) => {
                self.handle.reset_connection().await;
                Err(TaplinkerError::cache_write(format!(
                    "批量删除 {} 条失败: {}",
                    band_codes.len(),
                    e
                )))
            }
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
