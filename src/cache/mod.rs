//! Edge cache: band code → redirect target

pub mod memory;
pub mod null;
pub mod redis;
pub mod traits;

use std::sync::Arc;

use tracing::{info, warn};

pub use memory::MemoryEdgeCache;
pub use null::NullEdgeCache;
pub use self::redis::RedisEdgeCache;
pub use traits::{EdgeCache, MAX_BATCH_SIZE, RedirectEntry};

use crate::config::EdgeCacheConfig;
use crate::errors::Result;

/// 按配置创建边缘缓存
///
/// `redis_url` 为空时返回 [`NullEdgeCache`]，同步器会跳过写入。
pub fn create_edge_cache(config: &EdgeCacheConfig) -> Result<Arc<dyn EdgeCache>> {
    match config.redis_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let cache = RedisEdgeCache::new(url, config)?;
            info!("Edge cache: redis (prefix '{}')", config.key_prefix);
            Ok(Arc::new(cache))
        }
        _ => {
            warn!("Edge cache not configured, redirect map sync will be skipped");
            Ok(Arc::new(NullEdgeCache))
        }
    }
}
