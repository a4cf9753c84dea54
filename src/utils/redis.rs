//! Lazily established, shared Redis connection
//!
//! The client is created without touching the network; the multiplexed
//! connection is opened on first use and dropped after an error so the next
//! call reconnects.

use std::sync::Arc;

use redis::aio::MultiplexedConnection;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{Result, TaplinkerError};

#[derive(Clone)]
pub struct RedisHandle {
    client: redis::Client,
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
}

impl RedisHandle {
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| TaplinkerError::cache_connection(format!("无效的 Redis URL: {}", e)))?;
        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    /// 获取或建立持久连接
    pub async fn get_connection(&self) -> redis::RedisResult<MultiplexedConnection> {
        {
            let guard = self.connection.read().await;
            if let Some(ref conn) = *guard {
                return Ok(conn.clone());
            }
        }

        let mut guard = self.connection.write().await;
        // 双重检查，避免竞态条件
        if let Some(ref conn) = *guard {
            return Ok(conn.clone());
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        *guard = Some(conn.clone());
        debug!("Redis connection established and cached");
        Ok(conn)
    }

    /// 重置连接（在连接错误时调用）
    pub async fn reset_connection(&self) {
        let mut guard = self.connection.write().await;
        *guard = None;
        debug!("Redis connection reset due to error");
    }
}
