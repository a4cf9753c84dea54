use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::storage::models::RedirectMode;

/// 单次批量写入 / 删除的最大条数（边缘缓存的批量接口上限）
pub const MAX_BATCH_SIZE: usize = 10_000;

/// 边缘缓存中一个手环对应的重定向目标
///
/// 序列化为 `{"url","eventId","mode","windowId"}`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectEntry {
    pub url: String,
    pub event_id: i64,
    pub mode: RedirectMode,
    pub window_id: Option<i64>,
}

impl RedirectEntry {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// 手环编码 → 重定向目标 的只读副本
///
/// 写入方是同步器，读取方是边缘重定向处理器。
#[async_trait]
pub trait EdgeCache: Send + Sync {
    /// 按手环编码读取；不存在返回 `Ok(None)`
    async fn get(&self, band_code: &str) -> Result<Option<RedirectEntry>>;

    /// 批量写入，单次最多 [`MAX_BATCH_SIZE`] 条
    async fn bulk_put(&self, entries: &[(String, RedirectEntry)]) -> Result<()>;

    /// 批量删除，单次最多 [`MAX_BATCH_SIZE`] 条
    async fn bulk_delete(&self, band_codes: &[String]) -> Result<()>;

    /// 未配置时同步器直接跳过
    fn is_configured(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str;
}
