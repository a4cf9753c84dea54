use async_trait::async_trait;

use crate::cache::traits::{EdgeCache, RedirectEntry};
use crate::errors::Result;

/// 未配置边缘缓存时使用：读取总是未命中，写入直接丢弃
pub struct NullEdgeCache;

#[async_trait]
impl EdgeCache for NullEdgeCache {
    async fn get(&self, _band_code: &str) -> Result<Option<RedirectEntry>> {
        Ok(None)
    }

    async fn bulk_put(&self, _entries: &[(String, RedirectEntry)]) -> Result<()> {
        Ok(())
    }

    async fn bulk_delete(&self, _band_codes: &[String]) -> Result<()> {
        Ok(())
    }

    fn is_configured(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
