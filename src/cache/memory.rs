use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::cache::traits::{EdgeCache, MAX_BATCH_SIZE, RedirectEntry};
use crate::errors::{Result, TaplinkerError};

/// 进程内边缘缓存（单机运行与测试）
#[derive(Default, Clone)]
pub struct MemoryEdgeCache {
    inner: Arc<DashMap<String, RedirectEntry>>,
}

impl MemoryEdgeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl EdgeCache for MemoryEdgeCache {
    async fn get(&self, band_code: &str) -> Result<Option<RedirectEntry>> {
        Ok(self.inner.get(band_code).map(|v| v.clone()))
    }

    async fn bulk_put(&self, entries: &[(String, RedirectEntry)]) -> Result<()> {
        if entries.len() > MAX_BATCH_SIZE {
            return Err(TaplinkerError::validation(format!(
                "批量大小 {} 超过上限 {}",
                entries.len(),
                MAX_BATCH_SIZE
            )));
        }
        for (band_code, entry) in entries {
            self.inner.insert(band_code.clone(), entry.clone());
        }
        Ok(())
    }

    async fn bulk_delete(&self, band_codes: &[String]) -> Result<()> {
        if band_codes.len() > MAX_BATCH_SIZE {
            return Err(TaplinkerError::validation(format!(
                "批量大小 {} 超过上限 {}",
                band_codes.len(),
                MAX_BATCH_SIZE
            )));
        }
        for band_code in band_codes {
            self.inner.remove(band_code);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
