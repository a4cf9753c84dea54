use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::keys::TapKeys;
use super::record::{AnalyticsCounters, TapRecord};
use crate::errors::Result;

/// 快速存储上的单个命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastStoreOp {
    Incr { key: String },
    PfAdd { key: String, member: String },
    Expire { key: String, secs: u64 },
    LPush { key: String, value: String },
}

/// 一次点击对应的命令批次，作为一次网络往返执行
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapBatch {
    ops: Vec<FastStoreOp>,
}

impl TapBatch {
    pub fn for_tap(record: &TapRecord, keys: &TapKeys, velocity_ttl_secs: u64) -> Result<Self> {
        let event_id = record.event_id;
        let at = record.tapped_at;
        let velocity = keys.velocity(event_id, at);

        let ops = vec![
            FastStoreOp::Incr {
                key: keys.total(event_id),
            },
            FastStoreOp::PfAdd {
                key: keys.bands(event_id),
                member: record.band_id.clone(),
            },
            FastStoreOp::Incr {
                key: keys.hour(event_id, at),
            },
            FastStoreOp::Incr {
                key: keys.mode(event_id, record.mode),
            },
            FastStoreOp::Incr {
                key: velocity.clone(),
            },
            FastStoreOp::Expire {
                key: velocity,
                secs: velocity_ttl_secs,
            },
            FastStoreOp::LPush {
                key: keys.queue().to_string(),
                value: serde_json::to_string(record)?,
            },
        ];
        Ok(Self { ops })
    }

    pub fn ops(&self) -> &[FastStoreOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// 计数器与待处理队列所在的存储
#[async_trait]
pub trait FastStore: Send + Sync {
    /// 一次往返执行整个批次
    async fn execute(&self, batch: &TapBatch) -> Result<()>;

    /// 读取活动的实时计数（报表侧）
    async fn read_counters(&self, event_id: i64, now: DateTime<Utc>) -> Result<AnalyticsCounters>;

    fn name(&self) -> &'static str;
}
