use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::keys::TapKeys;
use super::record::{AnalyticsCounters, ApproxCount, TapRecord};
use super::store::{FastStore, FastStoreOp, TapBatch};
use crate::errors::Result;
use crate::storage::models::RedirectMode;

/// 进程内快速存储（单机运行与测试）
///
/// 去重集合是精确的，但对外同样以 [`ApproxCount`] 暴露。
#[derive(Clone)]
pub struct MemoryFastStore {
    keys: TapKeys,
    counters: Arc<DashMap<String, u64>>,
    sets: Arc<DashMap<String, HashSet<String>>>,
    expiry: Arc<DashMap<String, DateTime<Utc>>>,
    lists: Arc<DashMap<String, Vec<String>>>,
}

impl MemoryFastStore {
    pub fn new(keys: TapKeys) -> Self {
        Self {
            keys,
            counters: Arc::new(DashMap::new()),
            sets: Arc::new(DashMap::new()),
            expiry: Arc::new(DashMap::new()),
            lists: Arc::new(DashMap::new()),
        }
    }

    fn counter(&self, key: &str, now: DateTime<Utc>) -> u64 {
        if self.expiry.get(key).is_some_and(|at| *at <= now) {
            return 0;
        }
        self.counters.get(key).map(|v| *v).unwrap_or(0)
    }

    /// 队列中的点击记录，最新的在前（与 LPUSH 一致）
    pub fn pending_records(&self) -> Vec<TapRecord> {
        self.lists
            .get(self.keys.queue())
            .map(|list| {
                list.iter()
                    .filter_map(|raw| serde_json::from_str(raw).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl FastStore for MemoryFastStore {
    async fn execute(&self, batch: &TapBatch) -> Result<()> {
        let now = Utc::now();
        for op in batch.ops() {
            match op {
                FastStoreOp::Incr { key } => {
                    if self.expiry.get(key).is_some_and(|at| *at <= now) {
                        self.expiry.remove(key);
                        self.counters.remove(key);
                    }
                    *self.counters.entry(key.clone()).or_insert(0) += 1;
                }
                FastStoreOp::PfAdd { key, member } => {
                    self.sets.entry(key.clone()).or_default().insert(member.clone());
                }
                FastStoreOp::Expire { key, secs } => {
                    self.expiry
                        .insert(key.clone(), now + Duration::seconds(*secs as i64));
                }
                FastStoreOp::LPush { key, value } => {
                    self.lists.entry(key.clone()).or_default().insert(0, value.clone());
                }
            }
        }
        Ok(())
    }

    async fn read_counters(&self, event_id: i64, now: DateTime<Utc>) -> Result<AnalyticsCounters> {
        let by_mode: HashMap<RedirectMode, u64> = [
            RedirectMode::Pre,
            RedirectMode::Live,
            RedirectMode::Post,
            RedirectMode::Fallback,
        ]
        .into_iter()
        .map(|mode| (mode, self.counter(&self.keys.mode(event_id, mode), now)))
        .collect();

        let bands = self
            .sets
            .get(&self.keys.bands(event_id))
            .map(|set| set.len() as u64)
            .unwrap_or(0);

        Ok(AnalyticsCounters {
            event_id,
            total_taps: self.counter(&self.keys.total(event_id), now),
            unique_bands: ApproxCount::new(bands),
            by_mode,
            current_hour: self.counter(&self.keys.hour(event_id, now), now),
            current_velocity: self.counter(&self.keys.velocity(event_id, now), now),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
