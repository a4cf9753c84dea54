//! Fast-store key layout
//!
//! ```text
//! {prefix}event:{id}:taps               INCR   total taps
//! {prefix}event:{id}:bands              PFADD  distinct band codes
//! {prefix}event:{id}:hour:{YYYYMMDDHH}  INCR   UTC hour bucket
//! {prefix}event:{id}:mode:{mode}        INCR   per-mode taps
//! {prefix}event:{id}:vel:{unix/10}      INCR   10-second bucket (expiring)
//! {prefix}{queue}                       LPUSH  pending tap records
//! ```

use chrono::{DateTime, Utc};

use crate::config::FastStoreConfig;
use crate::storage::models::RedirectMode;

/// 速度桶宽度（秒）
pub const VELOCITY_BUCKET_SECS: i64 = 10;

#[derive(Debug, Clone)]
pub struct TapKeys {
    prefix: String,
    queue: String,
}

impl TapKeys {
    pub fn new(prefix: impl Into<String>, queue_key: &str) -> Self {
        let prefix = prefix.into();
        let queue = format!("{}{}", prefix, queue_key);
        Self { prefix, queue }
    }

    pub fn from_config(config: &FastStoreConfig) -> Self {
        Self::new(config.key_prefix.clone(), &config.queue_key)
    }

    fn event(&self, event_id: i64) -> String {
        format!("{}event:{}", self.prefix, event_id)
    }

    pub fn total(&self, event_id: i64) -> String {
        format!("{}:taps", self.event(event_id))
    }

    pub fn bands(&self, event_id: i64) -> String {
        format!("{}:bands", self.event(event_id))
    }

    pub fn hour(&self, event_id: i64, at: DateTime<Utc>) -> String {
        format!("{}:hour:{}", self.event(event_id), at.format("%Y%m%d%H"))
    }

    pub fn mode(&self, event_id: i64, mode: RedirectMode) -> String {
        format!("{}:mode:{}", self.event(event_id), mode)
    }

    pub fn velocity(&self, event_id: i64, at: DateTime<Utc>) -> String {
        format!(
            "{}:vel:{}",
            self.event(event_id),
            at.timestamp().div_euclid(VELOCITY_BUCKET_SECS)
        )
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }
}
