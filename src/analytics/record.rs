use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::models::RedirectMode;

/// 推入待处理队列的点击记录
///
/// 由下游消费者转换为 `tap_logs` 行。`band_id` 是手环外部编码。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapRecord {
    pub band_id: String,
    pub event_id: i64,
    /// 点击时生效的窗口；兜底跳转为 None
    pub window_id: Option<i64>,
    pub mode: RedirectMode,
    pub url: String,
    pub tapped_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// 近似计数（HyperLogLog 估计值），不能当作精确基数使用
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApproxCount(u64);

impl ApproxCount {
    pub fn new(estimate: u64) -> Self {
        Self(estimate)
    }

    pub fn estimate(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ApproxCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}", self.0)
    }
}

/// 单个活动的实时计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsCounters {
    pub event_id: i64,
    pub total_taps: u64,
    pub unique_bands: ApproxCount,
    pub by_mode: HashMap<RedirectMode, u64>,
    /// 当前 UTC 小时桶
    pub current_hour: u64,
    /// 当前 10 秒桶
    pub current_velocity: u64,
}

impl AnalyticsCounters {
    /// 按当前 10 秒桶估算的每分钟点击数
    pub fn taps_per_minute(&self) -> u64 {
        self.current_velocity * 6
    }
}
