//! Window scheduler
//!
//! Decides which window of an event is active from the window intervals and
//! the current time. [`evaluate`] is pure; [`WindowScheduler`] applies its
//! result to storage and schedules the cache sync.

mod service;

pub use service::{SweepReport, WindowScheduler};

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::storage::models::Window;

/// 窗口结束后仍视为生效的宽限期（秒）
pub const END_GRACE_SECS: i64 = 60;

/// 一次评估的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// 当前生效集合与期望不一致，需要写入
    pub changed: bool,
    /// 期望的生效窗口
    pub active_window_id: Option<i64>,
}

/// 解析 IANA 时区名，未知时区按 UTC 处理
pub fn parse_timezone(name: &str) -> Tz {
    name.trim().parse::<Tz>().unwrap_or_else(|_| {
        warn!("Unknown timezone '{}', falling back to UTC", name);
        Tz::UTC
    })
}

/// `now` 在活动时区下的墙上时间
pub fn local_now(now: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    now.with_timezone(&tz).naive_local()
}

/// `start <= now < end + 1min`
pub fn covers(start: NaiveDateTime, end: NaiveDateTime, now_local: NaiveDateTime) -> bool {
    start <= now_local && now_local < end + Duration::seconds(END_GRACE_SECS)
}

/// 选出覆盖 `now` 的窗口
///
/// 只考虑同时设置了开始和结束时间的窗口；多个窗口同时覆盖时取最早创建的
/// （创建时间相同按 id）。
pub fn select_window(windows: &[Window], now: DateTime<Utc>, tz: Tz) -> Option<&Window> {
    let now_local = local_now(now, tz);
    windows
        .iter()
        .filter(|w| {
            w.schedule()
                .is_some_and(|(start, end)| covers(start, end, now_local))
        })
        .min_by_key(|w| (w.created_at, w.id))
}

/// 评估一个活动的全部窗口
///
/// `windows` 可以包含仅手动窗口，它们不会被选中，但若当前处于生效状态会计入
/// 现有集合（从而被停用）。
pub fn evaluate(windows: &[Window], now: DateTime<Utc>, tz: Tz) -> Evaluation {
    let selected = select_window(windows, now, tz).map(|w| w.id);

    let current: HashSet<i64> = windows.iter().filter(|w| w.is_active).map(|w| w.id).collect();
    let desired: HashSet<i64> = selected.into_iter().collect();

    Evaluation {
        changed: current != desired,
        active_window_id: selected,
    }
}
