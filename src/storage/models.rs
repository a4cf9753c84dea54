use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 活动状态
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

/// 窗口类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WindowKind {
    Pre,
    Live,
    Post,
}

/// 一次重定向所服务的模式
///
/// 窗口生效时等于窗口类型；使用活动自身兜底 URL 时为 `Fallback`。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RedirectMode {
    Pre,
    Live,
    Post,
    Fallback,
}

impl From<WindowKind> for RedirectMode {
    fn from(kind: WindowKind) -> Self {
        match kind {
            WindowKind::Pre => RedirectMode::Pre,
            WindowKind::Live => RedirectMode::Live,
            WindowKind::Post => RedirectMode::Post,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub org_id: i64,
    pub name: String,
    pub status: EventStatus,
    pub schedule_mode: bool,
    pub fallback_url: Option<String>,
    pub timezone: String,
    pub estimated_attendees: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_cancelled(&self) -> bool {
        self.status == EventStatus::Cancelled
    }
}

/// 时间窗口
///
/// `start_at` / `end_at` 是活动所在时区的墙上时间。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    pub id: i64,
    pub event_id: i64,
    pub kind: WindowKind,
    pub title: String,
    pub url: String,
    pub start_at: Option<NaiveDateTime>,
    pub end_at: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Window {
    /// 同时设置了开始和结束时间时返回区间；否则为仅手动窗口
    pub fn schedule(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.start_at, self.end_at) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn is_manual_only(&self) -> bool {
        self.schedule().is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Band {
    pub id: i64,
    pub event_id: i64,
    pub code: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub tap_count: i64,
    pub last_tapped_at: Option<DateTime<Utc>>,
    pub tag: Option<String>,
}

impl Band {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapLog {
    pub id: i64,
    pub band_id: i64,
    pub event_id: i64,
    pub window_id: Option<i64>,
    pub url: String,
    pub mode: RedirectMode,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub tapped_at: DateTime<Utc>,
}

/// 新建活动参数
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub org_id: i64,
    pub name: String,
    pub status: EventStatus,
    pub schedule_mode: bool,
    pub fallback_url: Option<String>,
    pub timezone: String,
    pub estimated_attendees: Option<i64>,
}

/// 新建窗口参数
#[derive(Debug, Clone)]
pub struct NewWindow {
    pub event_id: i64,
    pub kind: WindowKind,
    pub title: String,
    pub url: String,
    pub start_at: Option<NaiveDateTime>,
    pub end_at: Option<NaiveDateTime>,
}

/// 待写入的点击记录（无 id）
#[derive(Debug, Clone)]
pub struct NewTapLog {
    pub band_id: i64,
    pub event_id: i64,
    pub window_id: Option<i64>,
    pub url: String,
    pub mode: RedirectMode,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub tapped_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!(
            EventStatus::from_str("Cancelled").unwrap(),
            EventStatus::Cancelled
        );
        assert_eq!(EventStatus::Active.as_ref(), "active");
        assert!(EventStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_redirect_mode_from_window_kind() {
        assert_eq!(RedirectMode::from(WindowKind::Live), RedirectMode::Live);
        assert_eq!(
            serde_json::to_string(&RedirectMode::Fallback).unwrap(),
            "\"fallback\""
        );
    }

    #[test]
    fn test_manual_only_window() {
        let window = Window {
            id: 1,
            event_id: 1,
            kind: WindowKind::Pre,
            title: "Doors".to_string(),
            url: "https://example.com/pre".to_string(),
            start_at: None,
            end_at: NaiveDateTime::from_str("2026-10-19T18:00:00").ok(),
            is_active: false,
            created_at: Utc::now(),
        };
        assert!(window.is_manual_only());
    }
}
