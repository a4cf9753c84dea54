//! Engagement aggregation
//!
//! A band is expected to tap once per elapsed window, so an event's
//! engagement is `engaged pairs / (bands × elapsed windows)`. Events with no
//! elapsed windows use `unique bands / bands`. Campaign figures add up
//! numerators and denominators instead of averaging percentages.

mod service;

pub use service::EngagementService;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::scheduler::local_now;
use crate::storage::TapSummary;
use crate::storage::models::Window;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStats {
    pub event_id: i64,
    pub engagement_percent: u32,
    pub total_taps: u64,
    pub elapsed_windows: u64,
    pub engaged_pairs: u64,
    pub total_bands: u64,
    pub unique_bands: u64,
}

impl EngagementStats {
    /// (分子, 分母)，用于跨活动汇总
    pub fn ratio_parts(&self) -> (u64, u64) {
        if self.elapsed_windows > 0 {
            (self.engaged_pairs, self.total_bands * self.elapsed_windows)
        } else {
            (self.unique_bands, self.total_bands)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignEngagement {
    pub engagement_percent: u32,
    pub numerator: u64,
    pub denominator: u64,
    pub events: usize,
    pub total_taps: u64,
}

/// `round(numerator / denominator * 100)`，分母为 0 时为 0
pub fn percent(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (numerator as f64 / denominator as f64 * 100.0).round() as u32
}

/// 已开始、当前生效或有点击记录的窗口
pub fn elapsed_windows(
    windows: &[Window],
    tapped: &HashSet<i64>,
    now: DateTime<Utc>,
    tz: Tz,
) -> HashSet<i64> {
    let now_local = local_now(now, tz);
    windows
        .iter()
        .filter(|w| {
            w.start_at.is_some_and(|start| start <= now_local)
                || w.is_active
                || tapped.contains(&w.id)
        })
        .map(|w| w.id)
        .collect()
}

/// 计算单个活动的参与度
pub fn compute_event(
    event_id: i64,
    windows: &[Window],
    summary: &TapSummary,
    total_bands: u64,
    now: DateTime<Utc>,
    tz: Tz,
) -> EngagementStats {
    let elapsed = elapsed_windows(windows, &summary.tapped_windows(), now, tz);
    let engaged_pairs = summary
        .pairs
        .iter()
        .filter(|(_, window_id)| elapsed.contains(window_id))
        .count() as u64;

    let mut stats = EngagementStats {
        event_id,
        engagement_percent: 0,
        total_taps: summary.total_taps,
        elapsed_windows: elapsed.len() as u64,
        engaged_pairs,
        total_bands,
        unique_bands: summary.unique_bands,
    };
    let (numerator, denominator) = stats.ratio_parts();
    stats.engagement_percent = percent(numerator, denominator);
    stats
}

/// 跨活动汇总
pub fn campaign_engagement(stats: &[EngagementStats]) -> CampaignEngagement {
    let (numerator, denominator) = stats
        .iter()
        .map(EngagementStats::ratio_parts)
        .fold((0, 0), |(n, d), (sn, sd)| (n + sn, d + sd));

    CampaignEngagement {
        engagement_percent: percent(numerator, denominator),
        numerator,
        denominator,
        events: stats.len(),
        total_taps: stats.iter().map(|s| s.total_taps).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::WindowKind;
    use chrono::{NaiveDate, NaiveDateTime, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap()
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn window(id: i64, start: Option<NaiveDateTime>) -> Window {
        Window {
            id,
            event_id: 1,
            kind: WindowKind::Live,
            title: String::new(),
            url: "https://example.com".to_string(),
            start_at: start,
            end_at: start.map(|s| s + chrono::Duration::hours(1)),
            is_active: false,
            created_at: Utc::now(),
        }
    }

    /// 15 个不同的 (band, window) 组合分布在两个窗口上
    fn fifteen_pairs() -> TapSummary {
        let mut summary = TapSummary::default();
        for band in 0..10 {
            summary.pairs.insert((band, 1));
        }
        for band in 0..5 {
            summary.pairs.insert((band, 2));
        }
        summary.unique_bands = 10;
        summary.total_taps = 40;
        summary
    }

    #[test]
    fn test_primary_formula() {
        let windows = vec![window(1, Some(at(10))), window(2, Some(at(14)))];
        let stats = compute_event(1, &windows, &fifteen_pairs(), 10, now(), Tz::UTC);

        assert_eq!(stats.elapsed_windows, 2);
        assert_eq!(stats.engaged_pairs, 15);
        assert_eq!(stats.engagement_percent, 75);
    }

    #[test]
    fn test_unique_band_formula_without_windows() {
        let summary = TapSummary {
            total_taps: 9,
            unique_bands: 6,
            pairs: HashSet::new(),
        };
        let stats = compute_event(1, &[], &summary, 10, now(), Tz::UTC);

        assert_eq!(stats.elapsed_windows, 0);
        assert_eq!(stats.engagement_percent, 60);
    }

    #[test]
    fn test_zero_bands_is_zero_percent() {
        let windows = vec![window(1, Some(at(10)))];
        let stats = compute_event(1, &windows, &TapSummary::default(), 0, now(), Tz::UTC);
        assert_eq!(stats.engagement_percent, 0);

        let stats = compute_event(1, &[], &TapSummary::default(), 0, now(), Tz::UTC);
        assert_eq!(stats.engagement_percent, 0);
    }

    #[test]
    fn test_future_window_is_not_elapsed_unless_tapped_or_active() {
        let mut active = window(3, Some(at(23)));
        active.is_active = true;
        let windows = vec![
            window(1, Some(at(10))),
            window(2, Some(at(22))),
            active,
            window(4, None),
        ];
        let mut summary = TapSummary::default();
        summary.pairs.insert((7, 4));

        let elapsed = elapsed_windows(&windows, &summary.tapped_windows(), now(), Tz::UTC);
        assert_eq!(elapsed, HashSet::from([1, 3, 4]));
    }

    #[test]
    fn test_campaign_sums_ratio_parts() {
        let a = EngagementStats {
            event_id: 1,
            elapsed_windows: 2,
            engaged_pairs: 15,
            total_bands: 10,
            engagement_percent: 75,
            ..Default::default()
        };
        let b = EngagementStats {
            event_id: 2,
            elapsed_windows: 1,
            engaged_pairs: 3,
            total_bands: 5,
            engagement_percent: 60,
            ..Default::default()
        };

        let campaign = campaign_engagement(&[a, b]);
        assert_eq!(campaign.numerator, 18);
        assert_eq!(campaign.denominator, 25);
        assert_eq!(campaign.engagement_percent, 72);
    }

    #[test]
    fn test_campaign_uses_plain_bands_for_events_without_windows() {
        let windowed = EngagementStats {
            elapsed_windows: 2,
            engaged_pairs: 15,
            total_bands: 10,
            ..Default::default()
        };
        let plain = EngagementStats {
            elapsed_windows: 0,
            unique_bands: 6,
            total_bands: 10,
            ..Default::default()
        };

        let campaign = campaign_engagement(&[windowed, plain]);
        assert_eq!((campaign.numerator, campaign.denominator), (21, 30));
        assert_eq!(campaign.engagement_percent, 70);
        assert_eq!(campaign_engagement(&[]).engagement_percent, 0);
    }
}
