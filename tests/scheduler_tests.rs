//! Window scheduler tests
//!
//! Runs the scheduler against a temporary SQLite database and checks the
//! stored active flags, the schedule-mode switch and the follow-up cache sync.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tempfile::TempDir;

use taplinker::analytics::MemoryFastStore;
use taplinker::analytics::TapKeys;
use taplinker::cache::{EdgeCache, MemoryEdgeCache};
use taplinker::config::{DatabaseConfig, StaticConfig};
use taplinker::runtime::lifetime::startup::{AppContext, assemble};
use taplinker::storage::{
    Event, EventStatus, NewEvent, NewWindow, RedirectMode, SeaOrmStorage, Window, WindowKind,
};

// =============================================================================
// Test Setup
// =============================================================================

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("scheduler_test.db");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        ..Default::default()
    };
    let storage = SeaOrmStorage::new(&config)
        .await
        .expect("Failed to create storage");
    (Arc::new(storage), temp_dir)
}

async fn create_context() -> (AppContext, Arc<MemoryEdgeCache>, TempDir) {
    let (storage, temp_dir) = create_temp_storage().await;
    let cache = Arc::new(MemoryEdgeCache::new());
    let fast_store = Arc::new(MemoryFastStore::new(TapKeys::new("tl:", "pending")));
    let ctx = assemble(&StaticConfig::default(), storage, cache.clone(), fast_store);
    (ctx, cache, temp_dir)
}

fn local(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, h, m, s).unwrap()
}

async fn create_event(storage: &SeaOrmStorage, timezone: &str, fallback: Option<&str>) -> Event {
    storage
        .insert_event(NewEvent {
            org_id: 1,
            name: "Harbour Nights".to_string(),
            status: EventStatus::Active,
            schedule_mode: true,
            fallback_url: fallback.map(String::from),
            timezone: timezone.to_string(),
            estimated_attendees: Some(500),
        })
        .await
        .expect("Failed to create event")
}

async fn create_window(
    storage: &SeaOrmStorage,
    event_id: i64,
    kind: WindowKind,
    span: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Window {
    storage
        .insert_window(NewWindow {
            event_id,
            kind,
            title: format!("{} window", kind),
            url: format!("https://harbour.example.com/{}", kind),
            start_at: span.map(|(s, _)| s),
            end_at: span.map(|(_, e)| e),
        })
        .await
        .expect("Failed to create window")
}

/// 三个连续窗口：pre 08-10，live 10-12，post 12-23（活动本地时间）
async fn create_day(storage: &SeaOrmStorage, event_id: i64) -> (Window, Window, Window) {
    let pre = create_window(storage, event_id, WindowKind::Pre, Some((local(8, 0), local(10, 0)))).await;
    let live = create_window(storage, event_id, WindowKind::Live, Some((local(10, 0), local(12, 0)))).await;
    let post = create_window(storage, event_id, WindowKind::Post, Some((local(12, 0), local(23, 0)))).await;
    (pre, live, post)
}

async fn active_ids(storage: &SeaOrmStorage, event_id: i64) -> Vec<i64> {
    storage
        .list_windows(event_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|w| w.is_active)
        .map(|w| w.id)
        .collect()
}

// =============================================================================
// Refresh / sweep
// =============================================================================

#[tokio::test]
async fn test_refresh_activates_covering_window_once() {
    let (ctx, _cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "UTC", None).await;
    let (_, live, _) = create_day(&ctx.storage, event.id).await;

    let first = ctx
        .scheduler
        .refresh_event_at(event.id, utc(11, 0, 0))
        .await
        .unwrap();
    assert!(first.changed);
    assert_eq!(first.active_window_id, Some(live.id));
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![live.id]);

    let second = ctx
        .scheduler
        .refresh_event_at(event.id, utc(11, 5, 0))
        .await
        .unwrap();
    assert!(!second.changed);
    assert_eq!(second.active_window_id, Some(live.id));
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![live.id]);
}

#[tokio::test]
async fn test_sweep_moves_between_windows_in_event_timezone() {
    let (ctx, _cache, _dir) = create_context().await;
    // 2026-10-19 柏林为 UTC+2
    let event = create_event(&ctx.storage, "Europe/Berlin", None).await;
    let (pre, live, post) = create_day(&ctx.storage, event.id).await;

    let report = ctx.scheduler.sweep_at(utc(6, 30, 0)).await.unwrap();
    assert_eq!((report.evaluated, report.changed, report.failed), (1, 1, 0));
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![pre.id]);

    // 本地 10:00:30：pre 仍在宽限期内，但 live 也覆盖且创建更早者优先
    let report = ctx.scheduler.sweep_at(utc(8, 0, 30)).await.unwrap();
    assert_eq!(report.changed, 0);
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![pre.id]);

    let report = ctx.scheduler.sweep_at(utc(8, 1, 1)).await.unwrap();
    assert_eq!(report.changed, 1);
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![live.id]);

    ctx.scheduler.sweep_at(utc(10, 30, 0)).await.unwrap();
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![post.id]);

    // 本地 23:01 之后：没有覆盖窗口，全部停用
    let report = ctx.scheduler.sweep_at(utc(21, 1, 1)).await.unwrap();
    assert_eq!(report.changed, 1);
    assert!(active_ids(&ctx.storage, event.id).await.is_empty());

    let report = ctx.scheduler.sweep_at(utc(21, 30, 0)).await.unwrap();
    assert_eq!(report.changed, 0);
}

#[tokio::test]
async fn test_sweep_skips_cancelled_and_manual_events() {
    let (ctx, _cache, _dir) = create_context().await;
    let scheduled = create_event(&ctx.storage, "UTC", None).await;
    let cancelled = create_event(&ctx.storage, "UTC", None).await;
    let manual = create_event(&ctx.storage, "UTC", None).await;
    for event in [&scheduled, &cancelled, &manual] {
        create_day(&ctx.storage, event.id).await;
    }

    ctx.storage
        .set_event_status(cancelled.id, EventStatus::Cancelled)
        .await
        .unwrap();
    ctx.storage.set_schedule_mode(manual.id, false).await.unwrap();

    let report = ctx.scheduler.sweep_at(utc(11, 0, 0)).await.unwrap();
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.changed, 1);
    assert!(active_ids(&ctx.storage, cancelled.id).await.is_empty());
    assert!(active_ids(&ctx.storage, manual.id).await.is_empty());
}

#[tokio::test]
async fn test_refresh_unknown_event_is_not_found() {
    let (ctx, _cache, _dir) = create_context().await;
    let err = ctx.scheduler.refresh_event(4242).await.unwrap_err();
    assert_eq!(err.code(), "E009");
}

#[tokio::test]
async fn test_overlapping_sweeps_leave_one_active_window() {
    let (ctx, _cache, _dir) = create_context().await;
    let mut events = Vec::new();
    for tz in ["UTC", "UTC", "Europe/Berlin"] {
        let event = create_event(&ctx.storage, tz, None).await;
        create_day(&ctx.storage, event.id).await;
        events.push(event);
    }

    let (first, second) = tokio::join!(
        ctx.scheduler.sweep_at(utc(11, 0, 0)),
        ctx.scheduler.sweep_at(utc(11, 0, 0))
    );
    first.unwrap();
    second.unwrap();
    for event in &events {
        assert!(active_ids(&ctx.storage, event.id).await.len() <= 1);
    }

    // 两次巡检目标不同，结果仍只有一个生效窗口
    let (first, second) = tokio::join!(
        ctx.scheduler.sweep_at(utc(13, 0, 0)),
        ctx.scheduler.sweep_at(utc(9, 0, 0))
    );
    first.unwrap();
    second.unwrap();
    for event in &events {
        assert!(active_ids(&ctx.storage, event.id).await.len() <= 1);
    }

    // 之后的单次巡检收敛到覆盖窗口
    ctx.scheduler.sweep_at(utc(11, 0, 0)).await.unwrap();
    for event in &events {
        let windows = ctx.storage.list_windows(event.id).await.unwrap();
        let expected = if event.timezone == "UTC" { 1 } else { 2 };
        assert_eq!(
            active_ids(&ctx.storage, event.id).await,
            vec![windows[expected].id]
        );
    }
}

#[tokio::test]
async fn test_reconcile_before_sync_aligns_scheduled_events() {
    let (ctx, _cache, _dir) = create_context().await;
    let now = Utc::now().naive_utc();
    let span = Some((now - chrono::Duration::hours(1), now + chrono::Duration::hours(1)));

    let first = create_event(&ctx.storage, "UTC", None).await;
    let second = create_event(&ctx.storage, "UTC", None).await;
    let a = create_window(&ctx.storage, first.id, WindowKind::Live, span).await;
    let b = create_window(&ctx.storage, second.id, WindowKind::Pre, span).await;

    assert_eq!(ctx.scheduler.reconcile_events(None).await.unwrap(), 2);
    assert_eq!(active_ids(&ctx.storage, first.id).await, vec![a.id]);
    assert_eq!(active_ids(&ctx.storage, second.id).await, vec![b.id]);

    assert_eq!(ctx.scheduler.reconcile_events(None).await.unwrap(), 0);
    assert_eq!(
        ctx.scheduler.reconcile_events(Some(&[first.id, 4242])).await.unwrap(),
        0
    );
}

// =============================================================================
// Manual control
// =============================================================================

#[tokio::test]
async fn test_manual_toggle_turns_schedule_mode_off() {
    let (ctx, _cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "UTC", None).await;
    let (pre, live, _) = create_day(&ctx.storage, event.id).await;

    ctx.scheduler
        .refresh_event_at(event.id, utc(11, 0, 0))
        .await
        .unwrap();
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![live.id]);

    let toggled = ctx.scheduler.set_window_active(pre.id, true).await.unwrap();
    assert!(toggled.is_active);
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![pre.id]);

    let stored = ctx.storage.get_event(event.id).await.unwrap().unwrap();
    assert!(!stored.schedule_mode);

    // 手动模式下巡检不再覆盖操作员的选择
    let report = ctx.scheduler.sweep_at(utc(11, 0, 0)).await.unwrap();
    assert_eq!(report.evaluated, 0);
    let evaluation = ctx
        .scheduler
        .refresh_event_at(event.id, utc(11, 0, 0))
        .await
        .unwrap();
    assert!(!evaluation.changed);
    assert_eq!(evaluation.active_window_id, Some(pre.id));

    ctx.scheduler.set_window_active(pre.id, false).await.unwrap();
    assert!(active_ids(&ctx.storage, event.id).await.is_empty());
}

#[tokio::test]
async fn test_scheduled_switch_yields_to_manual_choice() {
    let (ctx, _cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "UTC", None).await;
    let (pre, live, _) = create_day(&ctx.storage, event.id).await;

    // 巡检已读到排期模式，随后操作员手动选择了 pre
    let loaded = ctx.storage.list_scheduled_events().await.unwrap();
    assert_eq!(loaded.len(), 1);
    ctx.scheduler.set_window_active(pre.id, true).await.unwrap();

    let applied = ctx
        .storage
        .apply_active_window(event.id, Some(live.id))
        .await
        .unwrap();
    assert!(!applied);
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![pre.id]);

    let cancelled = create_event(&ctx.storage, "UTC", None).await;
    let (_, cancelled_live, _) = create_day(&ctx.storage, cancelled.id).await;
    ctx.storage
        .set_event_status(cancelled.id, EventStatus::Cancelled)
        .await
        .unwrap();
    assert!(
        !ctx.storage
            .apply_active_window(cancelled.id, Some(cancelled_live.id))
            .await
            .unwrap()
    );
    assert!(active_ids(&ctx.storage, cancelled.id).await.is_empty());
}

#[tokio::test]
async fn test_manual_only_window_can_be_activated() {
    let (ctx, _cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "UTC", None).await;
    create_day(&ctx.storage, event.id).await;
    let encore = create_window(&ctx.storage, event.id, WindowKind::Live, None).await;

    ctx.scheduler.set_window_active(encore.id, true).await.unwrap();
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![encore.id]);
}

#[tokio::test]
async fn test_reenabling_schedule_mode_reevaluates() {
    let (ctx, _cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "UTC", None).await;
    let encore = create_window(&ctx.storage, event.id, WindowKind::Live, None).await;
    ctx.scheduler.set_window_active(encore.id, true).await.unwrap();

    // 没有任何排期窗口，重新开启后手动窗口被停用
    let evaluation = ctx
        .scheduler
        .set_schedule_mode(event.id, true)
        .await
        .unwrap()
        .expect("enabling schedule mode evaluates");
    assert!(evaluation.changed);
    assert_eq!(evaluation.active_window_id, None);
    assert!(active_ids(&ctx.storage, event.id).await.is_empty());

    assert!(ctx.scheduler.set_schedule_mode(event.id, false).await.unwrap().is_none());
}

// =============================================================================
// Follow-up sync
// =============================================================================

#[tokio::test]
async fn test_activation_change_resyncs_edge_cache() {
    let (ctx, cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "UTC", Some("https://harbour.example.com/info")).await;
    let (_, live, post) = create_day(&ctx.storage, event.id).await;
    ctx.storage
        .insert_bands(event.id, &["HB-1".to_string(), "HB-2".to_string()])
        .await
        .unwrap();

    ctx.scheduler
        .refresh_event_at(event.id, utc(11, 0, 0))
        .await
        .unwrap();
    assert!(ctx.tasks.drain(Duration::from_secs(5)).await);

    let entry = cache.get("HB-1").await.unwrap().expect("band synced");
    assert_eq!(entry.mode, RedirectMode::Live);
    assert_eq!(entry.window_id, Some(live.id));
    assert_eq!(entry.url, live.url);

    ctx.scheduler.sweep_at(utc(13, 0, 0)).await.unwrap();
    assert!(ctx.tasks.drain(Duration::from_secs(5)).await);
    let entry = cache.get("HB-2").await.unwrap().expect("band synced");
    assert_eq!(entry.mode, RedirectMode::Post);
    assert_eq!(entry.window_id, Some(post.id));

    // 所有窗口结束后回落到活动兜底 URL
    ctx.scheduler.sweep_at(utc(23, 30, 0)).await.unwrap();
    assert!(ctx.tasks.drain(Duration::from_secs(5)).await);
    let entry = cache.get("HB-1").await.unwrap().expect("band synced");
    assert_eq!(entry.mode, RedirectMode::Fallback);
    assert_eq!(entry.url, "https://harbour.example.com/info");
    assert_eq!(entry.window_id, None);
}

#[tokio::test]
async fn test_status_change_aligns_window_before_sync() {
    let (ctx, cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "UTC", Some("https://harbour.example.com/info")).await;
    ctx.storage
        .set_event_status(event.id, EventStatus::Draft)
        .await
        .unwrap();

    let now = Utc::now().naive_utc();
    let live = create_window(
        &ctx.storage,
        event.id,
        WindowKind::Live,
        Some((now - chrono::Duration::hours(1), now + chrono::Duration::hours(1))),
    )
    .await;
    ctx.storage
        .insert_bands(event.id, &["HB-7".to_string()])
        .await
        .unwrap();

    ctx.event_service
        .set_status(event.id, EventStatus::Active)
        .await
        .unwrap();
    assert_eq!(active_ids(&ctx.storage, event.id).await, vec![live.id]);
    assert!(ctx.tasks.drain(Duration::from_secs(5)).await);

    let entry = cache.get("HB-7").await.unwrap().expect("band synced");
    assert_eq!(entry.mode, RedirectMode::Live);
    assert_eq!(entry.window_id, Some(live.id));
    assert_eq!(entry.url, live.url);
}
