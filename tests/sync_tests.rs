//! Redirect map synchronizer tests
//!
//! SQLite as the source, the in-memory edge cache as the target.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use taplinker::analytics::{MemoryFastStore, TapKeys};
use taplinker::cache::{EdgeCache, MemoryEdgeCache, NullEdgeCache};
use taplinker::config::{DatabaseConfig, StaticConfig};
use taplinker::runtime::lifetime::startup::{AppContext, assemble};
use taplinker::storage::{
    Event, EventStatus, NewEvent, NewWindow, RedirectMode, SeaOrmStorage, WindowKind,
};
use taplinker::sync::RedirectMapSynchronizer;

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("sync_test.db");
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

async fn create_event(storage: &SeaOrmStorage, name: &str, fallback: Option<&str>) -> Event {
    storage
        .insert_event(NewEvent {
            org_id: 1,
            name: name.to_string(),
            status: EventStatus::Active,
            schedule_mode: false,
            fallback_url: fallback.map(String::from),
            timezone: "UTC".to_string(),
            estimated_attendees: None,
        })
        .await
        .expect("Failed to create event")
}

fn codes(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}-{:04}", prefix, i)).collect()
}

#[tokio::test]
async fn test_sync_writes_active_window_and_fallback_targets() {
    let (ctx, cache, _dir) = create_context().await;

    let concert = create_event(&ctx.storage, "Concert", Some("https://concert.example.com")).await;
    let live = ctx
        .storage
        .insert_window(NewWindow {
            event_id: concert.id,
            kind: WindowKind::Live,
            title: "Main set".to_string(),
            url: "https://concert.example.com/live".to_string(),
            start_at: None,
            end_at: None,
        })
        .await
        .unwrap();
    ctx.storage
        .set_window_active_manually(live.id, true)
        .await
        .unwrap();
    ctx.storage
        .insert_bands(concert.id, &codes("C", 120))
        .await
        .unwrap();

    let expo = create_event(&ctx.storage, "Expo", Some("https://expo.example.com")).await;
    ctx.storage.insert_bands(expo.id, &codes("X", 30)).await.unwrap();

    let report = ctx.synchronizer.sync(None).await.unwrap();
    assert!(!report.skipped);
    assert_eq!(report.events_processed, 2);
    assert_eq!(report.bands_written, 150);
    assert_eq!(report.bands_cleared, 0);
    assert_eq!(cache.len(), 150);

    let entry = cache.get("C-0042").await.unwrap().unwrap();
    assert_eq!(entry.url, "https://concert.example.com/live");
    assert_eq!(entry.mode, RedirectMode::Live);
    assert_eq!(entry.event_id, concert.id);

    let entry = cache.get("X-0007").await.unwrap().unwrap();
    assert_eq!(entry.url, "https://expo.example.com");
    assert_eq!(entry.mode, RedirectMode::Fallback);
    assert_eq!(entry.window_id, None);
}

#[tokio::test]
async fn test_sync_filter_limits_events() {
    let (ctx, cache, _dir) = create_context().await;
    let a = create_event(&ctx.storage, "A", Some("https://a.example.com")).await;
    let b = create_event(&ctx.storage, "B", Some("https://b.example.com")).await;
    ctx.storage.insert_bands(a.id, &codes("A", 5)).await.unwrap();
    ctx.storage.insert_bands(b.id, &codes("B", 5)).await.unwrap();

    let report = ctx.synchronizer.sync(Some(&[b.id])).await.unwrap();
    assert_eq!(report.events_processed, 1);
    assert_eq!(report.bands_written, 5);
    assert!(cache.get("A-0000").await.unwrap().is_none());
    assert!(cache.get("B-0000").await.unwrap().is_some());
}

#[tokio::test]
async fn test_event_without_target_clears_stale_entries() {
    let (ctx, cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "Dark", None).await;
    let window = ctx
        .storage
        .insert_window(NewWindow {
            event_id: event.id,
            kind: WindowKind::Pre,
            title: "Doors".to_string(),
            url: "https://dark.example.com/doors".to_string(),
            start_at: None,
            end_at: None,
        })
        .await
        .unwrap();
    ctx.storage.insert_bands(event.id, &codes("D", 3)).await.unwrap();
    ctx.storage
        .set_window_active_manually(window.id, true)
        .await
        .unwrap();

    ctx.synchronizer.sync(None).await.unwrap();
    assert_eq!(cache.len(), 3);

    ctx.storage
        .set_window_active_manually(window.id, false)
        .await
        .unwrap();
    let report = ctx.synchronizer.sync(None).await.unwrap();
    assert_eq!(report.bands_written, 0);
    assert_eq!(report.bands_cleared, 3);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_unconfigured_cache_is_skipped() {
    let (storage, _dir) = create_temp_storage().await;
    let event = create_event(&storage, "Offline", Some("https://offline.example.com")).await;
    storage.insert_bands(event.id, &codes("O", 2)).await.unwrap();

    let synchronizer = RedirectMapSynchronizer::new(storage, Arc::new(NullEdgeCache));
    assert!(!synchronizer.is_configured());

    let report = synchronizer.sync(None).await.unwrap();
    assert!(report.skipped);
    assert_eq!(report.bands_written, 0);

    let purge = synchronizer.purge(event.id).await.unwrap();
    assert!(purge.skipped);
}

#[tokio::test]
async fn test_cancel_event_purges_all_bands_including_deleted() {
    let (ctx, cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "Festival", Some("https://fest.example.com")).await;
    let other = create_event(&ctx.storage, "Other", Some("https://other.example.com")).await;
    ctx.storage.insert_bands(event.id, &codes("F", 40)).await.unwrap();
    ctx.storage.insert_bands(other.id, &codes("Q", 2)).await.unwrap();
    ctx.synchronizer.sync(None).await.unwrap();
    assert_eq!(cache.len(), 42);

    // 软删除的手环只从数据库消失，缓存条目仍由 purge 清掉
    let band = ctx.storage.list_bands(event.id).await.unwrap().remove(0);
    ctx.storage.soft_delete_band(band.id).await.unwrap();

    ctx.event_service.cancel_event(event.id).await.unwrap();
    assert!(ctx.tasks.drain(Duration::from_secs(5)).await);

    assert_eq!(cache.len(), 2);
    assert!(cache.get(&band.code).await.unwrap().is_none());
    assert!(cache.get("Q-0001").await.unwrap().is_some());

    let stored = ctx.storage.get_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EventStatus::Cancelled);

    // 已取消的活动不再参与同步
    let report = ctx.synchronizer.sync(None).await.unwrap();
    assert_eq!(report.events_processed, 1);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_status_change_resyncs_event() {
    let (ctx, cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "Gala", Some("https://gala.example.com")).await;
    ctx.storage.insert_bands(event.id, &codes("G", 4)).await.unwrap();

    ctx.event_service
        .set_status(event.id, EventStatus::Completed)
        .await
        .unwrap();
    assert!(ctx.tasks.drain(Duration::from_secs(5)).await);
    assert_eq!(cache.len(), 4);

    assert_eq!(
        ctx.event_service
            .set_status(9999, EventStatus::Active)
            .await
            .unwrap_err()
            .code(),
        "E009"
    );
}

#[tokio::test]
async fn test_delete_band_removes_only_that_entry() {
    let (ctx, cache, _dir) = create_context().await;
    let event = create_event(&ctx.storage, "Run", Some("https://run.example.com")).await;
    ctx.storage.insert_bands(event.id, &codes("R", 3)).await.unwrap();
    ctx.synchronizer.sync(None).await.unwrap();

    let bands = ctx.storage.list_bands(event.id).await.unwrap();
    let removed = ctx.event_service.delete_band(bands[1].id).await.unwrap();
    assert!(removed.is_deleted());
    assert!(ctx.tasks.drain(Duration::from_secs(5)).await);

    assert!(cache.get("R-0001").await.unwrap().is_none());
    assert!(cache.get("R-0000").await.unwrap().is_some());
    assert!(cache.get("R-0002").await.unwrap().is_some());
    assert_eq!(ctx.storage.list_bands(event.id).await.unwrap().len(), 2);

    // 之后的全量同步不会把已删除的手环写回
    ctx.synchronizer.sync(None).await.unwrap();
    assert!(cache.get("R-0001").await.unwrap().is_none());
}
