use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analytics::{self, FastStore, TapKeys, TapLogger};
use crate::cache::{self, EdgeCache};
use crate::config::StaticConfig;
use crate::engagement::EngagementService;
use crate::scheduler::WindowScheduler;
use crate::services::EventService;
use crate::storage::{SeaOrmStorage, StorageFactory};
use crate::sync::RedirectMapSynchronizer;
use crate::system::BackgroundTasks;

/// 服务与命令共用的组件
#[derive(Clone)]
pub struct AppContext {
    pub storage: Arc<SeaOrmStorage>,
    pub edge_cache: Arc<dyn EdgeCache>,
    pub fast_store: Arc<dyn FastStore>,
    pub synchronizer: Arc<RedirectMapSynchronizer>,
    pub scheduler: WindowScheduler,
    pub event_service: EventService,
    pub engagement: Arc<EngagementService>,
    pub tap_logger: TapLogger,
    pub tasks: BackgroundTasks,
}

/// 连接数据库、创建缓存与快速存储，并组装各服务
pub async fn prepare_context(config: &StaticConfig) -> Result<AppContext> {
    let start_time = std::time::Instant::now();
    debug!("Preparing application context...");

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!(
        "Using storage backend: {}",
        storage.get_backend_config().storage_type
    );

    let edge_cache =
        cache::create_edge_cache(&config.edge_cache).context("Failed to create edge cache")?;
    let fast_store = analytics::create_fast_store(&config.fast_store)
        .context("Failed to create fast store")?;

    let ctx = assemble(config, storage, edge_cache, fast_store);
    debug!(
        "Application context ready in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(ctx)
}

/// 用已有组件组装上下文（测试中注入内存实现）
pub fn assemble(
    config: &StaticConfig,
    storage: Arc<SeaOrmStorage>,
    edge_cache: Arc<dyn EdgeCache>,
    fast_store: Arc<dyn FastStore>,
) -> AppContext {
    let tasks = BackgroundTasks::new();
    let synchronizer = Arc::new(RedirectMapSynchronizer::new(
        storage.clone(),
        edge_cache.clone(),
    ));
    let scheduler = WindowScheduler::new(storage.clone(), synchronizer.clone(), tasks.clone());
    let event_service = EventService::new(
        storage.clone(),
        synchronizer.clone(),
        scheduler.clone(),
        tasks.clone(),
    );
    let engagement = Arc::new(EngagementService::new(storage.clone()));
    let tap_logger = TapLogger::new(
        fast_store.clone(),
        TapKeys::from_config(&config.fast_store),
        config.fast_store.velocity_ttl_secs,
        tasks.clone(),
    );

    AppContext {
        storage,
        edge_cache,
        fast_store,
        synchronizer,
        scheduler,
        event_service,
        engagement,
        tap_logger,
        tasks,
    }
}
