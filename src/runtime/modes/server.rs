//! Server mode
//!
//! Starts the edge HTTP server and the periodic window sweeper.

use std::time::Duration;

use actix_web::{App, HttpServer, middleware::DefaultHeaders, web};
use anyhow::Result;
use tracing::{info, warn};

use crate::api::services::{EdgeContext, health_routes, redirect_routes};
use crate::config::StaticConfig;
use crate::runtime::{lifetime, sweeper};

/// Run the HTTP server until it stops or a shutdown signal arrives
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let ctx = lifetime::startup::prepare_context(config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    let sweeper_handle = if config.scheduler.enabled {
        Some(sweeper::spawn_sweeper(
            ctx.scheduler.clone(),
            Duration::from_secs(config.scheduler.sweep_interval_secs.max(1)),
        ))
    } else {
        warn!("Window sweeper disabled, only reactive refreshes will run");
        None
    };

    if config.server.trusted_proxies.is_empty() {
        info!("Client IP: auto-detect mode, private peers may forward X-Forwarded-For");
    } else {
        info!(
            "Client IP: trusted proxies {:?}",
            config.server.trusted_proxies
        );
    }

    let edge = EdgeContext {
        cache: ctx.edge_cache.clone(),
        logger: ctx.tap_logger.clone(),
        default_url: config.redirect.default_url.clone(),
        trusted_proxies: config.server.trusted_proxies.clone(),
    };
    let storage = ctx.storage.clone();
    let edge_cache = ctx.edge_cache.clone();
    let redirect_path = config.redirect.path.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(edge.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(edge_cache.clone()))
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .service(health_routes())
            .service(redirect_routes(&redirect_path))
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .client_disconnect_timeout(Duration::from_millis(1000))
    .workers(cpu_count)
    .bind(&bind_address)?
    .run();

    warn!(
        "Starting server at http://{} ({} workers)",
        bind_address, cpu_count
    );

    let handle = server.handle();
    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            handle.stop(true).await;
        }
    }

    if let Some(sweeper) = sweeper_handle {
        sweeper.abort();
    }
    lifetime::shutdown::drain_background_tasks(&ctx.tasks).await;
    info!("Server stopped");
    Ok(())
}
