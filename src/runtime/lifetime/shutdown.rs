use std::time::Duration;

use tokio::signal;
use tracing::{error, info, warn};

use crate::system::BackgroundTasks;

/// 等待后台任务的最长时间（秒）
const DRAIN_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C
pub async fn listen_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, draining background tasks...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// 在超时内等待未完成的同步和点击记录任务
pub async fn drain_background_tasks(tasks: &BackgroundTasks) {
    let pending = tasks.in_flight();
    if pending == 0 {
        info!("No background tasks in flight");
        return;
    }

    info!("Waiting for {} background tasks", pending);
    if tasks.drain(Duration::from_secs(DRAIN_TIMEOUT_SECS)).await {
        info!(
            "Background tasks drained ({} completed, {} failed)",
            tasks.completed(),
            tasks.failed()
        );
    } else {
        error!(
            "Background tasks did not finish within {} seconds, {} abandoned",
            DRAIN_TIMEOUT_SECS,
            tasks.in_flight()
        );
    }
}
