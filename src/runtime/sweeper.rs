//! Periodic window sweep
//!
//! Catches events whose windows changed by the clock alone while nobody was
//! reading or editing them.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::scheduler::WindowScheduler;

pub fn spawn_sweeper(scheduler: WindowScheduler, every: Duration) -> JoinHandle<()> {
    info!("Window sweeper started, interval {:?}", every);

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(e) = scheduler.sweep().await {
                error!("Window sweep failed: {}", e);
            }
        }
    })
}
