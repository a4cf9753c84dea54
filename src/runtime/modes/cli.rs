//! One-shot maintenance commands

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde::Serialize;

use crate::cli::{Commands, ConfigCommands};
use crate::config::StaticConfig;
use crate::engagement::campaign_engagement;
use crate::runtime::lifetime::{self, startup::AppContext};

fn print_json<T: Serialize>(title: &str, value: &T) -> Result<()> {
    println!("{}", title.green().bold());
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run a non-server command
pub async fn run_cli(command: Commands, config: &StaticConfig) -> Result<()> {
    if let Commands::Config { action } = command {
        return run_config_command(action);
    }

    let ctx = lifetime::startup::prepare_context(config).await?;
    let result = dispatch(command, &ctx).await;
    // 命令本身可能触发后台同步，退出前等待
    lifetime::shutdown::drain_background_tasks(&ctx.tasks).await;
    result
}

async fn dispatch(command: Commands, ctx: &AppContext) -> Result<()> {
    match command {
        Commands::Serve | Commands::Config { .. } => {
            bail!("not a one-shot command")
        }
        Commands::Sync { events } => {
            let filter = (!events.is_empty()).then_some(events.as_slice());
            ctx.scheduler
                .reconcile_events(filter)
                .await
                .context("Window reconcile before sync failed")?;
            let report = ctx
                .synchronizer
                .sync(filter)
                .await
                .context("Redirect map sync failed")?;
            if report.skipped {
                println!(
                    "{}",
                    "Edge cache not configured, nothing was written".yellow()
                );
            }
            print_json("Sync report", &report)
        }
        Commands::Purge { event_id } => {
            let report = ctx
                .synchronizer
                .purge(event_id)
                .await
                .with_context(|| format!("Purge of event {} failed", event_id))?;
            print_json("Purge report", &report)
        }
        Commands::Sweep => {
            let report = ctx.scheduler.sweep().await.context("Window sweep failed")?;
            print_json("Sweep report", &report)
        }
        Commands::Engagement {
            event_ids,
            campaign,
        } => {
            let stats = ctx
                .engagement
                .compute(&event_ids, None)
                .await
                .context("Engagement computation failed")?;

            let mut ordered: Vec<_> = event_ids
                .iter()
                .filter_map(|id| stats.get(id).cloned())
                .collect();
            ordered.dedup_by_key(|s| s.event_id);
            for s in &ordered {
                println!(
                    "{} {} {:>3}%  {} pairs / {} bands × {} windows, {} taps",
                    "event".cyan(),
                    s.event_id,
                    s.engagement_percent,
                    s.engaged_pairs,
                    s.total_bands,
                    s.elapsed_windows,
                    s.total_taps
                );
            }

            if campaign {
                let total = campaign_engagement(&ordered);
                println!(
                    "{} {:>3}%  ({} / {})",
                    "campaign".magenta().bold(),
                    total.engagement_percent,
                    total.numerator,
                    total.denominator
                );
            }
            Ok(())
        }
        Commands::Counters { event_id } => {
            let counters = ctx
                .fast_store
                .read_counters(event_id, chrono::Utc::now())
                .await
                .context("Reading fast-store counters failed")?;
            print_json(
                &format!("Counters of event {} ({})", event_id, ctx.fast_store.name()),
                &counters,
            )?;
            println!(
                "{} {} taps/min, {} unique bands",
                "velocity".cyan(),
                counters.taps_per_minute(),
                counters.unique_bands
            );
            Ok(())
        }
        Commands::Taps { event_id, limit } => {
            let taps = ctx
                .storage
                .recent_taps(event_id, limit)
                .await
                .with_context(|| format!("Loading taps of event {} failed", event_id))?;
            if taps.is_empty() {
                println!("{}", "No taps recorded".yellow());
                return Ok(());
            }
            for tap in &taps {
                println!(
                    "{}  band {:>6}  {:<8} {}",
                    tap.tapped_at.format("%Y-%m-%d %H:%M:%S"),
                    tap.band_id,
                    tap.mode.as_ref(),
                    tap.url
                );
            }
            Ok(())
        }
    }
}

fn run_config_command(action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Generate { path, force } => {
            if Path::new(&path).exists() && !force {
                bail!("{} already exists, use --force to overwrite", path);
            }
            std::fs::write(&path, StaticConfig::generate_sample_config())
                .with_context(|| format!("Failed to write {}", path))?;
            println!("{} {}", "Sample config written to".green(), path);
            Ok(())
        }
    }
}
