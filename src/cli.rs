//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Taplinker - wristband tap redirector
#[derive(Parser, Debug)]
#[command(name = "taplinker")]
#[command(version)]
#[command(about = "Time-windowed wristband tap redirector", long_about = None)]
pub struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the edge HTTP server and the window sweeper (default)
    Serve,

    /// Push the band → URL map into the edge cache
    Sync {
        /// Restrict to these event ids (repeatable)
        #[arg(long = "event", short = 'e')]
        events: Vec<i64>,
    },

    /// Remove every edge cache entry of an event
    Purge {
        event_id: i64,
    },

    /// Run one window scheduler sweep
    Sweep,

    /// Print engagement statistics
    Engagement {
        #[arg(required = true)]
        event_ids: Vec<i64>,

        /// Also print the combined campaign figure
        #[arg(long)]
        campaign: bool,
    },

    /// Print live fast-store counters of an event
    Counters {
        event_id: i64,
    },

    /// Print the most recent persisted taps of an event
    Taps {
        event_id: i64,

        #[arg(long, short = 'n', default_value_t = 20)]
        limit: u64,
    },

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a sample config file
    Generate {
        /// Output path
        #[arg(default_value = "config.example.toml")]
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
