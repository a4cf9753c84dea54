//! Mode routing
//!
//! `serve` (or no subcommand) runs the HTTP edge server; every other
//! subcommand is a one-shot maintenance command.

pub mod cli;
pub mod server;

pub use cli::run_cli;
pub use server::run_server;
