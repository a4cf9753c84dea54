//! Taplinker - time-windowed wristband tap redirector
//!
//! A tap on a wristband (`GET /e?bandId=...`) is redirected to the URL of
//! whichever window (pre / live / post) is currently active for the band's
//! event, and recorded for analytics without holding up the response.
//!
//! # Architecture
//! - `scheduler`: decides the active window from window intervals and time
//! - `sync`: pushes the band → URL map from the database into the edge cache
//! - `api`: edge redirect handler and health probes
//! - `analytics`: pipelined tap counters and the pending-tap queue
//! - `engagement`: engagement percentages from tap history
//! - `storage`: SeaORM system of record (events, windows, bands, tap logs)
//! - `cache`: edge cache backends (Redis, in-memory, null)
//! - `services`: mutation hooks that trigger background cache updates
//! - `config`, `system`, `runtime`: configuration, logging, background
//!   tasks and process lifecycle

pub mod analytics;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod engagement;
pub mod errors;
pub mod runtime;
pub mod scheduler;
pub mod services;
pub mod storage;
pub mod sync;
pub mod system;
pub mod utils;
