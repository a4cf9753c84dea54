//! System utilities: logging setup and background task execution

pub mod logging;
pub mod tasks;

pub use logging::init_logging;
pub use tasks::BackgroundTasks;
