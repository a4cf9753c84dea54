use clap::Parser;
use tracing::{debug, error};

use taplinker::cli::{Cli, Commands};
use taplinker::config::{get_config, init_config_from};
use taplinker::errors::TaplinkerError;
use taplinker::runtime::modes;
use taplinker::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_config_from(&cli.config);
    let config = get_config();

    // 必须持有到进程结束，否则非阻塞日志不会刷出
    let _log_guard = init_logging(&config.logging);
    debug!("Configuration loaded from {}", cli.config);

    let result = match cli.command {
        None | Some(Commands::Serve) => modes::run_server(&config).await,
        Some(command) => modes::run_cli(command, &config).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
        if let Some(err) = e.downcast_ref::<TaplinkerError>() {
            eprintln!("{}", err.format_colored());
        }
    }
    result
}
