//! `overseerd`: load configuration, bootstrap the controller, and serve the
//! HTTP front-end.
//!
//! Exit codes: 0 on clean shutdown, non-zero on initialization failure (§6).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use overseer_config::OverseerConfig;
use overseer_controller::Controller;
use overseer_scheduler::SchedulerHandle;

#[derive(Parser)]
#[command(name = "overseerd", version, about = "Process supervision and control service")]
struct Cli {
    /// Path to the YAML configuration file. Falls back to the
    /// `OVERSEER_CONFIG` environment variable, then errors if neither is set.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = match cli.config.or_else(|| std::env::var_os("OVERSEER_CONFIG").map(PathBuf::from)) {
        Some(path) => path,
        None => {
            eprintln!("overseerd: no configuration given (--config or OVERSEER_CONFIG)");
            return ExitCode::FAILURE;
        }
    };

    let config = match OverseerConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("overseerd: failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let logger_filter: String = config.get_or("run.logger", "info".to_string());
    overseer_observability::init_tracing(&logger_filter);

    let worker_threads: i64 = config.get_or("run.httpserver.workerthreads", 4);
    let http_threads: i64 = config.get_or("run.httpserver.httpthreads", 2);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(http_threads.max(1) as usize)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("overseerd: failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config, worker_threads.max(1) as usize)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "overseerd failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: OverseerConfig, max_worker_threads: usize) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = SchedulerHandle::start(1, max_worker_threads);
    let controller = Controller::from_config(&config, scheduler)?;

    let connection_limit: i64 = config.get_or("run.httpserver.connectionlimit", 256);
    let router = overseer_server::build_router(controller, connection_limit.max(1) as usize);

    let host: String = config.get_or("run.httpserver.host", "0.0.0.0".to_string());
    let port: i64 = config.get_or("run.httpserver.port", 8080);

    overseer_server::serve(&host, port as u16, router).await?;
    Ok(())
}
