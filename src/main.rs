//! Hit counter web service entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};

use hit_counter::api::{create_router, AppState, RouterOptions};
use hit_counter::config::{Config, ResponseKind};
use hit_counter::counter::render_greeting;
use hit_counter::launch::LaunchConfig;
use hit_counter::logging;
use hit_counter::metrics;
use hit_counter::store::RedisConnector;
use hit_counter::utils::shutdown_signal;

/// Hit counter web service.
#[derive(Parser, Debug)]
#[command(name = "hit-counter")]
#[command(about = "Counts visits in a key-value store and reports them over HTTP")]
#[command(version)]
struct Args {
    /// Enable verbose logging. Takes precedence over RUST_LOG.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve HTTP (default).
    Serve {
        /// Listen address, overrides LAUNCH_BIND.
        #[arg(short, long)]
        bind: Option<String>,

        /// Worker threads, overrides LAUNCH_WORKERS.
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Print the effective launch settings as JSON.
    LaunchConfig,

    /// Record one hit against the configured store and print the greeting.
    Hit,
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    match args.command {
        Some(Command::Serve { bind, workers }) => cmd_serve(bind, workers, args.verbose),
        Some(Command::CheckConfig) => {
            logging::init_cli_logging(args.verbose);
            cmd_check_config()
        }
        Some(Command::LaunchConfig) => {
            logging::init_cli_logging(args.verbose);
            cmd_launch_config()
        }
        Some(Command::Hit) => {
            logging::init_cli_logging(args.verbose);
            cmd_hit()
        }
        None => cmd_serve(None, None, args.verbose),
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("HIT COUNTER - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading launch settings... ");
    let launch = match LaunchConfig::load() {
        Ok(l) => {
            println!("OK");
            l
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Launch settings load failed"));
        }
    };

    print!("Validating launch settings... ");
    if let Err(e) = launch.validate() {
        println!("FAILED");
        println!("  Error: {}", e);
        return Err(anyhow::anyhow!("Launch settings validation failed"));
    }
    println!("OK");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    if let Err(e) = config.validate() {
        println!("FAILED");
        println!("  Error: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed"));
    }
    println!("OK");

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Bind: {}", launch.bind);
    println!("  Workers: {}", launch.workers);
    println!("  Timeout: {}s", launch.timeout);
    println!("  Keep-Alive: {}s", launch.keepalive);
    println!("  Log Level: {}", launch.loglevel);
    println!("  Error Log: {}", launch.errorlog);
    println!("  Access Log: {}", launch.accesslog);
    println!("  Store Settings: {}", config.settings_source().describe());
    println!("  Counter Key: {}", config.counter_key);
    println!("  Counter Mode: {}", config.counter_mode);
    println!("  Response Mode: {}", config.response_mode);
    if config.response_mode == ResponseKind::MessageFile {
        println!("  Message File: {}", config.message_file.display());
    }
    match config.metrics_port {
        Some(port) => println!("  Metrics Port: {}", port),
        None => println!("  Metrics: Disabled"),
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print the effective launch settings.
fn cmd_launch_config() -> anyhow::Result<()> {
    let launch = LaunchConfig::load()?;
    launch.validate().map_err(|e| anyhow::anyhow!(e))?;
    println!("{}", serde_json::to_string_pretty(&launch)?);
    Ok(())
}

/// Record a single hit outside the server.
fn cmd_hit() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let state = AppState::from_config(&config, RedisConnector::new());
    let count = runtime.block_on(state.counter.record_hit())?;
    println!("{}", render_greeting(count));
    Ok(())
}

/// Run the HTTP server with the launch settings applied.
fn cmd_serve(bind: Option<String>, workers: Option<usize>, verbose: bool) -> anyhow::Result<()> {
    let mut launch = LaunchConfig::load()?;

    // Override with CLI args if provided
    if let Some(bind) = bind {
        launch.bind = bind;
    }
    if let Some(workers) = workers {
        launch.workers = workers;
    }

    launch
        .validate()
        .map_err(|e| anyhow::anyhow!("Launch settings validation failed: {}", e))?;

    // Held until exit so buffered log lines are flushed.
    let _log_guards = logging::init_service_logging(&launch, verbose)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(launch.workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(launch))
}

async fn serve(launch: LaunchConfig) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    if let Some(port) = config.metrics_port {
        metrics::install_exporter(port)?;
    }
    metrics::init_metrics();

    let addr: SocketAddr = launch.bind_addr().map_err(|e| anyhow::anyhow!(e))?;

    info!("========================================");
    info!("HIT COUNTER STARTED");
    info!("========================================");
    info!("Workers: {}", launch.workers);
    info!("Store settings: {}", config.settings_source().describe());
    info!("Counter: {} ({})", config.counter_key, config.counter_mode);
    info!("Response: {}", config.response_mode);
    info!("========================================");

    let state = AppState::from_config(&config, RedisConnector::new());
    let router = create_router(state, RouterOptions::from(&launch));

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
