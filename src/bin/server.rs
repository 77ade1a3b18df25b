//! logkv Server Binary
//!
//! Serves a data directory over TCP.

use std::sync::Arc;

use clap::Parser;
use logkv::network::Server;
use logkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// logkv Server
#[derive(Parser, Debug)]
#[command(name = "logkv-server")]
#[command(about = "Log-structured key-value store with hash index and compaction")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./logkv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7379")]
    listen: String,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Rotate datafiles past this many KB
    #[arg(short = 't', long, default_value = "4096")]
    threshold_kb: u64,

    /// Record separator
    #[arg(short, long, default_value = ",")]
    separator: char,

    /// Compact automatically at this stale-byte ratio (0 < r <= 1)
    #[arg(long)]
    merge_ratio: Option<f64>,

    /// Delete all existing datafiles before serving
    #[arg(long)]
    clear: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,logkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("logkv Server v{}", logkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let mut builder = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .worker_threads(args.workers)
        .size_threshold(args.threshold_kb * 1024)
        .separator(args.separator);
    if let Some(ratio) = args.merge_ratio {
        builder = builder.merge_waste_ratio(ratio);
    }
    let config = builder.build();

    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    if args.clear {
        if let Err(e) = engine.clear() {
            tracing::error!("Failed to clear data directory: {}", e);
            std::process::exit(1);
        }
    }

    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
