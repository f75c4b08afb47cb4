//! TyrantKV Mock Server Binary
//!
//! Runs the in-memory mock server until the process is killed.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use tyrantkv::mock::MockServer;

/// TyrantKV Mock Server
#[derive(Parser, Debug)]
#[command(name = "tyrantkv-mock")]
#[command(about = "In-memory server speaking the Tokyo Tyrant binary protocol")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:1978")]
    listen: String,

    /// Close client sessions idle for this many milliseconds (0 = never)
    #[arg(short, long, default_value = "0")]
    idle_timeout_ms: u64,

    /// Register the built-in `echo` extension (returns key + value)
    #[arg(long)]
    echo_extension: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tyrantkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("TyrantKV mock server v{}", tyrantkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let mut builder = MockServer::builder()
        .listen_addr(&args.listen)
        .idle_timeout_ms(args.idle_timeout_ms);

    if args.echo_extension {
        builder = builder.extension("echo", |key, value| {
            let mut result = key.to_vec();
            result.extend_from_slice(value);
            Some(result)
        });
    }

    let server = match builder.start() {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    server.wait();
    tracing::info!("Server stopped");
}
