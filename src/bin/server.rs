//! lindaspace Server Binary
//!
//! Starts the TCP server for a tuple space.

use clap::Parser;
use lindaspace::network::Server;
use lindaspace::{Config, TupleSpace};
use tracing_subscriber::{fmt, EnvFilter};

/// lindaspace Server
#[derive(Parser, Debug)]
#[command(name = "lindaspace-server")]
#[command(about = "Linda tuple space server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Seed for choosing among multiple matching tuples (random if unset)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Idle read timeout per connection in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lindaspace=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("lindaspace Server v{}", lindaspace::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let mut builder = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms);
    if let Some(seed) = args.seed {
        tracing::info!("Match selection seed: {}", seed);
        builder = builder.rng_seed(seed);
    }
    let config = builder.build();

    let space = TupleSpace::with_config(&config);

    let server = match Server::bind(config, space) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
