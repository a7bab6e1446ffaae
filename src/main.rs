//! Mocknest - CLI entry point.

use anyhow::Result;
use clap::Parser;
use mocknest::dispatcher::Dispatcher;
use mocknest::history::CallHistory;
use mocknest::index::RuntimeIndex;
use mocknest::loader::{self, LoadSummary};
use mocknest::registry::MappingRegistry;
use mocknest::server::{AppState, MockServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mocknest",
    about = "HTTP mock server - declarative request stubbing with best-match selection",
    version
)]
struct Args {
    /// Directory containing mapping files (.json, .yaml, .yml)
    #[arg(short, long, default_value = "mocks")]
    mappings: PathBuf,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Validate mapping files and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let index = Arc::new(RuntimeIndex::new());
    let registry = Arc::new(MappingRegistry::new());
    let history = Arc::new(CallHistory::new());

    let summary = if args.mappings.is_dir() {
        info!(dir = %args.mappings.display(), "loading mappings");
        loader::load_dir(&args.mappings, &index, &registry)?
    } else if args.validate {
        anyhow::bail!("mappings directory not found: {}", args.mappings.display());
    } else {
        info!(
            dir = %args.mappings.display(),
            "mappings directory not found, starting with no stubs"
        );
        LoadSummary::default()
    };

    if args.validate {
        println!(
            "Mappings are valid ({} loaded, {} skipped)",
            summary.loaded, summary.skipped
        );
        return Ok(());
    }

    info!(
        loaded = summary.loaded,
        skipped = summary.skipped,
        indexed = index.count(),
        "startup load complete"
    );

    let dispatcher = Dispatcher::new(Arc::clone(&index), Arc::clone(&history));
    let state = Arc::new(AppState {
        dispatcher,
        index,
        registry,
        history,
        mappings_dir: args.mappings,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    MockServer::new(addr, state).run().await
}
