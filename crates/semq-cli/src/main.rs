//! semq - Interactive semantic query console
//!
//! Issues embedding-based nearest-neighbor queries against a persisted
//! vector collection and reports, per query, the retrieved results and
//! the resource cost of retrieving them.

mod console;
mod report;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use semq_core::{AppConfig, LoggingConfig};
use semq_metrics::{ResourceSampler, TracingAllocator};
use semq_vector::{OllamaEmbedder, QdrantStore};

use console::QueryConsole;

// Counting allocator: lets the sampler attribute heap usage to a
// measured retrieval span instead of reading process-wide RSS.
#[global_allocator]
static ALLOC: TracingAllocator = TracingAllocator;

#[derive(Parser)]
#[command(name = "semq")]
#[command(about = "Interactive semantic nearest-neighbor query console")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

// Current-thread runtime: the loop is single-threaded by design, and a
// worker pool would smear unrelated CPU time into the measurement
// window.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    // Third-party client verbosity is part of the configured filter,
    // not a global log-level mutation after the fact.
    let (filter, warning) = build_env_filter(&config.logging);
    if let Some(warning) = warning {
        eprintln!("{warning}");
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let embedder = Arc::new(OllamaEmbedder::from_config(&config.embedding)?);

    let store = QdrantStore::connect(&config.store)?;
    store.check_ready().await?;

    let mut console = QueryConsole::new(
        embedder,
        Arc::new(store),
        ResourceSampler::host(),
        std::io::stdin().lock(),
        std::io::stdout(),
    );
    console.run().await?;

    Ok(())
}

/// Build the subscriber filter from configuration. A malformed
/// directive string falls back to `info`, with a user-visible warning
/// rather than a silent swallow.
fn build_env_filter(logging: &LoggingConfig) -> (EnvFilter, Option<String>) {
    let directives = logging.directives();
    match EnvFilter::try_new(&directives) {
        Ok(filter) => (filter, None),
        Err(e) => (
            EnvFilter::new("info"),
            Some(format!(
                "Invalid log filter '{directives}' ({e}); falling back to 'info'"
            )),
        ),
    }
}
