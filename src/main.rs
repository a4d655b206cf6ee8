//! # Shortlist CLI (`shortlist`)
//!
//! Ranks the passages of one document collection and writes the result
//! document next to the request.
//!
//! ## Usage
//!
//! ```bash
//! shortlist <COLLECTION_DIR> [--config FILE] [--progress auto|off|human|json]
//! ```
//!
//! The collection directory holds `challenge1b_input.json` and a `PDFs/`
//! directory; the result is written to `challenge1b_output.json`. File and
//! directory names can be changed in the `[extraction]` config section.
//!
//! ## Examples
//!
//! ```bash
//! # Built-in taxonomies, local embeddings, fallback labels
//! shortlist ./Collection1
//!
//! # Custom config, machine-readable progress
//! shortlist ./Collection2 --config ./config/shortlist.toml --progress json
//!
//! # Verbose diagnostics
//! RUST_LOG=shortlist=debug shortlist ./Collection3
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use shortlist::config;
use shortlist::progress::{ProgressMode, ProgressReporter};
use shortlist::run::run_collection;

/// Shortlist: pick the most relevant passage per category from a document
/// collection.
#[derive(Parser)]
#[command(
    name = "shortlist",
    about = "Shortlist: category-aware passage ranking for document collections",
    version
)]
struct Cli {
    /// Collection directory containing the request document and sources.
    collection_dir: PathBuf,

    /// Path to a configuration file (TOML).
    ///
    /// Defaults to `<COLLECTION_DIR>/shortlist.toml` when that file exists,
    /// otherwise built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Progress output on stderr.
    #[arg(long, value_enum, default_value_t = ProgressArg::Auto)]
    progress: ProgressArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProgressArg {
    /// Human progress when stderr is a terminal, otherwise off.
    Auto,
    Off,
    Human,
    Json,
}

impl ProgressArg {
    fn mode(self) -> ProgressMode {
        match self {
            ProgressArg::Auto => ProgressMode::default_for_tty(),
            ProgressArg::Off => ProgressMode::Off,
            ProgressArg::Human => ProgressMode::Human,
            ProgressArg::Json => ProgressMode::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = config::resolve_config_path(cli.config.as_deref(), &cli.collection_dir);
    let cfg = config::load_or_default(config_path.as_deref())?;
    if let Some(path) = &config_path {
        tracing::info!(config = %path.display(), "loaded configuration");
    }

    let progress: Arc<dyn ProgressReporter> = Arc::from(cli.progress.mode().reporter());
    let output = run_collection(&cfg, &cli.collection_dir, progress).await?;
    println!("Done. Output saved to {}", output.display());
    Ok(())
}
