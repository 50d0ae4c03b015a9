//! parkwatch binary.
//!
//! Reads `parkwatch.toml` (or the path given with `--config`), opens the
//! SQLite store and runs one command against it. Typical use:
//!
//! ```text
//! parkwatch bootstrap   # once, loads catalogo.csv
//! parkwatch ingest      # any number of times, catches up on new snapshots
//! parkwatch latest      # current free spaces per facility, as JSON
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use parkwatch_core::{
  Timestamp,
  store::{ObservationQuery, ParkingStore},
  summary::summarize,
};
use parkwatch_ingest::{IngestConfig, Ingestor, catalog};
use parkwatch_store_sqlite::SqliteStore;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Parking occupancy history ingester")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "parkwatch.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the database schema and exit.
  Init,
  /// Load the facility catalog. Fails if facilities already exist.
  Bootstrap,
  /// Ingest every snapshot newer than the latest stored observation.
  Ingest,
  /// Print all facilities.
  Facilities,
  /// Print observations joined with facility data.
  Query(WindowArgs),
  /// Print the most recent observation of each facility.
  Latest,
  /// Print per-facility occupancy statistics.
  Summary(WindowArgs),
}

#[derive(clap::Args)]
struct WindowArgs {
  /// Restrict to one facility id.
  #[arg(long)]
  facility: Option<String>,
  /// Inclusive lower bound, `YYYY-MM-DD HH:MM[:SS]`.
  #[arg(long)]
  from: Option<Timestamp>,
  /// Inclusive upper bound, `YYYY-MM-DD HH:MM[:SS]`.
  #[arg(long)]
  to: Option<Timestamp>,
}

impl From<WindowArgs> for ObservationQuery {
  fn from(args: WindowArgs) -> Self {
    Self { facility_id: args.facility, from: args.from, to: args.to }
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let config = IngestConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  // Open SQLite store. Failure here is fatal before any file is touched.
  let store = SqliteStore::open(&config.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", config.store_path))?;

  match cli.command {
    Command::Init => {
      tracing::info!(store = %config.store_path.display(), "schema ready");
    }
    Command::Bootstrap => {
      let written = catalog::bootstrap(&store, &config.catalog_path, &config.capacity_overrides)
        .await
        .context("facility bootstrap failed")?;
      println!("{written} facilities loaded");
    }
    Command::Ingest => {
      let report = Ingestor::new(store, &config.data_root)
        .run()
        .await
        .context("ingestion aborted")?;
      print_json(&report)?;
    }
    Command::Facilities => {
      print_json(&store.list_facilities().await?)?;
    }
    Command::Query(window) => {
      let rows = store.query_observations(&ObservationQuery::from(window)).await?;
      print_json(&rows)?;
    }
    Command::Latest => {
      print_json(&store.latest_observations().await?)?;
    }
    Command::Summary(window) => {
      let rows = store.query_observations(&ObservationQuery::from(window)).await?;
      print_json(&summarize(&rows))?;
    }
  }

  Ok(())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
