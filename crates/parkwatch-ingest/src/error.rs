//! Error types for the ingestion pipeline.
//!
//! [`Error`] covers conditions that stop a command. Per-file problems are
//! [`SnapshotError`]s: the pipeline logs them and moves on to the next file.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("config error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("missing setting: {0}")]
  MissingSetting(&'static str),

  #[error("cannot read {}: {source}", .path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("catalog is missing column {0:?}")]
  MissingColumn(&'static str),

  #[error("catalog line {line}: invalid value {value:?} in column {column:?}")]
  InvalidField {
    line:   u64,
    column: &'static str,
    value:  String,
  },

  #[error("catalog has {catalog_rows} rows but {overrides} capacity overrides")]
  CapacityMismatch {
    catalog_rows: usize,
    overrides:    usize,
  },

  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

/// A snapshot file that cannot be ingested. Recoverable: the file is skipped.
#[derive(Debug, Error)]
pub enum SnapshotError {
  #[error("unreadable: {0}")]
  Io(#[from] std::io::Error),

  #[error("no data")]
  Empty,

  #[error("malformed csv: {0}")]
  Malformed(#[from] csv::Error),

  #[error("missing column {0:?}")]
  MissingColumn(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
