//! Error type for `parkwatch-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] parkwatch_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A facility with this id is already present. The catalog is loaded once;
  /// a second bootstrap against a populated store ends here.
  #[error("duplicate facility id: {0}")]
  DuplicateKey(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
