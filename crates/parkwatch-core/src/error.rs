//! Error types for `parkwatch-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
