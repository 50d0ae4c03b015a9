//! Core types and trait definitions for the parkwatch occupancy store.
//!
//! This crate is free of database and filesystem dependencies. The SQLite
//! backend and the ingestion pipeline both depend on it.

pub mod error;
pub mod facility;
pub mod observation;
pub mod store;
pub mod summary;
pub mod timestamp;

pub use error::{Error, Result};
pub use timestamp::Timestamp;
