//! Incremental ingestion of historical parking snapshots.
//!
//! Walks a `YYYY/MM/DD/parking-data-HH_MM.csv` tree, reconciles each snapshot
//! against the facility catalog and appends the readings to any
//! [`ParkingStore`](parkwatch_core::store::ParkingStore).

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod reconcile;
pub mod snapshot;

pub use config::IngestConfig;
pub use error::{Error, Result, SnapshotError};
pub use pipeline::{IngestReport, Ingestor};
