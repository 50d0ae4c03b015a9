//! The incremental ingestion run.
//!
//! ```text
//! watermark ──► discover ──► for each file (oldest first):
//!                              read ─► classify ─► reconcile ─► append (1 tx)
//! ```
//!
//! The watermark is read once at the start of a run. Files that cannot be
//! read or parsed are logged and skipped; a failing store write ends the run.

use std::path::PathBuf;

use parkwatch_core::{Timestamp, store::ParkingStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  discovery::{SnapshotFile, discover},
  error::SnapshotError,
  layout::classify,
  reconcile::{FacilityIndex, Reconciled, Strategy},
  snapshot::read_snapshot,
};

/// Counters describing one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
  pub watermark:            Option<Timestamp>,
  /// Snapshots newer than the watermark.
  pub discovered:           usize,
  /// Snapshots at or before the watermark, left unopened.
  pub behind_watermark:     usize,
  pub ingested_files:       usize,
  /// Unreadable, empty or malformed snapshots.
  pub skipped_files:        usize,
  pub observations_written: usize,
  pub rows_unmatched:       usize,
  pub rows_invalid:         usize,
}

/// Runs incremental ingestion of one snapshot tree into one store.
pub struct Ingestor<S> {
  store:     S,
  data_root: PathBuf,
}

impl<S: ParkingStore> Ingestor<S> {
  pub fn new(store: S, data_root: impl Into<PathBuf>) -> Self {
    Self { store, data_root: data_root.into() }
  }

  /// Ingest every snapshot newer than the stored watermark.
  pub async fn run(&self) -> Result<IngestReport> {
    let watermark = self
      .store
      .latest_observation_timestamp()
      .await
      .map_err(Error::store)?;

    let facilities = self.store.list_facilities().await.map_err(Error::store)?;
    let index = FacilityIndex::new(&facilities);
    if index.is_empty() {
      warn!("facility catalog is empty; every row will be dropped (run `bootstrap` first)");
    }

    let root = self.data_root.clone();
    let discovery = tokio::task::spawn_blocking(move || discover(&root, watermark)).await??;

    let mut report = IngestReport {
      watermark,
      discovered: discovery.eligible.len(),
      behind_watermark: discovery.behind_watermark,
      ..IngestReport::default()
    };
    info!(
      watermark = ?watermark.map(|w| w.to_string()),
      eligible = report.discovered,
      behind_watermark = report.behind_watermark,
      ignored = discovery.ignored,
      "starting ingestion"
    );

    for file in discovery.eligible {
      let reconciled = match self.prepare(&file, &index).await? {
        Ok(r) => r,
        Err(e) => {
          warn!(path = %file.path.display(), error = %e, "skipping snapshot");
          report.skipped_files += 1;
          continue;
        }
      };

      report.rows_unmatched += reconciled.unmatched;
      report.rows_invalid += reconciled.invalid;

      let written = self
        .store
        .append_observations(reconciled.observations)
        .await
        .map_err(Error::store)?;

      debug!(
        path = %file.path.display(),
        timestamp = %file.timestamp,
        written,
        unmatched = reconciled.unmatched,
        "snapshot ingested"
      );
      report.ingested_files += 1;
      report.observations_written += written;
    }

    info!(
      files = report.ingested_files,
      skipped = report.skipped_files,
      observations = report.observations_written,
      unmatched = report.rows_unmatched,
      invalid = report.rows_invalid,
      "ingestion finished"
    );
    Ok(report)
  }

  /// Read, classify and reconcile one file. The outer error is a runtime
  /// failure; the inner one means this file should be skipped.
  async fn prepare(
    &self,
    file: &SnapshotFile,
    index: &FacilityIndex,
  ) -> Result<Result<Reconciled, SnapshotError>> {
    let path = file.path.clone();
    let snapshot = match tokio::task::spawn_blocking(move || read_snapshot(&path)).await? {
      Ok(s) => s,
      Err(e) => return Ok(Err(e)),
    };

    let layout = classify(&snapshot);
    debug!(path = %file.path.display(), ?layout, rows = snapshot.rows.len(), "classified snapshot");

    Ok(
      Strategy::for_layout(layout, &snapshot)
        .map(|strategy| strategy.reconcile(&snapshot, index, file.timestamp)),
    )
  }
}
