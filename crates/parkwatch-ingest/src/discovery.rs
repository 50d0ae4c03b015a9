//! Snapshot discovery: walk the dated data tree and decode each snapshot's
//! instant from its location.
//!
//! The layout is `root/YYYY/MM/DD/parking-data-HH_MM.csv`. The instant a
//! snapshot represents comes from the three innermost directories and the
//! filename suffix; the file contents are never consulted.

use std::path::{Path, PathBuf};

use parkwatch_core::Timestamp;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Error, Result};

const SNAPSHOT_PREFIX: &str = "parking-data";
const SNAPSHOT_EXTENSION: &str = ".csv";

/// Why a path was not accepted as a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotASnapshot {
  #[error("file name does not match `parking-data*.csv`")]
  FileName,
  #[error("file name has no `HH_MM` time suffix")]
  TimeSuffix,
  #[error("parent directories are not `YYYY/MM/DD`")]
  DateDirectories,
  #[error("date or time out of range")]
  OutOfRange,
}

/// A snapshot file eligible for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
  pub path:      PathBuf,
  pub timestamp: Timestamp,
}

/// Result of one walk over the data tree.
#[derive(Debug, Default)]
pub struct Discovery {
  /// Snapshots strictly after the watermark, in chronological order.
  pub eligible:         Vec<SnapshotFile>,
  /// Snapshots at or before the watermark; never opened.
  pub behind_watermark: usize,
  /// Files that are not snapshots.
  pub ignored:          usize,
}

// ─── Path decoding ───────────────────────────────────────────────────────────

/// Decode the instant a snapshot represents from its path.
///
/// Strict: every component must be present and numeric, the year must have
/// four digits and the resulting date and time must exist.
pub fn parse_snapshot_path(path: &Path) -> Result<Timestamp, NotASnapshot> {
  let file_name = path
    .file_name()
    .and_then(|n| n.to_str())
    .ok_or(NotASnapshot::FileName)?;
  if !file_name.starts_with(SNAPSHOT_PREFIX) {
    return Err(NotASnapshot::FileName);
  }
  let stem = file_name
    .strip_suffix(SNAPSHOT_EXTENSION)
    .ok_or(NotASnapshot::FileName)?;

  let suffix = stem.rsplit('-').next().ok_or(NotASnapshot::TimeSuffix)?;
  let (hour, minute) = suffix.split_once('_').ok_or(NotASnapshot::TimeSuffix)?;
  let hour = digits(hour, 1..=2).ok_or(NotASnapshot::TimeSuffix)?;
  let minute = digits(minute, 1..=2).ok_or(NotASnapshot::TimeSuffix)?;

  let mut dirs = path
    .parent()
    .into_iter()
    .flat_map(|p| p.iter().rev())
    .map(|c| c.to_str());
  let mut next_dir = |len| {
    dirs
      .next()
      .flatten()
      .and_then(|s| digits(s, len))
      .ok_or(NotASnapshot::DateDirectories)
  };
  let day = next_dir(1..=2)?;
  let month = next_dir(1..=2)?;
  let year = next_dir(4..=4)?;

  let year = i32::try_from(year).map_err(|_| NotASnapshot::OutOfRange)?;
  Timestamp::from_parts(year, month, day, hour, minute).ok_or(NotASnapshot::OutOfRange)
}

/// Parse `s` as an unsigned number whose digit count lies in `len`.
fn digits(s: &str, len: std::ops::RangeInclusive<usize>) -> Option<u32> {
  if !len.contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}

// ─── Traversal ───────────────────────────────────────────────────────────────

/// Walk `root` and collect snapshots newer than `watermark`, sorted by
/// timestamp (then path). An unreadable root is an error; unreadable
/// subdirectories are logged and skipped.
pub fn discover(root: &Path, watermark: Option<Timestamp>) -> Result<Discovery> {
  let mut discovery = Discovery::default();

  let root_entries = std::fs::read_dir(root).map_err(|source| Error::Io {
    path: root.to_path_buf(),
    source,
  })?;

  let mut pending = vec![root_entries];
  while let Some(entries) = pending.pop() {
    for entry in entries {
      let entry = match entry {
        Ok(e) => e,
        Err(e) => {
          warn!(error = %e, "skipping unreadable directory entry");
          continue;
        }
      };
      let path = entry.path();
      let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

      if is_dir {
        match std::fs::read_dir(&path) {
          Ok(sub) => pending.push(sub),
          Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable directory"),
        }
        continue;
      }

      match parse_snapshot_path(&path) {
        Ok(timestamp) if timestamp.is_after(watermark) => {
          discovery.eligible.push(SnapshotFile { path, timestamp });
        }
        Ok(_) => discovery.behind_watermark += 1,
        Err(reason) => {
          debug!(path = %path.display(), %reason, "ignoring file");
          discovery.ignored += 1;
        }
      }
    }
  }

  discovery
    .eligible
    .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.path.cmp(&b.path)));
  Ok(discovery)
}
