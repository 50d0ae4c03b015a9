//! Loading one snapshot CSV into memory.

use std::{io::Read, path::Path};

use csv::StringRecord;

use crate::error::SnapshotError;

/// The raw contents of one snapshot file.
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub headers: StringRecord,
  pub rows:    Vec<StringRecord>,
}

impl Snapshot {
  /// Index of the column named `name`, if present.
  pub fn column(&self, name: &str) -> Option<usize> {
    self.headers.iter().position(|h| h.trim() == name)
  }

  pub fn has_column(&self, name: &str) -> bool { self.column(name).is_some() }
}

/// Read the snapshot at `path`.
pub fn read_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
  let file = std::fs::File::open(path)?;
  parse_snapshot(file)
}

/// Parse snapshot CSV from any reader. A file without even a header line is
/// [`SnapshotError::Empty`]; a header with no rows is a valid, empty
/// snapshot. Any unparseable record rejects the whole file.
pub fn parse_snapshot<R: Read>(reader: R) -> Result<Snapshot, SnapshotError> {
  let mut reader = csv::ReaderBuilder::new().from_reader(reader);

  let headers = reader.headers()?.clone();
  if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
    return Err(SnapshotError::Empty);
  }

  let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
  Ok(Snapshot { headers, rows })
}
