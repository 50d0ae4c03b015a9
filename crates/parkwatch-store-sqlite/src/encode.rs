//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored in their canonical `YYYY-MM-DD HH:MM:SS` form so
//! that `MAX()` and range comparisons work on the raw text.

use parkwatch_core::{Timestamp, observation::OccupancyRow};

use crate::Result;

pub fn encode_ts(ts: Timestamp) -> String { ts.to_string() }

pub fn decode_ts(s: &str) -> Result<Timestamp> { Ok(s.parse()?) }

/// Raw values read directly from an `observations` row joined with
/// `facilities`.
pub struct RawOccupancyRow {
  pub facility_id:   String,
  pub facility_name: String,
  pub timestamp:     String,
  pub free_spaces:   i64,
  pub total_spaces:  i64,
}

impl RawOccupancyRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      facility_id:   row.get(0)?,
      facility_name: row.get(1)?,
      timestamp:     row.get(2)?,
      free_spaces:   row.get(3)?,
      total_spaces:  row.get(4)?,
    })
  }

  pub fn into_row(self) -> Result<OccupancyRow> {
    Ok(OccupancyRow {
      facility_id:   self.facility_id,
      facility_name: self.facility_name,
      timestamp:     decode_ts(&self.timestamp)?,
      free_spaces:   self.free_spaces,
      total_spaces:  self.total_spaces,
    })
  }
}
