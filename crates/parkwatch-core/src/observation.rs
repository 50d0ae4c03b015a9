//! Observations and the joined read model returned by queries.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// One free-space reading for one facility at one instant.
///
/// Observations are append-only: they are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
  pub facility_id: String,
  /// Derived from the snapshot's location in the data tree, never from the
  /// file contents.
  pub timestamp:   Timestamp,
  pub free_spaces: i64,
}

/// An observation joined with its facility's name and capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRow {
  pub facility_id:   String,
  pub facility_name: String,
  pub timestamp:     Timestamp,
  pub free_spaces:   i64,
  pub total_spaces:  i64,
}

impl OccupancyRow {
  pub fn occupied_spaces(&self) -> i64 { self.total_spaces - self.free_spaces }

  /// Occupied share of capacity as a whole percentage (integer division).
  /// `None` when the facility has no recorded capacity.
  pub fn occupancy_percentage(&self) -> Option<i64> {
    (self.total_spaces != 0)
      .then(|| self.occupied_spaces() * 100 / self.total_spaces)
  }
}
