//! Row reconciliation: resolve snapshot rows to known facilities.
//!
//! A [`Strategy`] is chosen once per file from its [`Layout`]. Every matched
//! row becomes an [`Observation`] stamped with the file's path-derived
//! timestamp; timestamps inside the CSV are ignored.

use std::collections::HashMap;

use parkwatch_core::{Timestamp, facility::Facility, observation::Observation};
use tracing::debug;

use crate::{
  error::SnapshotError,
  layout::{COL_ADDRESS, COL_FREE_SPACES, COL_ID, Layout},
  snapshot::Snapshot,
};

/// Lookup tables from matching key to facility id.
#[derive(Debug, Default)]
pub struct FacilityIndex {
  by_id:      HashMap<String, String>,
  by_address: HashMap<String, String>,
}

impl FacilityIndex {
  /// Build the index. When two facilities share an address the first one
  /// listed wins.
  pub fn new<'a>(facilities: impl IntoIterator<Item = &'a Facility>) -> Self {
    let mut index = Self::default();
    for f in facilities {
      index.by_id.entry(f.id.clone()).or_insert_with(|| f.id.clone());
      index
        .by_address
        .entry(f.address.clone())
        .or_insert_with(|| f.id.clone());
    }
    index
  }

  pub fn len(&self) -> usize { self.by_id.len() }

  pub fn is_empty(&self) -> bool { self.by_id.is_empty() }

  fn by_id(&self, id: &str) -> Option<&str> { self.by_id.get(id).map(String::as_str) }

  fn by_address(&self, address: &str) -> Option<&str> {
    self.by_address.get(address).map(String::as_str)
  }
}

/// How rows of one snapshot are matched, with column positions resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  ByAddress { address: usize, free_spaces: usize },
  ById { id: usize, free_spaces: usize },
}

/// Observations produced from one snapshot plus what was dropped.
#[derive(Debug, Default)]
pub struct Reconciled {
  pub observations: Vec<Observation>,
  /// Rows whose key matched no facility.
  pub unmatched:    usize,
  /// Matched rows whose free-space count is not an integer.
  pub invalid:      usize,
}

impl Strategy {
  /// Resolve the columns `layout` needs in `snapshot`.
  pub fn for_layout(layout: Layout, snapshot: &Snapshot) -> Result<Self, SnapshotError> {
    let column = |name: &'static str| {
      snapshot.column(name).ok_or(SnapshotError::MissingColumn(name))
    };
    Ok(match layout {
      Layout::Legacy => Self::ByAddress {
        address:     column(COL_ADDRESS)?,
        free_spaces: column(COL_FREE_SPACES)?,
      },
      Layout::Modern => Self::ById {
        id:          column(COL_ID)?,
        free_spaces: column(COL_FREE_SPACES)?,
      },
    })
  }

  /// Match every row against `index`, first match wins.
  pub fn reconcile(
    &self,
    snapshot: &Snapshot,
    index: &FacilityIndex,
    timestamp: Timestamp,
  ) -> Reconciled {
    let mut out = Reconciled::default();

    for row in &snapshot.rows {
      let (key, facility_id, free_col) = match *self {
        Self::ByAddress { address, free_spaces } => {
          let key = row.get(address).unwrap_or_default();
          (key, index.by_address(key), free_spaces)
        }
        Self::ById { id, free_spaces } => {
          let key = row.get(id).unwrap_or_default();
          (key, index.by_id(key), free_spaces)
        }
      };

      let Some(facility_id) = facility_id else {
        debug!(key, %timestamp, "dropping row with no matching facility");
        out.unmatched += 1;
        continue;
      };

      let raw_free = row.get(free_col).unwrap_or_default().trim();
      let Ok(free_spaces) = raw_free.parse::<i64>() else {
        debug!(facility_id, value = raw_free, %timestamp, "dropping row with invalid free-space count");
        out.invalid += 1;
        continue;
      };

      out.observations.push(Observation {
        facility_id: facility_id.to_owned(),
        timestamp,
        free_spaces,
      });
    }

    out
  }
}
