//! Snapshot schema classification.
//!
//! Two column layouts exist in the historical archive. Older snapshots carry
//! a proprietary point-of-interest id (`poiID`) and identify facilities only
//! by address; newer ones carry the catalog `id`.

use crate::snapshot::Snapshot;

/// Proprietary point-of-interest column; its presence marks the legacy layout.
pub const COL_POI_ID: &str = "poiID";
pub const COL_ID: &str = "id";
pub const COL_ADDRESS: &str = "direccion";
pub const COL_FREE_SPACES: &str = "libres";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  /// Matched to facilities by exact address.
  Legacy,
  /// Matched to facilities by catalog id.
  Modern,
}

/// Pick the layout from the column set alone.
pub fn classify(snapshot: &Snapshot) -> Layout {
  if snapshot.has_column(COL_POI_ID) {
    Layout::Legacy
  } else {
    Layout::Modern
  }
}
