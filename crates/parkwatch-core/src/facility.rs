//! Facility: the parking structure dimension.
//!
//! Facilities are loaded once from the reference catalog and never mutated
//! afterwards. Observations reference them by `id`.

use serde::{Deserialize, Serialize};

/// A parking facility with its curated capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
  /// Stable identifier from the reference catalog.
  pub id:           String,
  pub name:         String,
  /// Street address exactly as written in the catalog. Legacy snapshots are
  /// matched against this string verbatim.
  pub address:      String,
  pub latitude:     f64,
  pub longitude:    f64,
  pub altitude:     f64,
  /// Curated capacity; may differ from the catalog's own figure.
  pub total_spaces: i64,
}
