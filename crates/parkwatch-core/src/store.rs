//! The `ParkingStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `parkwatch-store-sqlite`). The ingestion pipeline depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  Timestamp,
  facility::Facility,
  observation::{Observation, OccupancyRow},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ParkingStore::query_observations`].
///
/// Both bounds are inclusive; an absent field does not filter.
#[derive(Debug, Clone, Default)]
pub struct ObservationQuery {
  pub facility_id: Option<String>,
  pub from:        Option<Timestamp>,
  pub to:          Option<Timestamp>,
}

impl ObservationQuery {
  pub fn for_facility(facility_id: impl Into<String>) -> Self {
    Self { facility_id: Some(facility_id.into()), ..Self::default() }
  }

  pub fn between(mut self, from: Timestamp, to: Timestamp) -> Self {
    self.from = Some(from);
    self.to = Some(to);
    self
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a parking occupancy store backend.
///
/// Facilities are written once at bootstrap. Observations are append-only.
pub trait ParkingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Facilities ────────────────────────────────────────────────────────

  /// Insert the whole catalog in one transaction. Fails without writing
  /// anything if any facility id already exists.
  fn add_facilities(
    &self,
    facilities: Vec<Facility>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// All facilities, ordered by id.
  fn list_facilities(
    &self,
  ) -> impl Future<Output = Result<Vec<Facility>, Self::Error>> + Send + '_;

  // ── Observations (append-only) ──────────────────────────────────────

  /// Append one snapshot's observations atomically: either all of them are
  /// committed or none are. Returns the number of rows actually written;
  /// an observation already present for the same facility and timestamp
  /// is skipped.
  fn append_observations(
    &self,
    batch: Vec<Observation>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// The highest timestamp stored so far, or `None` on an empty store.
  fn latest_observation_timestamp(
    &self,
  ) -> impl Future<Output = Result<Option<Timestamp>, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Observations joined with facility name and capacity, ordered by
  /// timestamp then facility id.
  fn query_observations<'a>(
    &'a self,
    query: &'a ObservationQuery,
  ) -> impl Future<Output = Result<Vec<OccupancyRow>, Self::Error>> + Send + 'a;

  /// For every facility with at least one observation, only the most
  /// recent one.
  fn latest_observations(
    &self,
  ) -> impl Future<Output = Result<Vec<OccupancyRow>, Self::Error>> + Send + '_;
}
