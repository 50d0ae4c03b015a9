//! [`SqliteStore`], the SQLite implementation of [`ParkingStore`].

use std::path::Path;

use parkwatch_core::{
  Timestamp,
  facility::Facility,
  observation::{Observation, OccupancyRow},
  store::{ObservationQuery, ParkingStore},
};

use crate::{
  Error, Result,
  encode::{RawOccupancyRow, decode_ts, encode_ts},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A parking occupancy store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn occupancy_rows(
    &self,
    sql: &'static str,
    params: Vec<Option<String>>,
  ) -> Result<Vec<OccupancyRow>> {
    let raws: Vec<RawOccupancyRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawOccupancyRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOccupancyRow::into_row).collect()
  }
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

// ─── ParkingStore impl ───────────────────────────────────────────────────────

impl ParkingStore for SqliteStore {
  type Error = Error;

  // ── Facilities ────────────────────────────────────────────────────────────

  async fn add_facilities(&self, facilities: Vec<Facility>) -> Result<usize> {
    // `Err(id)` carries the colliding facility id out of the closure; the
    // transaction is dropped uncommitted in that case.
    let outcome: std::result::Result<usize, String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO facilities (
               id, name, address, latitude, longitude, altitude, total_spaces
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for f in &facilities {
            let inserted = stmt.execute(rusqlite::params![
              f.id,
              f.name,
              f.address,
              f.latitude,
              f.longitude,
              f.altitude,
              f.total_spaces,
            ]);
            match inserted {
              Ok(_) => {}
              Err(e) if is_primary_key_violation(&e) => return Ok(Err(f.id.clone())),
              Err(e) => return Err(e.into()),
            }
          }
        }
        tx.commit()?;
        Ok(Ok(facilities.len()))
      })
      .await?;

    outcome.map_err(Error::DuplicateKey)
  }

  async fn list_facilities(&self) -> Result<Vec<Facility>> {
    let facilities = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, name, address, latitude, longitude, altitude, total_spaces
           FROM facilities
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Facility {
              id:           row.get(0)?,
              name:         row.get(1)?,
              address:      row.get(2)?,
              latitude:     row.get(3)?,
              longitude:    row.get(4)?,
              altitude:     row.get(5)?,
              total_spaces: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(facilities)
  }

  // ── Observations (append-only) ──────────────────────────────────────────

  async fn append_observations(&self, batch: Vec<Observation>) -> Result<usize> {
    let rows: Vec<(String, String, i64)> = batch
      .into_iter()
      .map(|o| (o.facility_id, encode_ts(o.timestamp), o.free_spaces))
      .collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut written = 0;
        {
          // OR IGNORE covers the (facility_id, timestamp) uniqueness only;
          // foreign-key violations still abort the transaction.
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO observations (facility_id, timestamp, free_spaces)
             VALUES (?1, ?2, ?3)",
          )?;
          for (facility_id, timestamp, free_spaces) in &rows {
            written += stmt.execute(rusqlite::params![facility_id, timestamp, free_spaces])?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;

    Ok(written)
  }

  async fn latest_observation_timestamp(&self) -> Result<Option<Timestamp>> {
    let raw: Option<String> = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT MAX(timestamp) FROM observations", [], |row| {
          row.get(0)
        })?)
      })
      .await?;

    raw.as_deref().map(decode_ts).transpose()
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn query_observations(&self, query: &ObservationQuery) -> Result<Vec<OccupancyRow>> {
    self
      .occupancy_rows(
        "SELECT o.facility_id, f.name, o.timestamp, o.free_spaces, f.total_spaces
         FROM observations o
         JOIN facilities f ON f.id = o.facility_id
         WHERE (?1 IS NULL OR o.facility_id = ?1)
           AND (?2 IS NULL OR o.timestamp >= ?2)
           AND (?3 IS NULL OR o.timestamp <= ?3)
         ORDER BY o.timestamp, o.facility_id",
        vec![
          query.facility_id.clone(),
          query.from.map(encode_ts),
          query.to.map(encode_ts),
        ],
      )
      .await
  }

  async fn latest_observations(&self) -> Result<Vec<OccupancyRow>> {
    self
      .occupancy_rows(
        "SELECT o.facility_id, f.name, o.timestamp, o.free_spaces, f.total_spaces
         FROM observations o
         JOIN facilities f ON f.id = o.facility_id
         WHERE o.timestamp = (
           SELECT MAX(latest.timestamp)
           FROM observations latest
           WHERE latest.facility_id = o.facility_id
         )
         ORDER BY o.facility_id",
        Vec::new(),
      )
      .await
  }
}
