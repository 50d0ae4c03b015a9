//! Facility catalog bootstrap.
//!
//! Reads the municipal reference catalog (`catalogo.csv`), applies curated
//! capacities and inserts every facility in one transaction. Meant to run
//! once; a second run fails with a duplicate-key error and writes nothing.

use std::{collections::HashMap, io::Read, path::Path};

use csv::StringRecord;
use parkwatch_core::{facility::Facility, store::ParkingStore};
use tracing::info;

use crate::{Error, Result};

const COL_ID: &str = "id";
const COL_NAME: &str = "nombre";
const COL_ADDRESS: &str = "direccion";
const COL_LATITUDE: &str = "latitude";
const COL_LONGITUDE: &str = "longitude";
const COL_ALTITUDE: &str = "altitud";
const COL_CAPACITY: &str = "capacidad";

/// Parse the catalog file at `path`.
pub fn read_catalog(path: &Path, capacity_overrides: &[i64]) -> Result<Vec<Facility>> {
  let file = std::fs::File::open(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;
  parse_catalog(file, capacity_overrides)
}

/// Parse catalog CSV from any reader.
///
/// When `capacity_overrides` is non-empty it must have one entry per catalog
/// row and replaces the catalog capacity row by row. Otherwise the
/// `capacidad` column is required.
pub fn parse_catalog<R: Read>(reader: R, capacity_overrides: &[i64]) -> Result<Vec<Facility>> {
  let mut reader = csv::ReaderBuilder::new().from_reader(reader);
  let header_map = build_header_map(reader.headers()?);

  let column = |name: &'static str| -> Result<usize> {
    header_map.get(name).copied().ok_or(Error::MissingColumn(name))
  };
  let id = column(COL_ID)?;
  let name = column(COL_NAME)?;
  let address = column(COL_ADDRESS)?;
  let latitude = column(COL_LATITUDE)?;
  let longitude = column(COL_LONGITUDE)?;
  let altitude = column(COL_ALTITUDE)?;
  let capacity = if capacity_overrides.is_empty() {
    Some(column(COL_CAPACITY)?)
  } else {
    None
  };

  let mut facilities = Vec::new();
  for record in reader.records() {
    let record = record?;
    let line = record.position().map(|p| p.line()).unwrap_or_default();

    facilities.push(Facility {
      id:           text(&record, id),
      name:         text(&record, name),
      address:      text(&record, address),
      latitude:     number(&record, latitude, COL_LATITUDE, line)?,
      longitude:    number(&record, longitude, COL_LONGITUDE, line)?,
      altitude:     number(&record, altitude, COL_ALTITUDE, line)?,
      total_spaces: match capacity {
        Some(idx) => number(&record, idx, COL_CAPACITY, line)?,
        None => 0,
      },
    });
  }

  if !capacity_overrides.is_empty() {
    if capacity_overrides.len() != facilities.len() {
      return Err(Error::CapacityMismatch {
        catalog_rows: facilities.len(),
        overrides:    capacity_overrides.len(),
      });
    }
    for (facility, &spaces) in facilities.iter_mut().zip(capacity_overrides) {
      facility.total_spaces = spaces;
    }
  }

  Ok(facilities)
}

/// Load the catalog and insert it into `store`. Returns the number of
/// facilities written.
pub async fn bootstrap<S: ParkingStore>(
  store: &S,
  catalog_path: &Path,
  capacity_overrides: &[i64],
) -> Result<usize> {
  let path = catalog_path.to_path_buf();
  let overrides = capacity_overrides.to_vec();
  let facilities =
    tokio::task::spawn_blocking(move || read_catalog(&path, &overrides)).await??;

  let written = store.add_facilities(facilities).await.map_err(Error::store)?;
  info!(facilities = written, catalog = %catalog_path.display(), "facility catalog loaded");
  Ok(written)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
  headers
    .iter()
    .enumerate()
    .map(|(idx, h)| (h.trim().to_owned(), idx))
    .collect()
}

fn text(record: &StringRecord, idx: usize) -> String {
  record.get(idx).unwrap_or_default().to_owned()
}

fn number<T: std::str::FromStr>(
  record: &StringRecord,
  idx: usize,
  column: &'static str,
  line: u64,
) -> Result<T> {
  let raw = record.get(idx).unwrap_or_default().trim();
  raw.parse().map_err(|_| Error::InvalidField {
    line,
    column,
    value: raw.to_owned(),
  })
}
