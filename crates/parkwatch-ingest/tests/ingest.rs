//! End-to-end ingestion runs against snapshot trees on disk and an in-memory
//! SQLite store.

use std::path::Path;

use parkwatch_core::{
  Timestamp,
  facility::Facility,
  observation::{Observation, OccupancyRow},
  store::{ObservationQuery, ParkingStore},
};
use parkwatch_ingest::{Error, Ingestor, catalog};
use parkwatch_store_sqlite::SqliteStore;
use tempfile::TempDir;

// ─── Fixtures ────────────────────────────────────────────────────────────────

const CATALOG: &str = "\
id,nombre,direccion,latitude,longitude,altitud
P1,Alcazaba,Avda. de Cervantes 1,36.7213,-4.4163,12
P2,Camas,Calle Camas 2,36.7190,-4.4250,9
P3,Tejon y Rodriguez,Calle Tejon y Rodriguez 3,36.7230,-4.4220,20
";

fn ts(hour: u32, minute: u32) -> Timestamp {
  Timestamp::from_parts(2022, 5, 1, hour, minute).unwrap()
}

fn write_snapshot(root: &Path, hour: u32, minute: u32, contents: &str) {
  let dir = root.join("2022/05/01");
  std::fs::create_dir_all(&dir).unwrap();
  std::fs::write(dir.join(format!("parking-data-{hour:02}_{minute:02}.csv")), contents).unwrap();
}

fn modern(rows: &[(&str, i64)]) -> String {
  let mut csv = String::from("id,nombre,direccion,libres,timestamp\n");
  for (id, free) in rows {
    csv.push_str(&format!("{id},name,addr,{free},2000-01-01 00:00:00\n"));
  }
  csv
}

fn legacy(rows: &[(&str, i64)]) -> String {
  let mut csv = String::from("poiID,nombre,direccion,libres\n");
  for (i, (address, free)) in rows.iter().enumerate() {
    csv.push_str(&format!("{i},name,\"{address}\",{free}\n"));
  }
  csv
}

async fn bootstrapped_store(dir: &TempDir) -> SqliteStore {
  let catalog_path = dir.path().join("catalogo.csv");
  std::fs::write(&catalog_path, CATALOG).unwrap();

  let store = SqliteStore::open_in_memory().await.unwrap();
  catalog::bootstrap(&store, &catalog_path, &[436, 135, 621])
    .await
    .unwrap();
  store
}

async fn all_rows(store: &SqliteStore) -> Vec<OccupancyRow> {
  store
    .query_observations(&ObservationQuery::default())
    .await
    .unwrap()
}

// ─── Bootstrap ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn bootstrap_applies_capacity_overrides() {
  let dir = tempfile::tempdir().unwrap();
  let store = bootstrapped_store(&dir).await;

  let facilities = store.list_facilities().await.unwrap();
  let capacities: Vec<_> = facilities.iter().map(|f| (f.id.as_str(), f.total_spaces)).collect();
  assert_eq!(capacities, vec![("P1", 436), ("P2", 135), ("P3", 621)]);
}

#[tokio::test]
async fn second_bootstrap_reports_duplicate_key() {
  let dir = tempfile::tempdir().unwrap();
  let store = bootstrapped_store(&dir).await;

  let err = catalog::bootstrap(&store, &dir.path().join("catalogo.csv"), &[436, 135, 621])
    .await
    .unwrap_err();

  let Error::Store(inner) = err else { panic!("expected a store error") };
  assert!(matches!(
    inner.downcast_ref::<parkwatch_store_sqlite::Error>(),
    Some(parkwatch_store_sqlite::Error::DuplicateKey(_))
  ));
}

// ─── Incremental behaviour ───────────────────────────────────────────────────

#[tokio::test]
async fn second_run_over_unchanged_tree_writes_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("data");
  write_snapshot(&data, 10, 0, &modern(&[("P1", 50), ("P2", 10)]));
  write_snapshot(&data, 10, 1, &modern(&[("P1", 49), ("P2", 11)]));

  let store = bootstrapped_store(&dir).await;
  let ingestor = Ingestor::new(store.clone(), &data);

  let first = ingestor.run().await.unwrap();
  assert_eq!(first.watermark, None);
  assert_eq!(first.ingested_files, 2);
  assert_eq!(first.observations_written, 4);

  let second = ingestor.run().await.unwrap();
  assert_eq!(second.watermark, Some(ts(10, 1)));
  assert_eq!(second.discovered, 0);
  assert_eq!(second.behind_watermark, 2);
  assert_eq!(second.observations_written, 0);
  assert_eq!(all_rows(&store).await.len(), 4);
}

#[tokio::test]
async fn only_snapshots_after_watermark_are_ingested() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("data");
  for minute in 0..3 {
    write_snapshot(&data, 10, minute, &modern(&[("P1", 100 - minute as i64)]));
  }

  let store = bootstrapped_store(&dir).await;
  store
    .append_observations(vec![Observation {
      facility_id: "P1".into(),
      timestamp:   ts(10, 0),
      free_spaces: 100,
    }])
    .await
    .unwrap();

  let report = Ingestor::new(store.clone(), &data).run().await.unwrap();
  assert_eq!(report.watermark, Some(ts(10, 0)));
  assert_eq!(report.ingested_files, 2);

  let stamps: Vec<_> = all_rows(&store).await.iter().map(|r| r.timestamp).collect();
  assert_eq!(stamps, vec![ts(10, 0), ts(10, 1), ts(10, 2)]);
}

#[tokio::test]
async fn new_snapshots_are_picked_up_on_the_next_run() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("data");
  write_snapshot(&data, 9, 0, &modern(&[("P1", 1)]));

  let store = bootstrapped_store(&dir).await;
  let ingestor = Ingestor::new(store.clone(), &data);
  ingestor.run().await.unwrap();

  write_snapshot(&data, 9, 5, &modern(&[("P1", 2)]));
  let report = ingestor.run().await.unwrap();
  assert_eq!(report.ingested_files, 1);
  assert_eq!(
    store.latest_observation_timestamp().await.unwrap(),
    Some(ts(9, 5))
  );
}

// ─── Schema dispatch ─────────────────────────────────────────────────────────

#[tokio::test]
async fn legacy_and_modern_snapshots_resolve_to_facilities() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("data");
  write_snapshot(&data, 10, 0, &legacy(&[("Avda. de Cervantes 1", 30), ("Calle Camas 2", 7)]));
  write_snapshot(&data, 10, 1, &modern(&[("P3", 200)]));

  let store = bootstrapped_store(&dir).await;
  Ingestor::new(store.clone(), &data).run().await.unwrap();

  let rows = all_rows(&store).await;
  let got: Vec<_> = rows
    .iter()
    .map(|r| (r.timestamp, r.facility_id.as_str(), r.free_spaces))
    .collect();
  assert_eq!(
    got,
    vec![(ts(10, 0), "P1", 30), (ts(10, 0), "P2", 7), (ts(10, 1), "P3", 200)]
  );
}

#[tokio::test]
async fn unmatched_rows_are_dropped_without_failing_the_run() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("data");
  write_snapshot(&data, 10, 0, &legacy(&[("Avenida de Cervantes, 1", 30), ("Calle Camas 2", 7)]));
  write_snapshot(&data, 10, 1, &modern(&[("P404", 1), ("P1", 2)]));

  let store = bootstrapped_store(&dir).await;
  let report = Ingestor::new(store.clone(), &data).run().await.unwrap();

  assert_eq!(report.ingested_files, 2);
  assert_eq!(report.rows_unmatched, 2);
  assert_eq!(report.observations_written, 2);
  assert!(all_rows(&store).await.iter().all(|r| r.facility_id != "P404"));
}

// ─── Bad files ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_and_malformed_files_do_not_stop_the_batch() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("data");
  write_snapshot(&data, 10, 0, "");
  write_snapshot(&data, 10, 1, "id,libres\n");
  write_snapshot(&data, 10, 2, "id,libres\nP1,1,oops\n");
  write_snapshot(&data, 10, 3, "nombre,libres\nAlcazaba,3\n");
  write_snapshot(&data, 10, 4, &modern(&[("P1", 4)]));

  let store = bootstrapped_store(&dir).await;
  let report = Ingestor::new(store.clone(), &data).run().await.unwrap();

  assert_eq!(report.discovered, 5);
  // zero-byte, ragged and missing-`id` files are skipped
  assert_eq!(report.skipped_files, 3);
  // header-only file and the good one
  assert_eq!(report.ingested_files, 2);

  let rows = all_rows(&store).await;
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].timestamp, ts(10, 4));
}

#[tokio::test]
async fn files_outside_the_layout_are_ignored() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("data");
  write_snapshot(&data, 10, 0, &modern(&[("P1", 4)]));
  std::fs::write(data.join("2022/05/01/README.md"), "notes").unwrap();
  std::fs::create_dir_all(data.join("misc")).unwrap();
  std::fs::write(data.join("misc/parking-data-10_05.csv"), modern(&[("P1", 9)])).unwrap();

  let store = bootstrapped_store(&dir).await;
  let report = Ingestor::new(store.clone(), &data).run().await.unwrap();

  assert_eq!(report.discovered, 1);
  assert_eq!(all_rows(&store).await.len(), 1);
}

#[tokio::test]
async fn missing_data_root_is_fatal() {
  let dir = tempfile::tempdir().unwrap();
  let store = bootstrapped_store(&dir).await;

  let err = Ingestor::new(store, dir.path().join("nowhere")).run().await.unwrap_err();
  assert!(matches!(err, Error::Io { .. }));
}

// ─── Write failures ──────────────────────────────────────────────────────────

/// Delegates to a real store but corrupts the last observation of the batch
/// for one timestamp, so SQLite rejects it after the earlier rows of the
/// same file were already inserted.
struct FailingStore {
  inner:   SqliteStore,
  fail_at: Timestamp,
}

impl ParkingStore for FailingStore {
  type Error = parkwatch_store_sqlite::Error;

  async fn add_facilities(&self, facilities: Vec<Facility>) -> Result<usize, Self::Error> {
    self.inner.add_facilities(facilities).await
  }

  async fn list_facilities(&self) -> Result<Vec<Facility>, Self::Error> {
    self.inner.list_facilities().await
  }

  async fn append_observations(&self, mut batch: Vec<Observation>) -> Result<usize, Self::Error> {
    if let Some(last) = batch.last_mut()
      && last.timestamp == self.fail_at
    {
      last.facility_id = "NOT-A-FACILITY".into();
    }
    self.inner.append_observations(batch).await
  }

  async fn latest_observation_timestamp(&self) -> Result<Option<Timestamp>, Self::Error> {
    self.inner.latest_observation_timestamp().await
  }

  async fn query_observations(
    &self,
    query: &ObservationQuery,
  ) -> Result<Vec<OccupancyRow>, Self::Error> {
    self.inner.query_observations(query).await
  }

  async fn latest_observations(&self) -> Result<Vec<OccupancyRow>, Self::Error> {
    self.inner.latest_observations().await
  }
}

#[tokio::test]
async fn write_failure_mid_file_persists_nothing_from_that_file() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("data");
  write_snapshot(&data, 10, 0, &modern(&[("P1", 50), ("P2", 5)]));
  write_snapshot(&data, 10, 1, &modern(&[("P1", 49), ("P2", 6), ("P3", 7)]));
  write_snapshot(&data, 10, 2, &modern(&[("P1", 48)]));

  let store = bootstrapped_store(&dir).await;
  let failing = FailingStore { inner: store.clone(), fail_at: ts(10, 1) };

  let err = Ingestor::new(failing, &data).run().await.unwrap_err();
  assert!(matches!(err, Error::Store(_)));

  // The first file committed; nothing from the failing file survived, and
  // the run stopped before the third.
  let stamps: Vec<_> = all_rows(&store).await.iter().map(|r| r.timestamp).collect();
  assert_eq!(stamps, vec![ts(10, 0), ts(10, 0)]);

  // The operator re-runs once the store is healthy; the watermark resumes
  // right after the last committed file.
  let report = Ingestor::new(store.clone(), &data).run().await.unwrap();
  assert_eq!(report.watermark, Some(ts(10, 0)));
  assert_eq!(report.ingested_files, 2);
  assert_eq!(all_rows(&store).await.len(), 6);
}

// ─── Read side ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn latest_view_after_ingestion_shows_newest_reading() {
  let dir = tempfile::tempdir().unwrap();
  let data = dir.path().join("data");
  write_snapshot(&data, 10, 0, &modern(&[("P1", 50)]));
  write_snapshot(&data, 10, 5, &modern(&[("P1", 40)]));

  let store = bootstrapped_store(&dir).await;
  Ingestor::new(store.clone(), &data).run().await.unwrap();

  let latest = store.latest_observations().await.unwrap();
  assert_eq!(latest.len(), 1);
  assert_eq!(latest[0].timestamp, ts(10, 5));
  assert_eq!(latest[0].free_spaces, 40);
  assert_eq!(latest[0].facility_name, "Alcazaba");
  assert_eq!(latest[0].total_spaces, 436);
}
