//! Per-facility occupancy statistics over a window of observations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::observation::OccupancyRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilitySummary {
  pub facility_id:          String,
  pub facility_name:        String,
  pub observations:         usize,
  /// Rounded to whole spaces.
  pub mean_free_spaces:     f64,
  /// Rounded to two decimals; `None` when the facility has no capacity.
  pub mean_occupancy_pct:   Option<f64>,
  pub median_occupancy_pct: Option<f64>,
}

/// Group `rows` by facility and compute free-space and occupancy statistics.
/// The result is sorted by facility name.
pub fn summarize(rows: &[OccupancyRow]) -> Vec<FacilitySummary> {
  let mut groups: BTreeMap<&str, Vec<&OccupancyRow>> = BTreeMap::new();
  for row in rows {
    groups.entry(row.facility_id.as_str()).or_default().push(row);
  }

  let mut out: Vec<FacilitySummary> = groups
    .into_values()
    .map(|group| {
      let first = group[0];
      let free: Vec<f64> = group.iter().map(|r| r.free_spaces as f64).collect();
      let pct: Vec<f64> = group
        .iter()
        .filter_map(|r| r.occupancy_percentage())
        .map(|p| p as f64)
        .collect();

      FacilitySummary {
        facility_id:          first.facility_id.clone(),
        facility_name:        first.facility_name.clone(),
        observations:         group.len(),
        mean_free_spaces:     mean(&free).map(|m| m.round()).unwrap_or(0.0),
        mean_occupancy_pct:   mean(&pct).map(round2),
        median_occupancy_pct: median(pct).map(round2),
      }
    })
    .collect();

  out.sort_by(|a, b| a.facility_name.cmp(&b.facility_name));
  out
}

fn mean(values: &[f64]) -> Option<f64> {
  (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn median(mut values: Vec<f64>) -> Option<f64> {
  if values.is_empty() {
    return None;
  }
  values.sort_by(f64::total_cmp);
  let mid = values.len() / 2;
  Some(if values.len() % 2 == 0 {
    (values[mid - 1] + values[mid]) / 2.0
  } else {
    values[mid]
  })
}

fn round2(v: f64) -> f64 { (v * 100.0).round() / 100.0 }
