//! Minute-resolution observation timestamps.
//!
//! Snapshot instants are wall-clock times decoded from the directory layout,
//! so they carry no timezone. Every constructor truncates to the minute.

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Canonical text form, also used as the storage encoding. Sorts
/// lexicographically in chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED_FORMATS: &[&str] = &[
  TIMESTAMP_FORMAT,
  "%Y-%m-%d %H:%M",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M",
];

/// The instant a snapshot represents, truncated to whole minutes.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
  /// Build a timestamp from calendar components. Returns `None` for
  /// impossible dates or times (e.g. February 30th, 24:00).
  pub fn from_parts(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
    NaiveDate::from_ymd_opt(year, month, day)?
      .and_hms_opt(hour, minute, 0)
      .map(Self)
  }

  /// Wrap an arbitrary datetime, dropping seconds and sub-second precision.
  pub fn from_datetime(dt: NaiveDateTime) -> Self {
    let truncated = dt
      .with_second(0)
      .and_then(|d| d.with_nanosecond(0))
      .unwrap_or(dt);
    Self(truncated)
  }

  /// `true` if this timestamp lies strictly after `watermark`. An absent
  /// watermark admits everything.
  pub fn is_after(&self, watermark: Option<Timestamp>) -> bool {
    watermark.is_none_or(|w| *self > w)
  }
}

impl fmt::Display for Timestamp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
  }
}

impl FromStr for Timestamp {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    ACCEPTED_FORMATS
      .iter()
      .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
      .map(Self::from_datetime)
      .ok_or_else(|| Error::InvalidTimestamp(s.to_owned()))
  }
}

impl TryFrom<String> for Timestamp {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { value.parse() }
}

impl From<Timestamp> for String {
  fn from(value: Timestamp) -> Self { value.to_string() }
}
