//! Runtime configuration, layered from an optional TOML file and
//! `PARKWATCH_*` environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Capacities published by the city council, in catalog row order. They
/// replace the catalog's own figures, which are known to be stale.
pub const DEFAULT_CAPACITY_OVERRIDES: [i64; 10] =
  [436, 135, 621, 458, 532, 702, 450, 262, 440, 261];

const CATALOG_FILE: &str = "catalogo.csv";
const SNAPSHOT_DIR: &str = "data";

/// Settings exactly as read from file/environment. Paths may be omitted when
/// `dataset_root` is given.
#[derive(Deserialize, Debug, Default)]
struct RawConfig {
  store_path:         Option<PathBuf>,
  dataset_root:       Option<PathBuf>,
  data_root:          Option<PathBuf>,
  catalog_path:       Option<PathBuf>,
  capacity_overrides: Option<Vec<i64>>,
}

/// Resolved configuration handed to each component at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
  /// SQLite database file.
  pub store_path:         PathBuf,
  /// Root of the `YYYY/MM/DD/parking-data-HH_MM.csv` tree.
  pub data_root:          PathBuf,
  /// Reference catalog consumed once by `bootstrap`.
  pub catalog_path:       PathBuf,
  /// Curated capacities aligned with catalog rows. Empty means "use the
  /// catalog's `capacidad` column".
  pub capacity_overrides: Vec<i64>,
}

impl IngestConfig {
  /// Read `path` (if it exists) and overlay `PARKWATCH_*` variables.
  pub fn load(path: &Path) -> Result<Self> { Self::load_layered(path, None) }

  /// `env` replaces the process environment when given.
  fn load_layered(path: &Path, env: Option<config::Map<String, String>>) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("PARKWATCH")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("capacity_overrides")
          .source(env),
      )
      .build()?;

    let raw: RawConfig = settings.try_deserialize()?;
    Self::resolve(raw)
  }

  fn resolve(raw: RawConfig) -> Result<Self> {
    let dataset_root = raw.dataset_root.as_deref().map(expand_tilde);

    let store_path = raw
      .store_path
      .as_deref()
      .map(expand_tilde)
      .ok_or(Error::MissingSetting("store_path"))?;

    let data_root = raw
      .data_root
      .as_deref()
      .map(expand_tilde)
      .or_else(|| dataset_root.as_ref().map(|r| r.join(SNAPSHOT_DIR)))
      .ok_or(Error::MissingSetting("data_root"))?;

    let catalog_path = raw
      .catalog_path
      .as_deref()
      .map(expand_tilde)
      .or_else(|| dataset_root.as_ref().map(|r| r.join(CATALOG_FILE)))
      .ok_or(Error::MissingSetting("catalog_path"))?;

    Ok(Self {
      store_path,
      data_root,
      catalog_path,
      capacity_overrides: raw
        .capacity_overrides
        .unwrap_or_else(|| DEFAULT_CAPACITY_OVERRIDES.to_vec()),
    })
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
