//! Saved feature snapshots
//!
//! A snapshot is the JSON body of a feature-service query:
//! `{"features": [{"attributes": {...}}, ...]}`. It lets a run be replayed
//! without credentials or network access.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::util::{ensure_directory, safe_read_to_string};
use crate::error::{EveError, Result};
use crate::record::{RawRecord, as_integer, fields};
use crate::source::{FeatureSource, parse_period_clause};

/// File name of the most recent snapshot inside the saved-data directory
pub const LATEST_SNAPSHOT: &str = "data-latest.json";

/// A single feature as stored by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub attributes: RawRecord,
}

/// Query-result body holding a list of features
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureSet {
    #[must_use]
    pub fn from_records(records: &[RawRecord]) -> Self {
        Self {
            features: records
                .iter()
                .map(|attributes| Feature {
                    attributes: attributes.clone(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn into_records(self) -> Vec<RawRecord> {
        self.features.into_iter().map(|f| f.attributes).collect()
    }
}

/// Feature source backed by a snapshot file
#[derive(Debug, Clone)]
pub struct SavedFeatures {
    path: PathBuf,
    records: Vec<RawRecord>,
}

impl SavedFeatures {
    /// Load a snapshot file
    pub fn load(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "loading saved feature data")?;
        let set: FeatureSet = serde_json::from_str(&content)?;
        log::info!(
            "Loaded {} saved features from {}",
            set.features.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            records: set.into_records(),
        })
    }

    /// Load `data-latest.json` from the saved-data directory
    pub fn load_latest(saved_dir: &Path) -> Result<Self> {
        Self::load(&saved_dir.join(LATEST_SNAPSHOT))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FeatureSource for SavedFeatures {
    fn field_names(&self) -> Result<Vec<String>> {
        Ok(self
            .records
            .first()
            .map(|record| record.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn query(&self, filter: &str, columns: &[String]) -> Result<Vec<RawRecord>> {
        let period = parse_period_clause(filter);
        let mut rows = Vec::new();
        for record in &self.records {
            if let Some(period) = period {
                let matches = record.get(fields::PERIOD_NUMBER).and_then(as_integer) == Some(period);
                if !matches {
                    continue;
                }
            }
            rows.push(project(record, columns));
        }
        Ok(rows)
    }
}

fn project(record: &RawRecord, columns: &[String]) -> RawRecord {
    if columns.is_empty() {
        return record.clone();
    }
    record
        .iter()
        .filter(|(key, _)| columns.iter().any(|c| c == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Write fetched records to `{saved_dir}/data-latest.json`
pub fn save_latest(saved_dir: &Path, records: &[RawRecord]) -> Result<PathBuf> {
    ensure_directory(saved_dir, "saving fetched feature data")?;
    let path = saved_dir.join(LATEST_SNAPSHOT);
    let body = serde_json::to_string_pretty(&FeatureSet::from_records(records))?;
    fs::write(&path, body).map_err(|e| EveError::from(e).with_path(&path))?;
    log::info!("Saved {} features to {}", records.len(), path.display());
    Ok(path)
}
