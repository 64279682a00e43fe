//! Configuration for the EVE scraper.
//!
//! Three layers feed a run: the project YAML (where the data lives and how
//! the dataset is described), the static dataset metadata YAML (merged into
//! the manifest untouched), and the run settings in [`ScraperConfig`].
//! Credentials come from `DIEM_USERNAME` and `DIEM_PASSWORD`, resolved once
//! at startup.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::util::safe_read_to_string;
use crate::error::{EveError, Result};

/// Environment variable holding the DIEM portal user name
pub const USERNAME_VAR: &str = "DIEM_USERNAME";
/// Environment variable holding the DIEM portal password
pub const PASSWORD_VAR: &str = "DIEM_PASSWORD";

/// First year covered by period numbering
pub const DEFAULT_START_YEAR: i32 = 2024;

/// Two years of biweekly periods
pub const DEFAULT_MAX_LOOKBACK: u32 = 48;

/// Portal credentials used to generate an access token
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Build credentials from a lookup of `DIEM_USERNAME` and `DIEM_PASSWORD`
    ///
    /// # Errors
    /// Returns a configuration error naming every variable that is unset or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        match (read(USERNAME_VAR), read(PASSWORD_VAR)) {
            (Some(username), Some(password)) => Ok(Self::new(username, password)),
            (username, password) => {
                let missing: Vec<&str> = [
                    (USERNAME_VAR, username.is_none()),
                    (PASSWORD_VAR, password.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(EveError::Config(format!(
                    "missing environment variables: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Project configuration: data location and dataset wording
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Portal base URL, e.g. `https://hqfao.maps.arcgis.com`
    pub base_url: String,
    /// Portal item id of the feature table
    pub feature_table_id: String,
    /// Dataset title; its slug becomes the dataset name
    pub title: String,
    /// Title used to name resource files
    pub resource_title: String,
    /// Resource description; `(country)` is replaced per resource
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// HXL hashtag per column, written as the second CSV row
    #[serde(default)]
    pub hxl_tags: IndexMap<String, String>,
}

impl ProjectConfig {
    /// Load the project YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "loading project configuration")?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        if config.base_url.trim().is_empty() {
            return Err(EveError::Config("base_url must not be empty".to_string()));
        }
        if config.feature_table_id.trim().is_empty() {
            return Err(EveError::Config(
                "feature_table_id must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Static dataset metadata merged verbatim into the manifest
pub type StaticMetadata = Map<String, Value>;

/// Load the static dataset metadata YAML
pub fn load_static_metadata(path: &Path) -> Result<StaticMetadata> {
    let content = safe_read_to_string(path, "loading static dataset metadata")?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Which periods to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodSelection {
    /// The most recent populated period
    #[default]
    Latest,
    /// One specific period number
    Fixed(i64),
    /// Every period in the table
    All,
}

impl FromStr for PeriodSelection {
    type Err = EveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "all" => Ok(Self::All),
            other => other
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .map(Self::Fixed)
                .ok_or_else(|| {
                    EveError::Config(format!(
                        "invalid period '{s}': expected 'latest', 'all' or a positive number"
                    ))
                }),
        }
    }
}

impl fmt::Display for PeriodSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Fixed(n) => write!(f, "{n}"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Settings for a single scraper run
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Which periods to fetch
    pub period: PeriodSelection,
    /// First year covered by period numbering
    pub start_year: i32,
    /// How many periods before the current one may be probed
    pub max_lookback: u32,
    /// Limit on per-country resources; `None` writes every country
    pub max_groups: Option<usize>,
    /// Directory that receives the CSV files and manifest
    pub output_dir: PathBuf,
    /// Prefix CSV files with a UTF-8 byte-order mark
    pub write_bom: bool,
    /// Global timeout for each HTTP request
    pub http_timeout: Duration,
    /// Directory of saved feature snapshots
    pub saved_dir: PathBuf,
    /// Save fetched features to `saved_dir`
    pub save: bool,
    /// Read features from `saved_dir` instead of the service
    pub use_saved: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            period: PeriodSelection::Latest,
            start_year: DEFAULT_START_YEAR,
            max_lookback: DEFAULT_MAX_LOOKBACK,
            max_groups: None,
            output_dir: PathBuf::from("output"),
            write_bom: false,
            http_timeout: Duration::from_secs(60),
            saved_dir: PathBuf::from("saved_data"),
            save: false,
            use_saved: false,
        }
    }
}
