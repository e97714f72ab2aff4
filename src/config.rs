//! Run configuration: where the data comes from, which agencies count as
//! New York, the coordinate box, and where reports are written.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// FTA Major Safety Events dataset on data.transportation.gov.
pub const DEFAULT_ENDPOINT: &str = "https://data.transportation.gov/resource/9ivb-8ae9.json";

pub const DEFAULT_LIMIT: u64 = 50_000;

pub const DEFAULT_AGENCY_KEYWORDS: &[&str] =
    &["NEW YORK", "NYC", "MTA", "METROPOLITAN TRANSPORTATION"];

/// A rectangular latitude/longitude region, bounds inclusive.
///
/// This is a coarse filter. [`BoundingBox::NYC`] covers the five boroughs
/// plus slivers of New Jersey, Westchester and Nassau; it is not a city
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub const NYC: BoundingBox = BoundingBox {
        min_latitude: 40.4,
        max_latitude: 41.0,
        min_longitude: -74.3,
        max_longitude: -73.7,
    };

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_latitude + self.max_latitude) / 2.0,
            (self.min_longitude + self.max_longitude) / 2.0,
        )
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::NYC
    }
}

/// Everything a pipeline stage needs to know, passed in explicitly.
///
/// Loaded from JSON; absent keys take the New York defaults:
/// ```json
/// {
///   "endpoint": "https://data.transportation.gov/resource/9ivb-8ae9.json",
///   "limit": 50000,
///   "agency_keywords": ["NEW YORK", "NYC"],
///   "output_dir": "reports"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Dataset URL, or a path to a local JSON file with the same shape.
    pub endpoint: String,
    /// Value of the `$limit` query parameter.
    pub limit: u64,
    pub agency_keywords: Vec<String>,
    pub bounds: BoundingBox,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            limit: DEFAULT_LIMIT,
            agency_keywords: DEFAULT_AGENCY_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            bounds: BoundingBox::NYC,
            output_dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Whether the endpoint is fetched over HTTP rather than read from disk.
    pub fn is_remote(&self) -> bool {
        self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
