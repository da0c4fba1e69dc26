//! Configuration for the warehouse pipeline.
//!
//! Settings are read through a [`ConfigProvider`] so that the pipeline never
//! touches the process environment directly. Every value has a default; a key
//! that is set must hold a usable value or loading fails before any stage runs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WarehouseError};
use crate::schema::{Layer, validate_identifier};
use crate::storage::ObjectLocation;

pub mod provider;

pub use provider::{ConfigProvider, EnvProvider, JsonFileProvider, LayeredProvider, MapProvider};

/// Configuration keys
pub mod keys {
    pub const SOURCE_BUCKET: &str = "SOURCE_BUCKET";
    pub const SOURCE_KEY: &str = "SOURCE_KEY";
    pub const TARGET_BUCKET: &str = "TARGET_BUCKET";
    pub const TARGET_BASE_FILE: &str = "TARGET_BASE_FILE";
    pub const MIN_AGE: &str = "MIN_AGE";
    pub const MAX_AGE: &str = "MAX_AGE";
    pub const MIN_BLOOD_PRESSURE: &str = "MIN_BLOOD_PRESSURE";
    pub const MAX_BLOOD_PRESSURE: &str = "MAX_BLOOD_PRESSURE";
    pub const MIN_CHOLESTEROL: &str = "MIN_CHOLESTEROL";
    pub const MAX_CHOLESTEROL: &str = "MAX_CHOLESTEROL";
    pub const MIN_HEART_RATE: &str = "MIN_HEART_RATE";
    pub const MAX_HEART_RATE: &str = "MAX_HEART_RATE";
    pub const MIN_ST_DEPRESSION: &str = "MIN_ST_DEPRESSION";
    pub const MAX_ST_DEPRESSION: &str = "MAX_ST_DEPRESSION";
    pub const COERCION_POLICY: &str = "COERCION_POLICY";
    pub const STORAGE_ROOT: &str = "WAREHOUSE_STORAGE_ROOT";
    pub const WORK_DIR: &str = "WAREHOUSE_WORK_DIR";
}

/// Lower and upper bound accepted for any threshold value
pub const THRESHOLD_ENVELOPE: (f64, f64) = (0.0, 1000.0);

/// Inclusive range of acceptable values for one measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the range, bounds included
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

/// Plausibility ranges used by quality evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub age: Bounds,
    pub blood_pressure: Bounds,
    pub cholesterol: Bounds,
    pub heart_rate: Bounds,
    pub st_depression: Bounds,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            age: Bounds::new(18.0, 100.0),
            blood_pressure: Bounds::new(80.0, 250.0),
            cholesterol: Bounds::new(100.0, 600.0),
            heart_rate: Bounds::new(60.0, 220.0),
            st_depression: Bounds::new(0.0, 10.0),
        }
    }
}

impl QualityThresholds {
    /// Key pairs and the bounds they populate, in reporting order
    fn entries(&self) -> [(&'static str, &'static str, Bounds); 5] {
        [
            (keys::MIN_AGE, keys::MAX_AGE, self.age),
            (keys::MIN_BLOOD_PRESSURE, keys::MAX_BLOOD_PRESSURE, self.blood_pressure),
            (keys::MIN_CHOLESTEROL, keys::MAX_CHOLESTEROL, self.cholesterol),
            (keys::MIN_HEART_RATE, keys::MAX_HEART_RATE, self.heart_rate),
            (keys::MIN_ST_DEPRESSION, keys::MAX_ST_DEPRESSION, self.st_depression),
        ]
    }

    /// Read thresholds from a provider, falling back to the defaults for unset keys
    ///
    /// # Errors
    /// Returns a configuration error if a key is set but blank, not numeric, or
    /// if the resulting thresholds fail [`QualityThresholds::validate`].
    pub fn from_provider(provider: &dyn ConfigProvider) -> Result<Self> {
        let defaults = Self::default();
        let read = |min_key: &str, max_key: &str, fallback: Bounds| -> Result<Bounds> {
            Ok(Bounds::new(
                read_number(provider, min_key, fallback.min)?,
                read_number(provider, max_key, fallback.max)?,
            ))
        };

        let thresholds = Self {
            age: read(keys::MIN_AGE, keys::MAX_AGE, defaults.age)?,
            blood_pressure: read(
                keys::MIN_BLOOD_PRESSURE,
                keys::MAX_BLOOD_PRESSURE,
                defaults.blood_pressure,
            )?,
            cholesterol: read(keys::MIN_CHOLESTEROL, keys::MAX_CHOLESTEROL, defaults.cholesterol)?,
            heart_rate: read(keys::MIN_HEART_RATE, keys::MAX_HEART_RATE, defaults.heart_rate)?,
            st_depression: read(
                keys::MIN_ST_DEPRESSION,
                keys::MAX_ST_DEPRESSION,
                defaults.st_depression,
            )?,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Check every bound is finite, inside [`THRESHOLD_ENVELOPE`] and ordered
    ///
    /// # Errors
    /// Returns [`WarehouseError::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let (low, high) = THRESHOLD_ENVELOPE;
        for (min_key, max_key, bounds) in self.entries() {
            for (key, value) in [(min_key, bounds.min), (max_key, bounds.max)] {
                if !value.is_finite() {
                    return Err(WarehouseError::invalid_config(
                        key,
                        value.to_string(),
                        "must be a finite number",
                    ));
                }
                if value < low || value > high {
                    return Err(WarehouseError::invalid_config(
                        key,
                        value.to_string(),
                        format!("must be between {low} and {high}"),
                    ));
                }
            }
            if bounds.min > bounds.max {
                return Err(WarehouseError::invalid_config(
                    min_key,
                    bounds.min.to_string(),
                    format!("must not exceed {max_key} ({})", bounds.max),
                ));
            }
        }
        Ok(())
    }
}

fn read_number(provider: &dyn ConfigProvider, key: &str, fallback: f64) -> Result<f64> {
    match provider.get(key) {
        None => Ok(fallback),
        Some(raw) if raw.trim().is_empty() => Err(WarehouseError::MissingConfig {
            key: key.to_string(),
        }),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| WarehouseError::invalid_config(key, raw.clone(), "not a number")),
    }
}

fn read_text(provider: &dyn ConfigProvider, key: &str, fallback: &str) -> Result<String> {
    match provider.get(key) {
        None => Ok(fallback.to_string()),
        Some(raw) if raw.trim().is_empty() => Err(WarehouseError::MissingConfig {
            key: key.to_string(),
        }),
        Some(raw) => Ok(raw.trim().to_string()),
    }
}

/// How non-convertible raw values are handled during type coercion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Fail the cleaning stage on the first non-convertible value
    #[default]
    Strict,
    /// Move affected rows to `silver_quarantine` and continue
    Quarantine,
}

impl FromStr for CoercionPolicy {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "quarantine" => Ok(Self::Quarantine),
            _ => Err(WarehouseError::invalid_config(
                keys::COERCION_POLICY,
                s,
                "expected 'strict' or 'quarantine'",
            )),
        }
    }
}

impl fmt::Display for CoercionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Quarantine => f.write_str("quarantine"),
        }
    }
}

/// Configuration for one warehouse run
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseConfig {
    /// Bucket holding the raw source file
    pub source_bucket: String,
    /// Object key of the raw source file; also recorded as `source_identifier`
    pub source_key: String,
    /// Bucket receiving layer artifacts
    pub target_bucket: String,
    /// Base prefix under which `Bronze/`, `Silver/` and `Gold/` are written
    pub target_base: String,
    /// Quality evaluation ranges
    pub thresholds: QualityThresholds,
    /// Handling of non-convertible raw values
    pub coercion_policy: CoercionPolicy,
    /// Directory that backs the local object store
    pub storage_root: PathBuf,
    /// Directory for local fallback copies of artifacts
    pub work_dir: PathBuf,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            source_bucket: "pritham-heartdata".to_string(),
            source_key: "heart_disease_uci.csv".to_string(),
            target_bucket: "data-endpoint".to_string(),
            target_base: "Health_data".to_string(),
            thresholds: QualityThresholds::default(),
            coercion_policy: CoercionPolicy::default(),
            storage_root: PathBuf::from("storage"),
            work_dir: std::env::temp_dir().join("heart-warehouse"),
        }
    }
}

impl WarehouseConfig {
    /// Build and validate a configuration from a provider
    ///
    /// # Errors
    /// Returns a configuration or naming error for the first unusable value.
    pub fn from_provider(provider: &dyn ConfigProvider) -> Result<Self> {
        let defaults = Self::default();
        let coercion_policy = match provider.get(keys::COERCION_POLICY) {
            None => defaults.coercion_policy,
            Some(raw) => raw.parse()?,
        };
        let path = |key: &str, fallback: &Path| -> Result<PathBuf> {
            read_text(provider, key, &fallback.to_string_lossy()).map(PathBuf::from)
        };

        let config = Self {
            source_bucket: read_text(provider, keys::SOURCE_BUCKET, &defaults.source_bucket)?,
            source_key: read_text(provider, keys::SOURCE_KEY, &defaults.source_key)?,
            target_bucket: read_text(provider, keys::TARGET_BUCKET, &defaults.target_bucket)?,
            target_base: read_text(provider, keys::TARGET_BASE_FILE, &defaults.target_base)?,
            thresholds: QualityThresholds::from_provider(provider)?,
            coercion_policy,
            storage_root: path(keys::STORAGE_ROOT, &defaults.storage_root)?,
            work_dir: path(keys::WORK_DIR, &defaults.work_dir)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate locations, names and thresholds
    ///
    /// # Errors
    /// Returns the first configuration or naming error found.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            (keys::SOURCE_BUCKET, &self.source_bucket),
            (keys::SOURCE_KEY, &self.source_key),
            (keys::TARGET_BUCKET, &self.target_bucket),
        ] {
            if value.trim().is_empty() {
                return Err(WarehouseError::MissingConfig {
                    key: key.to_string(),
                });
            }
            if value.contains("..") || value.starts_with('/') {
                return Err(WarehouseError::invalid_config(
                    key,
                    value.as_str(),
                    "must be a relative object name",
                ));
            }
        }
        validate_identifier(&self.target_base)?;
        self.thresholds.validate()
    }

    /// Location of the raw source file
    #[must_use]
    pub fn source_location(&self) -> ObjectLocation {
        ObjectLocation::new(&self.source_bucket, &self.source_key)
    }

    /// Prefix of a layer's artifacts, e.g. `Health_data/Silver`
    #[must_use]
    pub fn layer_prefix(&self, layer: Layer) -> String {
        format!("{}/{}", self.target_base, layer.prefix())
    }

    /// Root location of the warehouse in the target bucket
    #[must_use]
    pub fn warehouse_location(&self) -> ObjectLocation {
        ObjectLocation::new(&self.target_bucket, format!("{}/", self.target_base))
    }

    /// Flatten into provider form, e.g. for writing a JSON configuration file
    #[must_use]
    pub fn to_map(&self) -> FxHashMap<String, String> {
        let mut map = FxHashMap::default();
        map.insert(keys::SOURCE_BUCKET.to_string(), self.source_bucket.clone());
        map.insert(keys::SOURCE_KEY.to_string(), self.source_key.clone());
        map.insert(keys::TARGET_BUCKET.to_string(), self.target_bucket.clone());
        map.insert(keys::TARGET_BASE_FILE.to_string(), self.target_base.clone());
        for (min_key, max_key, bounds) in self.thresholds.entries() {
            map.insert(min_key.to_string(), bounds.min.to_string());
            map.insert(max_key.to_string(), bounds.max.to_string());
        }
        map.insert(keys::COERCION_POLICY.to_string(), self.coercion_policy.to_string());
        map.insert(
            keys::STORAGE_ROOT.to_string(),
            self.storage_root.to_string_lossy().into_owned(),
        );
        map.insert(
            keys::WORK_DIR.to_string(),
            self.work_dir.to_string_lossy().into_owned(),
        );
        map
    }
}

impl fmt::Display for WarehouseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Warehouse Configuration:")?;
        writeln!(f, "  Source: {}", self.source_location())?;
        writeln!(f, "  Warehouse: {}", self.warehouse_location())?;
        writeln!(f, "  Storage Root: {}", self.storage_root.display())?;
        writeln!(f, "  Work Directory: {}", self.work_dir.display())?;
        writeln!(f, "  Coercion Policy: {}", self.coercion_policy)?;
        writeln!(f, "  Quality Thresholds:")?;
        writeln!(f, "    Age: {}", self.thresholds.age)?;
        writeln!(f, "    Blood Pressure: {}", self.thresholds.blood_pressure)?;
        writeln!(f, "    Cholesterol: {}", self.thresholds.cholesterol)?;
        writeln!(f, "    Heart Rate: {}", self.thresholds.heart_rate)?;
        writeln!(f, "    ST Depression: {}", self.thresholds.st_depression)
    }
}
