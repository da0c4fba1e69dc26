//! Sources of configuration values

use std::path::Path;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::util::{IoResultExt, safe_open_file};
use crate::error::{Result, WarehouseError};

/// A read-only source of string configuration values
pub trait ConfigProvider {
    /// The raw value of `key`, or `None` when the key is not set
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProvider;

impl EnvProvider {
    /// Load a `.env` file from the working directory (if any) into the
    /// environment and return a provider over it
    #[must_use]
    pub fn with_dotenv() -> Self {
        match dotenv::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) => log::debug!("No .env file loaded: {e}"),
        }
        Self
    }
}

impl ConfigProvider for EnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory key/value configuration
#[derive(Debug, Clone, Default)]
pub struct MapProvider {
    values: FxHashMap<String, String>,
}

impl MapProvider {
    /// Add or replace a value
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl From<FxHashMap<String, String>> for MapProvider {
    fn from(values: FxHashMap<String, String>) -> Self {
        Self { values }
    }
}

impl ConfigProvider for MapProvider {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Values from a flat JSON object, e.g. `{"MIN_AGE": 21, "SOURCE_KEY": "heart.csv"}`
///
/// Strings, numbers and booleans are accepted. `null` is kept as a blank
/// value, so a nulled threshold is reported as missing rather than defaulted.
#[derive(Debug, Clone, Default)]
pub struct JsonFileProvider {
    inner: MapProvider,
}

impl JsonFileProvider {
    /// Load a JSON configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, is not an
    /// object, or holds a nested value.
    pub fn load(path: &Path) -> Result<Self> {
        let file = safe_open_file(path, "configuration")?;
        let value: Value = serde_json::from_reader(std::io::BufReader::new(file))?;
        Self::from_value(value).map_err(|e| match e {
            WarehouseError::InvalidConfig { key, value, reason } => WarehouseError::InvalidConfig {
                key,
                value,
                reason: format!("{reason} (in {})", path.display()),
            },
            other => other,
        })
    }

    /// Build from an already parsed JSON value
    ///
    /// # Errors
    /// Returns a configuration error when `value` is not a flat object.
    pub fn from_value(value: Value) -> Result<Self> {
        let entries = match value {
            Value::Object(entries) => entries,
            other => {
                return Err(WarehouseError::invalid_config(
                    "<root>",
                    other.to_string(),
                    "configuration file must hold a JSON object",
                ));
            }
        };

        let mut inner = MapProvider::default();
        for (key, value) in entries {
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                nested @ (Value::Array(_) | Value::Object(_)) => {
                    return Err(WarehouseError::invalid_config(
                        key,
                        nested.to_string(),
                        "nested values are not supported",
                    ));
                }
            };
            inner = inner.with(key, text);
        }
        Ok(Self { inner })
    }

    /// Write `values` as a JSON object to `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(path: &Path, values: &FxHashMap<String, String>) -> Result<()> {
        let sorted: std::collections::BTreeMap<_, _> = values.iter().collect();
        let text = serde_json::to_string_pretty(&sorted)?;
        std::fs::write(path, text).at_path(path)
    }
}

impl ConfigProvider for JsonFileProvider {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }
}

/// Consults providers in order; the first one that knows a key wins
#[derive(Default)]
pub struct LayeredProvider {
    layers: Vec<Box<dyn ConfigProvider>>,
}

impl LayeredProvider {
    /// Append a lower-priority layer
    #[must_use]
    pub fn then(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.layers.push(Box::new(provider));
        self
    }
}

impl ConfigProvider for LayeredProvider {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}
