//! Bucket/key addressing of objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WarehouseError};

/// URI scheme used when rendering locations
pub const SCHEME: &str = "s3://";

/// Address of one object in a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Append a path segment to the key
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        let key = if self.key.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{}", self.key.trim_end_matches('/'), segment)
        };
        Self::new(self.bucket.clone(), key)
    }

    /// Key segments, with empty segments removed
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.key.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}/{}", self.bucket, self.key)
    }
}

impl FromStr for ObjectLocation {
    type Err = WarehouseError;

    /// Parse `s3://bucket/key`
    fn from_str(s: &str) -> Result<Self> {
        let rest = s.strip_prefix(SCHEME).ok_or_else(|| {
            WarehouseError::invalid_config("location", s, format!("must start with {SCHEME}"))
        })?;
        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok(Self::new(bucket, key))
            }
            _ => Err(WarehouseError::invalid_config(
                "location",
                s,
                "expected s3://<bucket>/<key>",
            )),
        }
    }
}
