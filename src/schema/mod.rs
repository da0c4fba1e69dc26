//! Relation names, warehouse layers and column layouts.
//!
//! Every relation the pipeline creates is listed in [`RelationName`]. Names are
//! known at compile time, so nothing derived from data or configuration is ever
//! spliced into a table or artifact name without passing [`validate_identifier`].

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WarehouseError};

pub mod field_def;
pub mod relations;

pub use field_def::{FieldKind, SOURCE_FIELDS, SourceField};

/// Maximum length of any identifier used for a relation or artifact
pub const MAX_IDENTIFIER_LEN: usize = 100;

/// The three refinement tiers of the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// Raw ingested rows with provenance
    Bronze,
    /// Typed, standardized and quality-gated rows
    Silver,
    /// Aggregates and the flattened fact table
    Gold,
}

impl Layer {
    /// Object-storage prefix segment for this layer
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// How a relation is (re)created when it is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Keep an existing relation; registering again is a no-op
    CreateIfAbsent,
    /// Drop any existing relation and register the new one
    Replace,
}

/// Closed set of relations produced by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationName {
    BronzeHeartDisease,
    SilverTyped,
    SilverStandardized,
    SilverValidated,
    SilverQuarantine,
    SilverHeartDisease,
    GoldDemographicsSummary,
    GoldRiskFactors,
    GoldSeverityDistribution,
    GoldClinicalMetrics,
    GoldFactTable,
}

impl RelationName {
    /// All relations in pipeline order
    pub const ALL: [Self; 11] = [
        Self::BronzeHeartDisease,
        Self::SilverTyped,
        Self::SilverStandardized,
        Self::SilverValidated,
        Self::SilverQuarantine,
        Self::SilverHeartDisease,
        Self::GoldDemographicsSummary,
        Self::GoldRiskFactors,
        Self::GoldSeverityDistribution,
        Self::GoldClinicalMetrics,
        Self::GoldFactTable,
    ];

    /// The curated relations rebuilt by the aggregation stage
    pub const GOLD: [Self; 5] = [
        Self::GoldDemographicsSummary,
        Self::GoldRiskFactors,
        Self::GoldSeverityDistribution,
        Self::GoldClinicalMetrics,
        Self::GoldFactTable,
    ];

    /// The identifier used in the session and for artifact file names
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BronzeHeartDisease => "bronze_heart_disease",
            Self::SilverTyped => "silver_stage1_typed",
            Self::SilverStandardized => "silver_stage2_standardized",
            Self::SilverValidated => "silver_stage3_validated",
            Self::SilverQuarantine => "silver_quarantine",
            Self::SilverHeartDisease => "silver_heart_disease",
            Self::GoldDemographicsSummary => "gold_demographics_summary",
            Self::GoldRiskFactors => "gold_risk_factors",
            Self::GoldSeverityDistribution => "gold_severity_distribution",
            Self::GoldClinicalMetrics => "gold_clinical_metrics",
            Self::GoldFactTable => "gold_powerbi_fact_table",
        }
    }

    /// The layer that owns this relation
    #[must_use]
    pub const fn layer(self) -> Layer {
        match self {
            Self::BronzeHeartDisease => Layer::Bronze,
            Self::SilverTyped
            | Self::SilverStandardized
            | Self::SilverValidated
            | Self::SilverQuarantine
            | Self::SilverHeartDisease => Layer::Silver,
            Self::GoldDemographicsSummary
            | Self::GoldRiskFactors
            | Self::GoldSeverityDistribution
            | Self::GoldClinicalMetrics
            | Self::GoldFactTable => Layer::Gold,
        }
    }

    /// Raw ingestion is create-if-absent; everything derived is replaced
    #[must_use]
    pub const fn write_mode(self) -> WriteMode {
        match self {
            Self::BronzeHeartDisease => WriteMode::CreateIfAbsent,
            _ => WriteMode::Replace,
        }
    }
}

impl fmt::Display for RelationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationName {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        let name = validate_identifier(s)?;
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| WarehouseError::UnsafeName {
                name: name.to_string(),
                reason: "not a known relation".to_string(),
            })
    }
}

/// Check that an identifier only uses ASCII letters, digits and underscores
/// and is at most [`MAX_IDENTIFIER_LEN`] characters long
pub fn validate_identifier(name: &str) -> Result<&str> {
    if name.is_empty() {
        return Err(WarehouseError::UnsafeName {
            name: name.to_string(),
            reason: "identifier is empty".to_string(),
        });
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(WarehouseError::UnsafeName {
            name: name.to_string(),
            reason: format!("identifier is longer than {MAX_IDENTIFIER_LEN} characters"),
        });
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(WarehouseError::UnsafeName {
            name: name.to_string(),
            reason: format!("character {c:?} is not allowed"),
        });
    }
    Ok(name)
}
