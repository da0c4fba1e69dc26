//! Aggregation: the clean relation into the five gold relations
//!
//! Each aggregate depends only on the clean records, so they are built in
//! parallel. None of them carries a wall-clock column; rebuilding from the
//! same clean input yields identical tables.

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;

use crate::error::Result;
use crate::models::{
    ClinicalMetricsRow, DemographicsRow, FactRow, RiskFactorRow, SeverityRow, TableRecord,
    ValidatedRecord,
};
use crate::schema::RelationName;
use crate::utils::logging::{log_stage_complete, log_stage_start};

pub mod clinical;
pub mod demographics;
pub mod fact_table;
pub mod risk_factors;
pub mod severity;
pub mod stats;

pub use fact_table::{MAX_RISK_SCORE, risk_score};

/// The five curated aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Demographics,
    RiskFactors,
    Severity,
    ClinicalMetrics,
    FactTable,
}

impl AggregateKind {
    pub const ALL: [Self; 5] = [
        Self::Demographics,
        Self::RiskFactors,
        Self::Severity,
        Self::ClinicalMetrics,
        Self::FactTable,
    ];

    /// Relation this aggregate is registered as
    #[must_use]
    pub const fn relation(self) -> RelationName {
        match self {
            Self::Demographics => RelationName::GoldDemographicsSummary,
            Self::RiskFactors => RelationName::GoldRiskFactors,
            Self::Severity => RelationName::GoldSeverityDistribution,
            Self::ClinicalMetrics => RelationName::GoldClinicalMetrics,
            Self::FactTable => RelationName::GoldFactTable,
        }
    }

    /// Build this aggregate from clean records
    ///
    /// # Errors
    /// Returns an error if the rows cannot be converted to a record batch
    pub fn build(self, records: &[ValidatedRecord]) -> Result<RecordBatch> {
        match self {
            Self::Demographics => DemographicsRow::to_record_batch(&demographics::build(records)),
            Self::RiskFactors => RiskFactorRow::to_record_batch(&risk_factors::build(records)),
            Self::Severity => SeverityRow::to_record_batch(&severity::build(records)),
            Self::ClinicalMetrics => {
                ClinicalMetricsRow::to_record_batch(&clinical::build(records))
            }
            Self::FactTable => FactRow::to_record_batch(&fact_table::build(records)),
        }
    }
}

/// Output of the aggregation stage, in [`RelationName::GOLD`] order
#[derive(Debug, Clone)]
pub struct AggregationOutput {
    pub tables: Vec<(RelationName, RecordBatch)>,
}

impl AggregationOutput {
    /// Row count per gold relation
    #[must_use]
    pub fn row_counts(&self) -> Vec<(RelationName, usize)> {
        self.tables
            .iter()
            .map(|(name, batch)| (*name, batch.num_rows()))
            .collect()
    }

    /// The batch of one gold relation
    #[must_use]
    pub fn table(&self, relation: RelationName) -> Option<&RecordBatch> {
        self.tables
            .iter()
            .find(|(name, _)| *name == relation)
            .map(|(_, batch)| batch)
    }
}

/// Build all five aggregates in parallel
///
/// # Errors
/// Returns the first conversion error of any aggregate
pub fn aggregate(records: &[ValidatedRecord]) -> Result<AggregationOutput> {
    let start = Instant::now();
    log_stage_start("aggregation");

    let tables = AggregateKind::ALL
        .par_iter()
        .map(|kind| {
            let batch = kind.build(records)?;
            log::debug!("Built {} with {} rows", kind.relation(), batch.num_rows());
            Ok((kind.relation(), batch))
        })
        .collect::<Result<Vec<_>>>()?;

    for (relation, batch) in &tables {
        log::info!("{relation}: {} rows", batch.num_rows());
    }
    log_stage_complete("aggregation", records.len(), start.elapsed());
    Ok(AggregationOutput { tables })
}
