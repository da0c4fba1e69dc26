//! Console rendering of run progress and reports

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::pipeline::{PipelineState, RunObserver, RunReport};
use crate::report;
use crate::session::Session;
use crate::utils::logging::console::{print_section, print_titled_batch};

/// Prints the stage reports as tables once each stage completes
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    /// Also print the run summary at the end
    pub summary: bool,
}

impl ConsoleReporter {
    #[must_use]
    pub const fn new(summary: bool) -> Self {
        Self { summary }
    }

    fn print(title: &str, batch: Result<RecordBatch>) {
        if let Err(e) = batch.and_then(|batch| print_titled_batch(title, &batch)) {
            log::warn!("Could not render {title}: {e}");
        }
    }

    fn ingestion(session: &Session) {
        match report::ingestion_summary(session) {
            Ok(summary) => {
                print_section("Bronze Layer");
                println!("Total records ingested: {}", summary.total_records);
                println!("Distinct patients: {}", summary.distinct_patients);
                if let Some(at) = summary.ingested_at {
                    println!("Ingested at: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
                }
            }
            Err(e) => log::warn!("Could not summarize ingestion: {e}"),
        }
    }

    fn cleaning(session: &Session) {
        print_section("Silver Layer");
        Self::print(
            "Standardization Sample",
            report::standardization_sample(session),
        );
        Self::print("Data Quality Report", report::data_quality_report(session));
        Self::print("Age Group Distribution", report::age_distribution(session));
    }

    fn aggregation(session: &Session) {
        print_section("Gold Layer");
        Self::print(
            "Demographics Summary Sample",
            report::demographics_sample(session),
        );
        Self::print("Top Risk Factors", report::top_risk_factors(session));
        Self::print(
            "Severity Distribution",
            report::severity_distribution(session),
        );
        Self::print("Record Counts", report::record_counts(session));
    }
}

impl RunObserver for ConsoleReporter {
    fn on_stage_complete(&self, stage: PipelineState, session: &Session) {
        match stage {
            PipelineState::Ingesting => Self::ingestion(session),
            PipelineState::Cleaning => Self::cleaning(session),
            PipelineState::Aggregating => Self::aggregation(session),
            _ => {}
        }
    }

    fn on_run_complete(&self, report: &RunReport) {
        if self.summary {
            print_section("Run Summary");
            print!("{report}");
        }
    }
}
