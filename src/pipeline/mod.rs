//! Pipeline orchestration
//!
//! A [`Pipeline`] runs ingestion, cleaning and aggregation in order inside a
//! fresh [`Session`], registers what each stage returns, persists each layer
//! as soon as it exists and reports progress to its observers. The session is
//! released exactly once per run, whether the run finishes, stops early or
//! fails.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::config::WarehouseConfig;
use crate::error::Result;
use crate::models::ValidatedRecord;
use crate::schema::{Layer, RelationName};
use crate::session::Session;
use crate::stages::{IngestionRequest, aggregate, clean, ingest};
use crate::storage::{ArtifactLayout, ObjectStore, Persister};
use crate::utils::logging::{create_spinner, finish_progress_bar};

pub mod export;
pub mod observer;
pub mod report;
pub mod state;

pub use export::export_gold;
pub use observer::{LoggingObserver, RunObserver};
pub use report::{RelationCount, RunReport};
pub use state::{PipelineState, RunMode};

/// Run-level switches that are not part of the warehouse configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Upload artifacts to the object store; otherwise keep local copies only
    pub upload: bool,
    /// Directory receiving CSV exports of the gold relations
    pub export_dir: Option<PathBuf>,
    /// Draw stage spinners
    pub progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            upload: true,
            export_dir: None,
            progress: false,
        }
    }
}

/// Holds the session of a run and releases it on every exit path
struct ActiveRun<'a> {
    session: Session,
    observers: &'a [Box<dyn RunObserver>],
}

impl ActiveRun<'_> {
    fn release(&mut self) {
        if self.session.close() {
            for observer in self.observers {
                observer.on_session_released(self.session.id());
            }
        }
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Sequences the stages of the warehouse
pub struct Pipeline {
    config: WarehouseConfig,
    store: Arc<dyn ObjectStore>,
    persister: Persister,
    options: RunOptions,
    observers: Vec<Box<dyn RunObserver>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("options", &self.options)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline with default options
    ///
    /// # Errors
    /// Returns a configuration or naming error if `config` is invalid; no
    /// stage runs with a configuration that failed validation
    pub fn new(config: WarehouseConfig, store: Arc<dyn ObjectStore>) -> Result<Self> {
        config.validate()?;
        let options = RunOptions::default();
        let persister = Self::persister(&config, &store, &options)?;
        Ok(Self {
            config,
            store,
            persister,
            options,
            observers: Vec::new(),
        })
    }

    fn persister(
        config: &WarehouseConfig,
        store: &Arc<dyn ObjectStore>,
        options: &RunOptions,
    ) -> Result<Persister> {
        let layout = ArtifactLayout::new(
            &config.target_bucket,
            &config.target_base,
            &config.work_dir,
        )?;
        Ok(Persister::new(Arc::clone(store), layout, options.upload))
    }

    /// Replace the run options
    ///
    /// # Errors
    /// Returns a naming error if the artifact layout cannot be rebuilt
    pub fn with_options(mut self, options: RunOptions) -> Result<Self> {
        self.persister = Self::persister(&self.config, &self.store, &options)?;
        self.options = options;
        Ok(self)
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    #[must_use]
    pub const fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run the pipeline in a fresh session
    ///
    /// Every mode starts again from ingestion. On failure the run moves to
    /// [`PipelineState::Failed`], the session is released and observers receive
    /// the final report before the error is returned.
    ///
    /// # Errors
    /// Returns the first fatal error raised by a stage
    pub fn run(&self, mode: RunMode) -> Result<RunReport> {
        let started_at = Utc::now();
        let session_id = format!("run-{}", started_at.format("%Y%m%dT%H%M%S%.6fZ"));
        log::info!("Starting {mode:?} run {session_id}");

        let mut report = RunReport::new(&session_id, mode, started_at);
        let mut state = PipelineState::Idle;
        let mut run = ActiveRun {
            session: Session::open(&session_id),
            observers: &self.observers,
        };

        let result = self.drive(mode, &mut run.session, &mut state, &mut report);
        if let Err(e) = &result {
            log::error!("Run {session_id} failed while {state}: {e}");
            report.record_failure(e);
            if state.is_running() {
                if let Err(transition) = self.advance(&mut state, PipelineState::Failed) {
                    log::error!("{transition}");
                }
            }
        }
        run.release();
        debug_assert!(state.is_terminal(), "run ended in {state}");

        report.state = state;
        report.finish(Utc::now());
        for observer in &self.observers {
            observer.on_run_complete(&report);
        }
        log::info!("Run {session_id} finished in state {state}");
        result.map(|()| report)
    }

    fn advance(&self, state: &mut PipelineState, next: PipelineState) -> Result<()> {
        let from = *state;
        *state = from.transition(next)?;
        log::debug!("Pipeline state {from} -> {next}");
        for observer in &self.observers {
            observer.on_transition(from, next);
        }
        Ok(())
    }

    fn stage_complete(&self, stage: PipelineState, session: &Session) {
        for observer in &self.observers {
            observer.on_stage_complete(stage, session);
        }
    }

    fn drive(
        &self,
        mode: RunMode,
        session: &mut Session,
        state: &mut PipelineState,
        report: &mut RunReport,
    ) -> Result<()> {
        self.advance(state, PipelineState::Ingesting)?;
        self.ingestion_stage(session, report)?;
        self.stage_complete(PipelineState::Ingesting, session);
        if !mode.continues_after(PipelineState::Ingesting) {
            return self.advance(state, PipelineState::Done);
        }

        self.advance(state, PipelineState::Cleaning)?;
        let clean_records = self.cleaning_stage(session, report)?;
        self.stage_complete(PipelineState::Cleaning, session);
        if !mode.continues_after(PipelineState::Cleaning) {
            return self.advance(state, PipelineState::Done);
        }

        self.advance(state, PipelineState::Aggregating)?;
        self.aggregation_stage(&clean_records, session, report)?;
        self.stage_complete(PipelineState::Aggregating, session);
        self.advance(state, PipelineState::Done)
    }

    fn persist(&self, session: &Session, relation: RelationName, report: &mut RunReport) -> Result<()> {
        let outcome = self.persister.persist(relation, session.table(relation)?);
        report.persisted.push(outcome);
        Ok(())
    }

    fn ingestion_stage(&self, session: &mut Session, report: &mut RunReport) -> Result<()> {
        let spinner = create_spinner("Ingesting raw data", self.options.progress);
        let request = IngestionRequest::new(self.config.source_location(), Utc::now());
        let raw = ingest(self.store.as_ref(), &request)?;

        session.create_if_absent(Layer::Bronze, RelationName::BronzeHeartDisease, raw.batch)?;
        report.ingestion = Some(raw.summary);
        self.persist(session, RelationName::BronzeHeartDisease, report)?;

        finish_progress_bar(&spinner, Some("Ingestion complete"));
        Ok(())
    }

    fn cleaning_stage(
        &self,
        session: &mut Session,
        report: &mut RunReport,
    ) -> Result<Vec<ValidatedRecord>> {
        let spinner = create_spinner("Cleaning", self.options.progress);
        let raw = session.table(RelationName::BronzeHeartDisease)?.clone();
        let output = clean(&raw, &self.config.thresholds, self.config.coercion_policy)?;

        for (relation, batch) in output.relations() {
            session.replace(Layer::Silver, relation, batch.clone())?;
        }
        report.quality = Some(output.summary);

        self.persist(session, RelationName::SilverHeartDisease, report)?;
        if output.quarantine.num_rows() > 0 {
            self.persist(session, RelationName::SilverQuarantine, report)?;
        }

        finish_progress_bar(&spinner, Some("Cleaning complete"));
        Ok(output.clean_records)
    }

    fn aggregation_stage(
        &self,
        clean_records: &[ValidatedRecord],
        session: &mut Session,
        report: &mut RunReport,
    ) -> Result<()> {
        let spinner = create_spinner("Building gold aggregates", self.options.progress);
        let output = aggregate(clean_records)?;

        report.aggregates = output
            .row_counts()
            .into_iter()
            .map(|(relation, rows)| RelationCount::new(relation, rows))
            .collect();
        for (relation, batch) in output.tables {
            session.replace(Layer::Gold, relation, batch)?;
        }
        for relation in RelationName::GOLD {
            self.persist(session, relation, report)?;
        }
        if let Some(dir) = &self.options.export_dir {
            report.exported = export_gold(session, dir)?;
        }

        finish_progress_bar(&spinner, Some("Aggregation complete"));
        Ok(())
    }
}
