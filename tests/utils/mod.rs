use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arrow::array::{Array, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use heart_warehouse::models::{TypedRecord, ValidatedRecord};
use heart_warehouse::pipeline::{PipelineState, RunObserver, RunReport};
use heart_warehouse::session::Session;
use heart_warehouse::stages::cleaning::standardize;
use heart_warehouse::stages::ingestion::{IngestionRequest, ingest};
use heart_warehouse::storage::{LocalObjectStore, ObjectLocation, ObjectStore};
use heart_warehouse::utils::io::DelimitedFormat;
use heart_warehouse::{RelationName, Result, WarehouseConfig, WarehouseError};
use tempfile::TempDir;

/// Header of the heart disease source file
pub const SOURCE_HEADER: &str =
    "id,age,sex,dataset,cp,trestbps,chol,fbs,restecg,thalch,exang,oldpeak,slope,ca,thal,num";

/// Eight source rows: six clean, one with cholesterol 0 and one aged 15 with
/// missing blood pressure and cholesterol
pub const SAMPLE_ROWS: [&str; 8] = [
    "1,63,Male,Cleveland,typical angina,145,233,TRUE,lv hypertrophy,150,FALSE,2.3,downsloping,0,fixed defect,0",
    "2,67,Male,Cleveland,asymptomatic,160,286,FALSE,lv hypertrophy,108,TRUE,1.5,flat,3,normal,2",
    "3,67,Male,Cleveland,asymptomatic,120,229,FALSE,lv hypertrophy,129,TRUE,2.6,flat,2,reversable defect,1",
    "4,37,Male,Cleveland,non-anginal,130,250,FALSE,normal,187,FALSE,3.5,downsloping,0,normal,0",
    "5,41,Female,Cleveland,atypical angina,130,204,FALSE,lv hypertrophy,172,FALSE,1.4,upsloping,0,normal,0",
    "6,56,Male,Hungary,atypical angina,120,0,FALSE,normal,178,FALSE,0.8,upsloping,,,0",
    "7,15,Female,Switzerland,asymptomatic,,,,normal,,,,,,,1",
    "8,57,Female,VA Long Beach,asymptomatic,140,241,TRUE,st-t abnormality,123,TRUE,0.2,flat,0,reversable defect,3",
];

/// Render a source file from data rows
#[must_use]
pub fn source_csv(rows: &[&str]) -> String {
    let mut text = String::from(SOURCE_HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text
}

/// Configuration rooted in a scratch directory
#[must_use]
pub fn test_config(dir: &Path) -> WarehouseConfig {
    WarehouseConfig {
        storage_root: dir.join("storage"),
        work_dir: dir.join("work"),
        ..WarehouseConfig::default()
    }
}

/// Write `rows` as the configured source object
pub fn write_source(config: &WarehouseConfig, rows: &[&str]) -> PathBuf {
    let path = config
        .storage_root
        .join(&config.source_bucket)
        .join(&config.source_key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, source_csv(rows)).unwrap();
    path
}

/// A scratch directory with the sample source in place
#[must_use]
pub fn sample_workspace() -> (TempDir, WarehouseConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_source(&config, &SAMPLE_ROWS);
    (dir, config)
}

/// Ingest `rows` from a scratch workspace and return the raw relation
#[must_use]
pub fn raw_batch(rows: &[&str]) -> RecordBatch {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_source(&config, rows);
    let store = LocalObjectStore::new(&config.storage_root);
    let request = IngestionRequest::new(config.source_location(), Utc::now());
    ingest(&store, &request).unwrap().batch
}

/// A validated record with every measurement missing
#[must_use]
pub fn blank_record() -> ValidatedRecord {
    ValidatedRecord::from_standardized(standardize(TypedRecord::default()), false)
}

/// Build a validated record from a typed one, leaving it unflagged
#[must_use]
pub fn validated(typed: TypedRecord) -> ValidatedRecord {
    ValidatedRecord::from_standardized(standardize(typed), false)
}

/// Object store that reads from disk but refuses every write
#[derive(Debug)]
pub struct ReadOnlyStore {
    inner: LocalObjectStore,
}

impl ReadOnlyStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: LocalObjectStore::new(root),
        }
    }
}

impl ObjectStore for ReadOnlyStore {
    fn exists(&self, location: &ObjectLocation) -> Result<bool> {
        self.inner.exists(location)
    }

    fn read_table(&self, location: &ObjectLocation, format: DelimitedFormat) -> Result<RecordBatch> {
        self.inner.read_table(location, format)
    }

    fn write(&self, _batch: &RecordBatch, destination: &ObjectLocation) -> Result<()> {
        Err(WarehouseError::Persistence {
            artifact: destination.to_string(),
            reason: "bucket is read-only".to_string(),
        })
    }
}

/// A pipeline event seen by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Transition(PipelineState, PipelineState),
    StageComplete(PipelineState, Vec<RelationName>),
    Released(String),
    Finished(PipelineState),
}

/// Records every observer callback
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    #[must_use]
    pub fn releases(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Released(_)))
            .count()
    }

    #[must_use]
    pub fn states(&self) -> Vec<PipelineState> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::Transition(_, to) => Some(*to),
                _ => None,
            })
            .collect()
    }
}

impl RunObserver for RecordingObserver {
    fn on_transition(&self, from: PipelineState, to: PipelineState) {
        self.events.lock().unwrap().push(Event::Transition(from, to));
    }

    fn on_stage_complete(&self, stage: PipelineState, session: &Session) {
        self.events
            .lock()
            .unwrap()
            .push(Event::StageComplete(stage, session.relation_names()));
    }

    fn on_session_released(&self, session_id: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Released(session_id.to_string()));
    }

    fn on_run_complete(&self, report: &RunReport) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Finished(report.state));
    }
}

/// Column of `batch` downcast to `A`
#[must_use]
pub fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> &'a A {
    batch
        .column_by_name(name)
        .unwrap_or_else(|| panic!("missing column {name}"))
        .as_any()
        .downcast_ref::<A>()
        .unwrap_or_else(|| panic!("column {name} has type {}", batch.schema().field_with_name(name).unwrap().data_type()))
}

#[must_use]
pub fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    column::<StringArray>(batch, name)
        .iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

#[must_use]
pub fn ints(batch: &RecordBatch, name: &str) -> Vec<Option<i32>> {
    column::<Int32Array>(batch, name).iter().collect()
}

#[must_use]
pub fn longs(batch: &RecordBatch, name: &str) -> Vec<Option<i64>> {
    column::<Int64Array>(batch, name).iter().collect()
}

#[must_use]
pub fn floats(batch: &RecordBatch, name: &str) -> Vec<Option<f64>> {
    column::<Float64Array>(batch, name).iter().collect()
}

#[must_use]
pub fn bools(batch: &RecordBatch, name: &str) -> Vec<Option<bool>> {
    column::<BooleanArray>(batch, name).iter().collect()
}
