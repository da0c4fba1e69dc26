use std::sync::Arc;

use heart_warehouse::error::ErrorKind;
use heart_warehouse::storage::PersistStatus;
use heart_warehouse::utils::io::read_parquet;
use heart_warehouse::{
    CoercionPolicy, LocalObjectStore, Pipeline, PipelineState, RelationName, RunMode, RunOptions,
    WarehouseConfig,
};

use crate::utils::{
    Event, ReadOnlyStore, RecordingObserver, SAMPLE_ROWS, ints, sample_workspace, test_config,
    write_source,
};

fn pipeline(config: WarehouseConfig, observer: &RecordingObserver) -> Pipeline {
    let store = Arc::new(LocalObjectStore::new(&config.storage_root));
    Pipeline::new(config, store)
        .unwrap()
        .with_observer(observer.clone())
}

fn stage_relations(observer: &RecordingObserver, stage: PipelineState) -> Vec<RelationName> {
    observer
        .events()
        .into_iter()
        .find_map(|e| match e {
            Event::StageComplete(s, relations) if s == stage => Some(relations),
            _ => None,
        })
        .unwrap_or_default()
}

#[test]
fn full_run_builds_and_persists_every_layer() {
    let (_dir, config) = sample_workspace();
    let observer = RecordingObserver::default();
    let warehouse = config.storage_root.join(&config.target_bucket).join(&config.target_base);

    let report = pipeline(config, &observer).run(RunMode::Full).unwrap();

    assert!(report.succeeded());
    assert_eq!(report.state, PipelineState::Done);
    assert_eq!(
        observer.states(),
        vec![
            PipelineState::Ingesting,
            PipelineState::Cleaning,
            PipelineState::Aggregating,
            PipelineState::Done,
        ]
    );
    assert_eq!(observer.releases(), 1);
    assert_eq!(
        observer.events().last(),
        Some(&Event::Finished(PipelineState::Done))
    );

    assert_eq!(report.ingestion.as_ref().unwrap().total_records, 8);
    assert_eq!(report.quality.unwrap().clean, 6);
    assert_eq!(report.aggregates.len(), 5);
    assert_eq!(report.persisted.len(), 1 + 1 + 5);
    assert!(report.persisted.iter().all(|o| o.status == PersistStatus::Uploaded));
    assert_eq!(report.persistence_failures().count(), 0);

    let bronze = read_parquet(&warehouse.join("Bronze/bronze_heart_disease.parquet")).unwrap();
    assert_eq!(bronze.num_rows(), 8);
    let clean = read_parquet(&warehouse.join("Silver/silver_heart_disease.parquet")).unwrap();
    assert_eq!(clean.num_rows(), 6);
    assert!(!warehouse.join("Silver/silver_quarantine.parquet").exists());
    let facts = read_parquet(&warehouse.join("Gold/gold_powerbi_fact_table.parquet")).unwrap();
    assert_eq!(
        ints(&facts, "calculated_risk_score"),
        [8, 15, 11, 5, 0, 7].map(Some).to_vec()
    );

    let relations = stage_relations(&observer, PipelineState::Aggregating);
    assert_eq!(relations.len(), RelationName::ALL.len());
}

#[test]
fn bronze_mode_stops_after_ingestion() {
    let (_dir, config) = sample_workspace();
    let observer = RecordingObserver::default();

    let report = pipeline(config, &observer).run(RunMode::IngestOnly).unwrap();

    assert_eq!(
        observer.states(),
        vec![PipelineState::Ingesting, PipelineState::Done]
    );
    assert_eq!(report.state, PipelineState::Done);
    assert!(report.quality.is_none());
    assert!(report.aggregates.is_empty());
    assert_eq!(report.persisted.len(), 1);
    assert_eq!(
        stage_relations(&observer, PipelineState::Ingesting),
        vec![RelationName::BronzeHeartDisease]
    );
    assert_eq!(observer.releases(), 1);
}

#[test]
fn silver_mode_stops_after_cleaning() {
    let (_dir, config) = sample_workspace();
    let observer = RecordingObserver::default();

    let report = pipeline(config, &observer).run(RunMode::ThroughCleaning).unwrap();

    assert_eq!(
        observer.states(),
        vec![
            PipelineState::Ingesting,
            PipelineState::Cleaning,
            PipelineState::Done
        ]
    );
    assert!(report.aggregates.is_empty());
    assert_eq!(report.persisted.len(), 2);
    let relations = stage_relations(&observer, PipelineState::Cleaning);
    assert!(relations.contains(&RelationName::SilverHeartDisease));
    assert!(relations.contains(&RelationName::SilverQuarantine));
    assert!(!relations.iter().any(|r| RelationName::GOLD.contains(r)));
    assert!(stage_relations(&observer, PipelineState::Aggregating).is_empty());
}

#[test]
fn missing_source_fails_the_run_and_releases_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let observer = RecordingObserver::default();

    let err = pipeline(config, &observer).run(RunMode::Full).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceAccess);
    assert_eq!(
        observer.states(),
        vec![PipelineState::Ingesting, PipelineState::Failed]
    );
    assert_eq!(observer.releases(), 1);
    assert_eq!(
        observer.events().last(),
        Some(&Event::Finished(PipelineState::Failed))
    );
}

#[test]
fn coercion_failure_stops_during_cleaning() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let bad = SAMPLE_ROWS[3].replacen("130", "high", 1);
    write_source(&config, &[SAMPLE_ROWS[0], &bad]);
    let observer = RecordingObserver::default();

    let err = pipeline(config, &observer).run(RunMode::Full).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Coercion);
    assert_eq!(
        observer.states(),
        vec![
            PipelineState::Ingesting,
            PipelineState::Cleaning,
            PipelineState::Failed
        ]
    );
    assert_eq!(observer.releases(), 1);
}

#[test]
fn quarantine_policy_persists_the_quarantine_relation() {
    let dir = tempfile::tempdir().unwrap();
    let config = WarehouseConfig {
        coercion_policy: CoercionPolicy::Quarantine,
        ..test_config(dir.path())
    };
    let bad = SAMPLE_ROWS[3].replacen("130", "high", 1);
    write_source(&config, &[SAMPLE_ROWS[0], &bad, SAMPLE_ROWS[1]]);
    let observer = RecordingObserver::default();

    let report = pipeline(config, &observer).run(RunMode::ThroughCleaning).unwrap();

    let quality = report.quality.unwrap();
    assert_eq!(quality.quarantined, 1);
    assert_eq!(quality.total, 2);
    assert!(
        report
            .persisted
            .iter()
            .any(|o| o.relation == RelationName::SilverQuarantine.as_str())
    );
}

#[test]
fn failed_uploads_fall_back_to_local_copies() {
    let (_dir, config) = sample_workspace();
    let work_dir = config.work_dir.clone();
    let store = Arc::new(ReadOnlyStore::new(&config.storage_root));
    let observer = RecordingObserver::default();

    let report = Pipeline::new(config, store)
        .unwrap()
        .with_observer(observer.clone())
        .run(RunMode::Full)
        .unwrap();

    assert!(report.succeeded());
    assert_eq!(report.persistence_failures().count(), 7);
    for outcome in &report.persisted {
        assert_eq!(outcome.status, PersistStatus::KeptLocally);
        assert!(outcome.error.as_deref().unwrap().contains("read-only"));
        assert!(outcome.local_copy.as_ref().unwrap().exists());
    }
    assert!(work_dir.join("Gold/gold_risk_factors.parquet").exists());
    assert_eq!(observer.releases(), 1);
}

#[test]
fn disabled_upload_keeps_local_copies_without_errors() {
    let (_dir, config) = sample_workspace();
    let observer = RecordingObserver::default();
    let options = RunOptions {
        upload: false,
        ..RunOptions::default()
    };

    let report = pipeline(config, &observer)
        .with_options(options)
        .unwrap()
        .run(RunMode::IngestOnly)
        .unwrap();

    let outcome = &report.persisted[0];
    assert_eq!(outcome.status, PersistStatus::KeptLocally);
    assert!(outcome.error.is_none());
}

#[test]
fn export_writes_one_csv_per_gold_relation() {
    let (dir, config) = sample_workspace();
    let export_dir = dir.path().join("export");
    let observer = RecordingObserver::default();
    let options = RunOptions {
        export_dir: Some(export_dir.clone()),
        ..RunOptions::default()
    };

    let report = pipeline(config, &observer)
        .with_options(options)
        .unwrap()
        .run(RunMode::Full)
        .unwrap();

    assert_eq!(report.exported.len(), RelationName::GOLD.len());
    for relation in RelationName::GOLD {
        let path = export_dir.join(format!("{relation}.csv"));
        assert!(path.exists(), "{}", path.display());
    }
    let severity =
        std::fs::read_to_string(export_dir.join("gold_severity_distribution.csv")).unwrap();
    assert!(severity.starts_with("heart_disease_severity,severity_label"));
    assert_eq!(severity.lines().count(), 1 + 4);
}

#[test]
fn invalid_configuration_is_rejected_before_any_stage() {
    let dir = tempfile::tempdir().unwrap();
    let config = WarehouseConfig {
        target_base: "bad name; drop".to_string(),
        ..test_config(dir.path())
    };
    let store = Arc::new(LocalObjectStore::new(&config.storage_root));

    let err = Pipeline::new(config, store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NamingSafety);
}

#[test]
fn report_serializes_to_json() {
    let (_dir, config) = sample_workspace();
    let observer = RecordingObserver::default();

    let report = pipeline(config, &observer).run(RunMode::IngestOnly).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["state"], "done");
    assert_eq!(json["ingestion"]["total_records"], 8);
    assert!(json["error"].is_null());
    assert!(report.to_string().contains("Raw records: 8"));
}
