use std::sync::Arc;

use heart_warehouse::storage::{ArtifactLayout, PersistStatus, Persister};
use heart_warehouse::utils::io::read_parquet;
use heart_warehouse::{LocalObjectStore, ObjectStore, RelationName};

use crate::utils::{ReadOnlyStore, SAMPLE_ROWS, raw_batch, strings};

#[test]
fn destinations_follow_the_layer_prefixes() {
    let layout = ArtifactLayout::new("data-endpoint", "Health_data", "/tmp/work").unwrap();

    assert_eq!(
        layout.destination(RelationName::GoldRiskFactors).unwrap().to_string(),
        "s3://data-endpoint/Health_data/Gold/gold_risk_factors.parquet"
    );
    assert_eq!(
        layout.destination(RelationName::SilverHeartDisease).unwrap().key,
        "Health_data/Silver/silver_heart_disease.parquet"
    );
    assert_eq!(
        layout.local_path(RelationName::BronzeHeartDisease).unwrap(),
        std::path::PathBuf::from("/tmp/work/Bronze/bronze_heart_disease.parquet")
    );
    assert!(ArtifactLayout::new("data-endpoint", "Health data", "/tmp/work").is_err());
}

#[test]
fn uploaded_artifacts_read_back_intact() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(dir.path().join("store")));
    let layout = ArtifactLayout::new("bucket", "Health_data", dir.path().join("work")).unwrap();
    let persister = Persister::new(Arc::clone(&store), layout, true);
    let batch = raw_batch(&SAMPLE_ROWS);

    let outcome = persister.persist(RelationName::BronzeHeartDisease, &batch);

    assert_eq!(outcome.status, PersistStatus::Uploaded);
    assert_eq!(outcome.rows, 8);
    assert!(outcome.local_copy.is_none());
    let path = dir
        .path()
        .join("store/bucket/Health_data/Bronze/bronze_heart_disease.parquet");
    let stored = read_parquet(&path).unwrap();
    assert_eq!(stored.num_rows(), batch.num_rows());
    for name in ["id", "cp", "source_identifier"] {
        assert_eq!(strings(&stored, name), strings(&batch, name));
    }
    assert!(!path.with_extension("parquet.partial").exists());
}

#[test]
fn failed_upload_and_failed_local_copy_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let layout = ArtifactLayout::new("bucket", "Health_data", blocker.join("work")).unwrap();
    let persister = Persister::new(Arc::new(ReadOnlyStore::new(dir.path())), layout, true);

    let outcome = persister.persist(RelationName::GoldFactTable, &raw_batch(&SAMPLE_ROWS[..2]));

    assert_eq!(outcome.status, PersistStatus::Failed);
    let error = outcome.error.unwrap();
    assert!(error.contains("read-only"));
    assert!(error.contains("local copy failed"));
}

#[test]
fn persist_all_keeps_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new("bucket", "Health_data", dir.path()).unwrap();
    let persister = Persister::new(
        Arc::new(LocalObjectStore::new(dir.path().join("store"))),
        layout,
        false,
    );
    let batch = raw_batch(&SAMPLE_ROWS[..1]);

    let outcomes = persister.persist_all([
        (RelationName::GoldSeverityDistribution, &batch),
        (RelationName::GoldDemographicsSummary, &batch),
    ]);

    let relations: Vec<&str> = outcomes.iter().map(|o| o.relation.as_str()).collect();
    assert_eq!(
        relations,
        vec!["gold_severity_distribution", "gold_demographics_summary"]
    );
    assert!(outcomes.iter().all(|o| o.status == PersistStatus::KeptLocally));
}
