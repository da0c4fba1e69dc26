use arrow::array::{StringArray, UInt64Array};
use heart_warehouse::config::Bounds;
use heart_warehouse::error::ErrorKind;
use heart_warehouse::models::{ChestPainType, RestingEcg, TypedRecord};
use heart_warehouse::stages::cleaning::{GuardedField, clean, standardize, violation_counts};
use heart_warehouse::{CoercionPolicy, QualityThresholds, WarehouseError};

use crate::utils::{SAMPLE_ROWS, bools, column, ints, raw_batch, strings};

fn clean_sample() -> heart_warehouse::stages::CleaningOutput {
    clean(
        &raw_batch(&SAMPLE_ROWS),
        &QualityThresholds::default(),
        CoercionPolicy::Strict,
    )
    .unwrap()
}

#[test]
fn clean_and_flagged_rows_partition_the_validated_relation() {
    let output = clean_sample();

    assert_eq!(output.typed.num_rows(), 8);
    assert_eq!(output.standardized.num_rows(), 8);
    assert_eq!(output.validated.num_rows(), 8);
    assert_eq!(output.quarantine.num_rows(), 0);

    assert_eq!(output.summary.total, 8);
    assert_eq!(output.summary.flagged, 2);
    assert_eq!(output.summary.clean, 6);
    assert_eq!(output.summary.quarantined, 0);
    assert_eq!(output.summary.flagged + output.summary.clean, output.summary.total);

    let flags = bools(&output.validated, "has_quality_issues");
    let flagged: Vec<usize> = flags
        .iter()
        .enumerate()
        .filter(|(_, f)| **f == Some(true))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(flagged, vec![5, 6]);

    assert_eq!(
        ints(&output.clean, "patient_id"),
        [1, 2, 3, 4, 5, 8].map(Some).to_vec()
    );
    assert!(bools(&output.clean, "has_quality_issues").iter().all(|f| *f == Some(false)));
    assert_eq!(output.clean_records.len(), output.clean.num_rows());
}

#[test]
fn categoricals_are_standardized_in_rule_order() {
    let output = clean_sample();

    let sex = strings(&output.standardized, "sex");
    assert_eq!(
        sex[..5].iter().map(|s| s.as_deref()).collect::<Vec<_>>(),
        vec![Some("Male"); 4]
            .into_iter()
            .chain([Some("Female")])
            .collect::<Vec<_>>()
    );

    // "atypical angina" contains "typical"; "st-t abnormality" contains "normal"
    let chest_pain = strings(&output.standardized, "chest_pain_type");
    assert_eq!(chest_pain[4].as_deref(), Some(ChestPainType::TypicalAngina.label()));
    let ecg = strings(&output.standardized, "resting_ecg");
    assert_eq!(ecg[7].as_deref(), Some(RestingEcg::Normal.label()));

    // Blank thalassemia falls back to Unknown
    let thal = strings(&output.standardized, "thalassemia");
    assert_eq!(thal[5].as_deref(), Some("Unknown"));
}

#[test]
fn heart_disease_flag_follows_severity() {
    let output = clean_sample();
    let severity = ints(&output.standardized, "heart_disease_severity");
    let disease = bools(&output.standardized, "has_heart_disease");
    for (s, d) in severity.iter().zip(&disease) {
        assert_eq!(*d, s.map(|s| s > 0));
    }
}

#[test]
fn derived_columns_are_populated() {
    let output = clean_sample();
    let groups = strings(&output.validated, "age_group");
    assert_eq!(groups[0].as_deref(), Some("60-69"));
    assert_eq!(groups[3].as_deref(), Some("<40"));
    assert_eq!(groups[6].as_deref(), Some("<40"));

    let categories = strings(&output.validated, "max_heart_rate_category");
    assert_eq!(categories[3].as_deref(), Some("Very High"));
    assert_eq!(categories[6].as_deref(), Some("Low"));
}

#[test]
fn strict_coercion_fails_on_the_first_bad_value() {
    let bad = SAMPLE_ROWS[1].replacen("67", "sixty-seven", 1);
    let raw = raw_batch(&[SAMPLE_ROWS[0], &bad, SAMPLE_ROWS[2]]);

    let err = clean(&raw, &QualityThresholds::default(), CoercionPolicy::Strict).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Coercion);
    match err {
        WarehouseError::Coercion {
            row, column, value, ..
        } => {
            assert_eq!(row, 1);
            assert_eq!(column, "age");
            assert_eq!(value, "sixty-seven");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn quarantine_policy_withholds_bad_rows_and_continues() {
    let bad_age = SAMPLE_ROWS[1].replacen("67", "sixty-seven", 1);
    let bad_both = SAMPLE_ROWS[2]
        .replacen("67", "old", 1)
        .replacen("FALSE", "perhaps", 1);
    let raw = raw_batch(&[SAMPLE_ROWS[0], &bad_age, &bad_both, SAMPLE_ROWS[3]]);

    let output = clean(&raw, &QualityThresholds::default(), CoercionPolicy::Quarantine).unwrap();

    assert_eq!(output.typed.num_rows(), 2);
    assert_eq!(output.summary.quarantined, 2);
    assert_eq!(output.quarantine.num_rows(), 3);

    let rows: Vec<u64> = column::<UInt64Array>(&output.quarantine, "source_row")
        .values()
        .to_vec();
    assert_eq!(rows, vec![1, 2, 2]);
    let columns = column::<StringArray>(&output.quarantine, "column_name");
    assert_eq!(columns.value(0), "age");
    assert_eq!(columns.value(2), "fbs");
    let targets = column::<StringArray>(&output.quarantine, "target_type");
    assert_eq!(targets.value(2), "BOOLEAN");
    assert_eq!(strings(&output.quarantine, "raw_patient_id")[1].as_deref(), Some("3"));

    assert_eq!(ints(&output.clean, "patient_id"), vec![Some(1), Some(4)]);
}

#[test]
fn invalid_thresholds_fail_before_any_work() {
    let thresholds = QualityThresholds {
        age: Bounds::new(90.0, 20.0),
        ..QualityThresholds::default()
    };
    let err = clean(&raw_batch(&SAMPLE_ROWS), &thresholds, CoercionPolicy::Strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn missing_source_column_is_a_schema_error() {
    let raw = raw_batch(&SAMPLE_ROWS);
    let index = raw.schema().index_of("chol").unwrap();
    let trimmed = raw.project(
        &(0..raw.num_columns())
            .filter(|i| *i != index)
            .collect::<Vec<_>>(),
    )
    .unwrap();

    let err = clean(&trimmed, &QualityThresholds::default(), CoercionPolicy::Strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn tighter_thresholds_flag_more_rows() {
    let thresholds = QualityThresholds {
        cholesterol: Bounds::new(100.0, 240.0),
        ..QualityThresholds::default()
    };
    let output = clean(&raw_batch(&SAMPLE_ROWS), &thresholds, CoercionPolicy::Strict).unwrap();

    // Rows 2, 4 and 8 exceed 240 on top of the two already flagged
    assert_eq!(output.summary.flagged, 5);
    assert_eq!(ints(&output.clean, "patient_id"), vec![Some(1), Some(3), Some(5)]);
}

#[test]
fn violation_counts_skip_fields_without_violations() {
    let thresholds = QualityThresholds::default();
    assert!(violation_counts(&[], &thresholds).is_empty());

    let records = vec![
        standardize(TypedRecord {
            age: Some(15),
            cholesterol: Some(0),
            ..TypedRecord::default()
        }),
        standardize(TypedRecord {
            cholesterol: Some(650),
            st_depression: Some(1.0),
            ..TypedRecord::default()
        }),
    ];
    assert_eq!(
        violation_counts(&records, &thresholds),
        vec![(GuardedField::Age, 1), (GuardedField::Cholesterol, 2)]
    );
}
