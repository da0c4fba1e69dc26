use heart_warehouse::models::{
    ClinicalMetricsRow, DemographicsRow, RiskFactorRow, SeverityRow, TableRecord, TypedRecord,
    ValidatedRecord,
};
use heart_warehouse::stages::aggregation::{MAX_RISK_SCORE, aggregate, risk_score};
use heart_warehouse::stages::clean;
use heart_warehouse::{CoercionPolicy, QualityThresholds, RelationName};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::utils::{SAMPLE_ROWS, blank_record, ints, raw_batch, validated};

fn clean_records() -> Vec<ValidatedRecord> {
    clean(
        &raw_batch(&SAMPLE_ROWS),
        &QualityThresholds::default(),
        CoercionPolicy::Strict,
    )
    .unwrap()
    .clean_records
}

fn rows<T: TableRecord + serde::de::DeserializeOwned>(
    output: &heart_warehouse::stages::AggregationOutput,
    relation: RelationName,
) -> Vec<T> {
    T::from_record_batch(output.table(relation).unwrap()).unwrap()
}

#[test]
fn every_gold_relation_is_built() {
    let output = aggregate(&clean_records()).unwrap();
    let relations: Vec<RelationName> = output.tables.iter().map(|(r, _)| *r).collect();
    assert_eq!(relations, RelationName::GOLD.to_vec());
    assert_eq!(
        output.row_counts(),
        vec![
            (RelationName::GoldDemographicsSummary, 4),
            (RelationName::GoldRiskFactors, 6),
            (RelationName::GoldSeverityDistribution, 4),
            (RelationName::GoldClinicalMetrics, 3),
            (RelationName::GoldFactTable, 6),
        ]
    );
}

#[test]
fn demographics_are_ordered_by_sex_then_age_group_label() {
    let output = aggregate(&clean_records()).unwrap();
    let demographics: Vec<DemographicsRow> = rows(&output, RelationName::GoldDemographicsSummary);

    let keys: Vec<(&str, &str)> = demographics
        .iter()
        .map(|r| (r.sex.as_str(), r.age_group.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("Female", "40-49"),
            ("Female", "50-59"),
            ("Male", "60-69"),
            ("Male", "<40"),
        ]
    );

    let sixties = &demographics[2];
    assert_eq!(sixties.patient_count, 3);
    assert_eq!(sixties.heart_disease_count, 2);
    assert!((sixties.heart_disease_percentage - 66.67).abs() < 1e-9);
    assert!((sixties.avg_age.unwrap() - 197.0 / 3.0).abs() < 1e-9);
}

#[test]
fn risk_factors_sort_by_risk_keeping_first_appearance_for_ties() {
    let output = aggregate(&clean_records()).unwrap();
    let risk: Vec<RiskFactorRow> = rows(&output, RelationName::GoldRiskFactors);

    let percentages: Vec<f64> = risk.iter().map(|r| r.risk_percentage).collect();
    assert_eq!(percentages, vec![100.0, 100.0, 100.0, 0.0, 0.0, 0.0]);

    // Patients 2, 3 and 8 carry disease; 1, 4 and 5 do not
    let first = &risk[0];
    assert_eq!(first.chest_pain_type, "Asymptomatic");
    assert_eq!(first.thalassemia, "Normal");
    assert_eq!(first.exercise_induced_angina, Some(true));
    assert_eq!(risk[2].resting_ecg, "Normal");
    assert_eq!(risk[3].chest_pain_type, "Typical Angina");
    assert_eq!(risk[3].st_slope, "Downsloping");
    assert_eq!(risk[4].chest_pain_type, "Non-Anginal Pain");
    assert_eq!(risk[5].st_slope, "Upsloping");
    assert!(risk.iter().all(|r| r.patient_count == 1));
}

#[test]
fn severity_distribution_covers_every_clean_row() {
    let output = aggregate(&clean_records()).unwrap();
    let severity: Vec<SeverityRow> = rows(&output, RelationName::GoldSeverityDistribution);

    let codes: Vec<Option<i32>> = severity.iter().map(|r| r.heart_disease_severity).collect();
    assert_eq!(codes, vec![Some(0), Some(1), Some(2), Some(3)]);
    let labels: Vec<Option<&str>> = severity.iter().map(|r| r.severity_label.as_deref()).collect();
    assert_eq!(
        labels,
        vec![Some("No Disease"), Some("Mild"), Some("Moderate"), Some("Severe")]
    );
    assert_eq!(severity[0].patient_count, 3);
    assert!((severity[0].percentage - 50.0).abs() < 1e-9);
    assert!((severity[1].percentage - 16.67).abs() < 1e-9);
    assert!((severity[0].avg_age.unwrap() - 47.0).abs() < 1e-9);
}

#[test]
fn unknown_severity_sorts_last() {
    let mut records = clean_records();
    records.push(blank_record());
    let output = aggregate(&records).unwrap();
    let severity: Vec<SeverityRow> = rows(&output, RelationName::GoldSeverityDistribution);

    let last = severity.last().unwrap();
    assert_eq!(last.heart_disease_severity, None);
    assert_eq!(last.severity_label, None);
    assert_eq!(last.patient_count, 1);
}

#[test]
fn clinical_metrics_by_dataset_and_sex() {
    let output = aggregate(&clean_records()).unwrap();
    let clinical: Vec<ClinicalMetricsRow> = rows(&output, RelationName::GoldClinicalMetrics);

    let keys: Vec<(Option<&str>, &str)> = clinical
        .iter()
        .map(|r| (r.dataset.as_deref(), r.sex.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (Some("Cleveland"), "Female"),
            (Some("Cleveland"), "Male"),
            (Some("VA Long Beach"), "Female"),
        ]
    );

    let male = &clinical[1];
    assert_eq!(male.total_patients, 4);
    assert_eq!(male.min_resting_bp, Some(120));
    assert_eq!(male.max_resting_bp, Some(160));
    assert_eq!(male.median_resting_bp, Some(137.5));
    assert_eq!(male.avg_resting_bp, Some(138.75));
    assert_eq!(male.max_st_depression, Some(3.5));
    assert_eq!(male.high_fasting_sugar_count, 1);
    assert_eq!(male.exercise_angina_count, 2);
}

#[test]
fn fact_table_scores_every_clean_patient() {
    let output = aggregate(&clean_records()).unwrap();
    let facts = output.table(RelationName::GoldFactTable).unwrap();

    assert_eq!(ints(facts, "patient_id"), [1, 2, 3, 4, 5, 8].map(Some).to_vec());
    assert_eq!(
        ints(facts, "calculated_risk_score"),
        [8, 15, 11, 5, 0, 7].map(Some).to_vec()
    );
}

#[test]
fn every_factor_present_reaches_the_maximum() {
    let record = validated(TypedRecord {
        age: Some(70),
        sex: Some("male".to_string()),
        chest_pain_type: Some("asymptomatic".to_string()),
        resting_blood_pressure: Some(180),
        cholesterol: Some(300),
        fasting_blood_sugar_high: Some(true),
        max_heart_rate: Some(100),
        exercise_induced_angina: Some(true),
        st_depression: Some(3.0),
        num_major_vessels: Some(3),
        ..TypedRecord::default()
    });
    assert_eq!(risk_score(&record), MAX_RISK_SCORE);
    assert_eq!(risk_score(&blank_record()), 0);
}

#[test]
fn thresholds_are_strict_inequalities() {
    let record = validated(TypedRecord {
        age: Some(60),
        resting_blood_pressure: Some(140),
        cholesterol: Some(240),
        max_heart_rate: Some(120),
        st_depression: Some(2.0),
        num_major_vessels: Some(1),
        ..TypedRecord::default()
    });
    assert_eq!(risk_score(&record), 0);
}

fn random_record(rng: &mut StdRng) -> ValidatedRecord {
    const SEXES: [&str; 3] = ["Male", "Female", "?"];
    const CHEST_PAIN: [&str; 4] = ["typical angina", "asymptomatic", "non-anginal", "other"];
    const DATASETS: [&str; 3] = ["Cleveland", "Hungary", "Switzerland"];

    let maybe = |rng: &mut StdRng, lo: i32, hi: i32| rng.random_bool(0.8).then(|| rng.random_range(lo..=hi));
    let typed = TypedRecord {
        patient_id: Some(rng.random_range(1..=1000)),
        age: maybe(rng, 20, 90),
        sex: Some(SEXES[rng.random_range(0..SEXES.len())].to_string()),
        dataset: rng
            .random_bool(0.9)
            .then(|| DATASETS[rng.random_range(0..DATASETS.len())].to_string()),
        chest_pain_type: Some(CHEST_PAIN[rng.random_range(0..CHEST_PAIN.len())].to_string()),
        resting_blood_pressure: maybe(rng, 90, 200),
        cholesterol: maybe(rng, 120, 400),
        fasting_blood_sugar_high: rng.random_bool(0.8).then(|| rng.random_bool(0.3)),
        max_heart_rate: maybe(rng, 70, 210),
        exercise_induced_angina: rng.random_bool(0.8).then(|| rng.random_bool(0.4)),
        st_depression: rng.random_bool(0.8).then(|| rng.random_range(0.0..6.0)),
        num_major_vessels: maybe(rng, 0, 3),
        heart_disease_severity: maybe(rng, 0, 4),
        ..TypedRecord::default()
    };
    validated(typed)
}

#[test]
fn aggregates_partition_random_clean_relations() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..20 {
        let n = rng.random_range(1..200);
        let records: Vec<ValidatedRecord> = (0..n).map(|_| random_record(&mut rng)).collect();
        let n = i64::try_from(n).unwrap();

        for record in &records {
            assert!((0..=MAX_RISK_SCORE).contains(&risk_score(record)));
        }

        let output = aggregate(&records).unwrap();
        let demographics: Vec<DemographicsRow> =
            rows(&output, RelationName::GoldDemographicsSummary);
        let risk: Vec<RiskFactorRow> = rows(&output, RelationName::GoldRiskFactors);
        let severity: Vec<SeverityRow> = rows(&output, RelationName::GoldSeverityDistribution);
        let clinical: Vec<ClinicalMetricsRow> = rows(&output, RelationName::GoldClinicalMetrics);

        assert_eq!(demographics.iter().map(|r| r.patient_count).sum::<i64>(), n);
        assert_eq!(risk.iter().map(|r| r.patient_count).sum::<i64>(), n);
        assert_eq!(severity.iter().map(|r| r.patient_count).sum::<i64>(), n);
        assert_eq!(clinical.iter().map(|r| r.total_patients).sum::<i64>(), n);
        assert_eq!(
            output.table(RelationName::GoldFactTable).unwrap().num_rows(),
            records.len()
        );

        let total: f64 = severity.iter().map(|r| r.percentage).sum();
        assert!((total - 100.0).abs() < 0.01 * severity.len() as f64);
        assert!(
            risk.windows(2)
                .all(|w| w[0].risk_percentage >= w[1].risk_percentage)
        );
        for row in &demographics {
            assert!(row.heart_disease_count <= row.patient_count);
            assert!((0.0..=100.0).contains(&row.heart_disease_percentage));
        }
    }
}

#[test]
fn rebuilding_from_the_same_input_is_identical() {
    let records = clean_records();
    let first = aggregate(&records).unwrap();
    let second = aggregate(&records).unwrap();
    for ((_, a), (_, b)) in first.tables.iter().zip(&second.tables) {
        assert_eq!(a, b);
    }
}
