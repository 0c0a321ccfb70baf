//! End-to-end: survey CSV -> balanced stratified split -> JSON artifacts.

use std::fmt::Write as _;
use std::fs;

use asthma_io::{ArtifactName, ArtifactWriter, FeatureOrder, SurveyReader, read_feature_order};
use asthma_resample::{Smote, StratifiedSplit};
use tempfile::TempDir;

/// 120 patients, one in five diagnosed, with the columns shuffled and extras added.
fn write_survey(dir: &TempDir) -> std::path::PathBuf {
    let mut csv = String::from(
        "PatientID,Diagnosis,Gender,DietQuality,Age,SleepQuality,PollenExposure,\
         DustExposure,PollutionExposure,PhysicalActivity,Smoking\n",
    );
    for i in 0..120 {
        let diagnosis = usize::from(i % 5 == 0);
        let age = 5 + (i * 13) % 76;
        let s = |k: usize| ((i * k + diagnosis * 4) % 10) as f64;
        writeln!(
            csv,
            "{},{diagnosis},{},{},{age},{},{},{},{},{},0",
            5000 + i,
            i % 2,
            s(3),
            s(7),
            s(2),
            s(9),
            s(1),
            s(5),
        )
        .unwrap();
    }
    let path = dir.path().join("asthma_disease_data.csv");
    fs::write(&path, csv).unwrap();
    path
}

#[test]
fn survey_to_artifacts_round_trip() {
    let dir = TempDir::new().unwrap();
    let dataset = SurveyReader::new(&write_survey(&dir)).read().unwrap();
    assert_eq!(dataset.n_samples(), 120);
    assert_eq!(dataset.class_distribution(), vec![(0, 0.8), (1, 0.2)]);

    let (order, features, labels) = dataset.into_parts();
    assert!(features.iter().all(|r| r.len() == 7));
    // Age is always the first model column regardless of file layout.
    assert!(features.iter().all(|r| (5.0..=80.0).contains(&r[0])));

    let balanced = Smote::default().fit_resample(&features, &labels).unwrap();
    assert_eq!(balanced.labels.len(), 192);
    let split = StratifiedSplit::default().split(&balanced.labels).unwrap();
    assert_eq!(split.test.len(), 39);

    let out = dir.path().join("artifacts");
    let writer = ArtifactWriter::new(&out, ArtifactName::new("survey_rt".into()).unwrap()).unwrap();
    writer.write_feature_order(&order).unwrap();
    writer
        .write_evaluation(&serde_json::json!({
            "n_train": split.train.len(),
            "n_test": split.test.len(),
        }))
        .unwrap();

    assert_eq!(read_feature_order(&out, writer.name()).unwrap(), FeatureOrder::selected());
    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(writer.evaluation_path()).unwrap()).unwrap();
    assert_eq!(content["artifact"], "survey_rt");
    assert_eq!(content["evaluation"]["n_train"], 153);
    assert_eq!(content["evaluation"]["n_test"], 39);
}

#[test]
fn distinct_names_do_not_clobber_each_other() {
    let dir = TempDir::new().unwrap();
    for name in ["run_a", "run_b"] {
        let w = ArtifactWriter::new(dir.path(), ArtifactName::new(name.into()).unwrap()).unwrap();
        w.write_feature_order(&FeatureOrder::new(vec![name.into()]).unwrap())
            .unwrap();
    }
    for name in ["run_a", "run_b"] {
        let order = read_feature_order(dir.path(), &ArtifactName::new(name.into()).unwrap()).unwrap();
        assert_eq!(order.names(), &[name.to_string()]);
    }
}
