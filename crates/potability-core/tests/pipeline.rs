//! Integration tests for the potability core
//!
//! Exercises the full load -> validate -> predict path against artifact
//! files on disk.

use potability_core::{
    load_model, InferencePipeline, ModelLoadError, PipelineError, PotabilityLabel,
    FEATURE_COLUMNS,
};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

fn artifact_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn pipeline_from(suffix: &str, content: &str) -> InferencePipeline {
    let file = artifact_file(suffix, content);
    let loaded = load_model(file.path()).unwrap();
    InferencePipeline::new(loaded.model)
}

fn scenario_sample() -> Value {
    json!({
        "ph": 7.0,
        "Hardness": 200,
        "Solids": 10000,
        "Chloramines": 7,
        "Sulfate": 300,
        "Conductivity": 400,
        "Organic_carbon": 10,
        "Trihalomethanes": 60,
        "Turbidity": 4
    })
}

#[test]
fn test_scenario_a_model_returns_one() {
    let pipeline = pipeline_from(".json", r#"{"kind": "constant", "label": 1}"#);
    let label = pipeline.predict_payload(&scenario_sample()).unwrap();
    assert_eq!(label, PotabilityLabel::Consumable);
    assert_eq!(label.to_string(), "Water is Consumable");
}

#[test]
fn test_scenario_b_model_returns_zero() {
    let pipeline = pipeline_from(".json", r#"{"kind": "constant", "label": 0}"#);
    let label = pipeline.predict_payload(&scenario_sample()).unwrap();
    assert_eq!(label.to_string(), "Water is Not Consumable");
}

#[test]
fn test_scenario_c_missing_turbidity() {
    let pipeline = pipeline_from(".json", r#"{"kind": "constant", "label": 1}"#);
    let mut sample = scenario_sample();
    sample.as_object_mut().unwrap().remove("Turbidity");

    match pipeline.predict_payload(&sample) {
        Err(PipelineError::Validation(err)) => {
            let fields: Vec<&str> = err.fields().collect();
            assert_eq!(fields, vec!["Turbidity"]);
            assert_eq!(err.issues()[0].code(), "REQUIRED_FIELD_MISSING");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn test_yaml_decision_tree_with_declared_columns() {
    let mut yaml = String::from("kind: decision_tree\nfeature_names:\n");
    for column in FEATURE_COLUMNS {
        yaml.push_str(&format!("  - {column}\n"));
    }
    // Sulfate (column 4) above 250 is potable.
    yaml.push_str(
        "tree:\n  nodes:\n    - { feature: 4, threshold: 250.0, left: 1, right: 2 }\n    - { probability: 0.2 }\n    - { probability: 0.7 }\n",
    );

    let pipeline = pipeline_from(".yaml", &yaml);
    assert_eq!(
        pipeline.predict_payload(&scenario_sample()).unwrap(),
        PotabilityLabel::Consumable
    );

    let mut low_sulfate = scenario_sample();
    low_sulfate["Sulfate"] = json!(120.5);
    assert_eq!(
        pipeline.predict_payload(&low_sulfate).unwrap(),
        PotabilityLabel::NotConsumable
    );
}

#[test]
fn test_reordered_feature_names_refuse_to_load() {
    let mut columns: Vec<&str> = FEATURE_COLUMNS.to_vec();
    columns.reverse();
    let artifact = json!({
        "kind": "logistic_regression",
        "feature_names": columns,
        "coefficients": vec![0.0; 9],
        "intercept": 0.0
    });

    let file = artifact_file(".json", &artifact.to_string());
    let err = load_model(file.path()).unwrap_err();
    assert!(matches!(err, ModelLoadError::FeatureMismatch { .. }));
}

#[test]
fn test_pickle_artifacts_are_unsupported() {
    let file = artifact_file(".pkl", "\u{80}\u{4}binary");
    let err = load_model(file.path()).unwrap_err();
    assert!(matches!(err, ModelLoadError::UnsupportedFormat(_)));
}

#[test]
fn test_pipeline_is_shareable_across_threads() {
    let pipeline = pipeline_from(
        ".json",
        r#"{"kind": "logistic_regression",
            "coefficients": [1.0, 0, 0, 0, 0, 0, 0, 0, 0],
            "intercept": -6.5}"#,
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = pipeline.clone();
            std::thread::spawn(move || pipeline.predict_payload(&scenario_sample()).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), PotabilityLabel::Consumable);
    }
}
