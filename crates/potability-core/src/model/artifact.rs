//! Serialized model artifacts
//!
//! An artifact is a tagged document selected by its `kind` field:
//!
//! ```json
//! { "kind": "logistic_regression",
//!   "feature_names": ["ph", "Hardness", "Solids", "Chloramines", "Sulfate",
//!                     "Conductivity", "Organic_carbon", "Trihalomethanes", "Turbidity"],
//!   "coefficients": [0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.2],
//!   "intercept": -0.3 }
//! ```
//!
//! Files ending in `.yaml`/`.yml` are read as YAML, everything else as JSON.
//! Artifacts are validated before they are handed out, so a malformed model
//! fails at startup instead of on the first request.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::linear::LogisticRegression;
use super::tree::{DecisionTree, RandomForest};
use super::PredictiveModel;
use crate::error::{ModelError, ModelLoadError};
use crate::features::{FeatureVector, FEATURE_COLUMNS};

/// Serialization format of an artifact file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Yaml,
}

impl ArtifactFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, ModelLoadError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            None => Ok(ArtifactFormat::Json),
            Some(ext) => match ext.to_ascii_lowercase().as_str() {
                "json" => Ok(ArtifactFormat::Json),
                "yaml" | "yml" => Ok(ArtifactFormat::Yaml),
                other => Err(ModelLoadError::UnsupportedFormat(other.to_string())),
            },
        }
    }
}

/// Model that always predicts the same raw label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantModel {
    pub label: f64,
}

/// A deserialized, validated model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    Constant(ConstantModel),
}

/// Description of a loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub kind: String,
    /// Column order rows are fed in
    pub feature_columns: Vec<String>,
    /// Whether the artifact recorded its training columns
    pub declares_feature_names: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl ModelArtifact {
    /// Read, parse and validate an artifact file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let format = ArtifactFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, format)
    }

    /// Parse and validate an artifact document
    pub fn parse(content: &str, format: ArtifactFormat) -> Result<Self, ModelLoadError> {
        let artifact: ModelArtifact = match format {
            ArtifactFormat::Json => serde_json::from_str(content)?,
            ArtifactFormat::Yaml => serde_yaml::from_str(content)?,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::LogisticRegression(_) => "logistic_regression",
            ModelArtifact::DecisionTree(_) => "decision_tree",
            ModelArtifact::RandomForest(_) => "random_forest",
            ModelArtifact::Constant(_) => "constant",
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        match self {
            ModelArtifact::LogisticRegression(m) => m.feature_names.as_deref(),
            ModelArtifact::DecisionTree(m) => m.feature_names.as_deref(),
            ModelArtifact::RandomForest(m) => m.feature_names.as_deref(),
            ModelArtifact::Constant(_) => None,
        }
    }

    /// Check structure and, when recorded, the training column order
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if let Some(found) = self.feature_names() {
            if found.iter().map(String::as_str).ne(FEATURE_COLUMNS.iter().copied()) {
                return Err(ModelLoadError::FeatureMismatch {
                    expected: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                    found: found.to_vec(),
                });
            }
        }

        match self {
            ModelArtifact::LogisticRegression(m) => m.validate(),
            ModelArtifact::DecisionTree(m) => m.validate(),
            ModelArtifact::RandomForest(m) => m.validate(),
            ModelArtifact::Constant(m) => {
                if m.label.is_finite() {
                    Ok(())
                } else {
                    Err(ModelLoadError::invalid("constant label must be finite"))
                }
            }
        }
    }

    pub fn describe(&self) -> ModelSummary {
        let (tree_count, threshold) = match self {
            ModelArtifact::LogisticRegression(m) => (None, Some(m.threshold)),
            ModelArtifact::DecisionTree(_) => (Some(1), None),
            ModelArtifact::RandomForest(m) => (Some(m.trees.len()), None),
            ModelArtifact::Constant(_) => (None, None),
        };

        ModelSummary {
            kind: self.kind().to_string(),
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            declares_feature_names: self.feature_names().is_some(),
            tree_count,
            threshold,
        }
    }

    fn predict_row(&self, row: &FeatureVector) -> Result<f64, ModelError> {
        match self {
            ModelArtifact::LogisticRegression(m) => m.predict_row(row),
            ModelArtifact::DecisionTree(m) => m.predict_row(row),
            ModelArtifact::RandomForest(m) => m.predict_row(row),
            ModelArtifact::Constant(m) => Ok(m.label),
        }
    }
}

impl PredictiveModel for ModelArtifact {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Tree, TreeNode};
    use std::io::Write;

    const FOREST_YAML: &str = r#"
kind: random_forest
trees:
  - nodes:
      - { feature: 0, threshold: 6.5, left: 1, right: 2 }
      - { probability: 0.1 }
      - { probability: 0.9 }
  - nodes:
      - { feature: 8, threshold: 5.0, left: 1, right: 2 }
      - { probability: 0.8 }
      - { probability: 0.3 }
"#;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ArtifactFormat::from_path(Path::new("model.json")).unwrap(),
            ArtifactFormat::Json
        );
        assert_eq!(
            ArtifactFormat::from_path(Path::new("model.YML")).unwrap(),
            ArtifactFormat::Yaml
        );
        assert_eq!(
            ArtifactFormat::from_path(Path::new("model")).unwrap(),
            ArtifactFormat::Json
        );
        assert!(matches!(
            ArtifactFormat::from_path(Path::new("model.pkl")),
            Err(ModelLoadError::UnsupportedFormat(ext)) if ext == "pkl"
        ));
    }

    #[test]
    fn test_parse_yaml_forest() {
        let artifact = ModelArtifact::parse(FOREST_YAML, ArtifactFormat::Yaml).unwrap();
        assert_eq!(artifact.kind(), "random_forest");

        let summary = artifact.describe();
        assert_eq!(summary.tree_count, Some(2));
        assert!(!summary.declares_feature_names);
        assert_eq!(summary.feature_columns.len(), 9);

        // ph 7 (0.9) and turbidity 4 (0.8): mean 0.85
        let row = FeatureVector::from_columns([7.0, 200.0, 1e4, 7.0, 300.0, 400.0, 10.0, 60.0, 4.0]);
        assert_eq!(artifact.predict(&[row]).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_from_path_json() {
        let file = write_temp(
            ".json",
            r#"{"kind": "logistic_regression",
                "coefficients": [0, 0, 0, 0, 0, 0, 0, 0, 0],
                "intercept": 2.0}"#,
        );
        let artifact = ModelArtifact::from_path(file.path()).unwrap();
        assert_eq!(artifact.describe().threshold, Some(0.5));

        let row = FeatureVector::from_columns([0.0; 9]);
        assert_eq!(artifact.predict(&[row, row]).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_feature_names_must_match_column_order() {
        let mut names: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        let artifact = ModelArtifact::DecisionTree(DecisionTree {
            feature_names: Some(names.clone()),
            tree: Tree {
                nodes: vec![TreeNode::Leaf { probability: 1.0 }],
            },
        });
        assert!(artifact.validate().is_ok());
        assert!(artifact.describe().declares_feature_names);

        names.swap(1, 2);
        let swapped = ModelArtifact::DecisionTree(DecisionTree {
            feature_names: Some(names),
            tree: Tree {
                nodes: vec![TreeNode::Leaf { probability: 1.0 }],
            },
        });
        assert!(matches!(
            swapped.validate(),
            Err(ModelLoadError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_kind_and_garbage() {
        assert!(matches!(
            ModelArtifact::parse(r#"{"kind": "svm"}"#, ArtifactFormat::Json),
            Err(ModelLoadError::Parse(_))
        ));
        assert!(matches!(
            ModelArtifact::parse("not json", ArtifactFormat::Json),
            Err(ModelLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_runs_structural_validation() {
        let err = ModelArtifact::parse(
            r#"{"kind": "random_forest", "trees": []}"#,
            ArtifactFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, ModelLoadError::Invalid(_)));
    }

    #[test]
    fn test_constant_model() {
        let artifact =
            ModelArtifact::parse(r#"{"kind": "constant", "label": 0}"#, ArtifactFormat::Json)
                .unwrap();
        let row = FeatureVector::from_columns([1.0; 9]);
        assert_eq!(artifact.predict(&[row]).unwrap(), vec![0.0]);
        assert!(artifact.predict(&[]).unwrap().is_empty());
    }
}
