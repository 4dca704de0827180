//! Predictive model abstraction and artifact loading
//!
//! The service treats the model as a read-only black box behind
//! [`PredictiveModel`]. Concrete models come from a serialized artifact
//! loaded once at startup:
//!
//! - `linear` - logistic regression over the nine features
//! - `tree` - single decision tree and random forest (flat node arrays)
//! - `artifact` - the tagged artifact document, format detection and validation
//!
//! # Example
//!
//! ```rust,no_run
//! use potability_core::model::load_model;
//!
//! let loaded = load_model("model.json").expect("model must load before serving");
//! println!("loaded {} model", loaded.summary.kind);
//! ```

pub mod artifact;
pub mod linear;
pub mod tree;

pub use artifact::{ArtifactFormat, ConstantModel, ModelArtifact, ModelSummary};
pub use linear::LogisticRegression;
pub use tree::{DecisionTree, RandomForest, Tree, TreeNode};

use std::path::Path;
use std::sync::Arc;

use crate::error::{ModelError, ModelLoadError};
use crate::features::FeatureVector;

/// A pre-trained binary classifier
///
/// Implementations are immutable after construction and shared across
/// request handlers, hence `Send + Sync`.
#[cfg_attr(test, mockall::automock)]
pub trait PredictiveModel: Send + Sync {
    /// Predict one raw label per input row
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, ModelError>;
}

impl<M: PredictiveModel + ?Sized> PredictiveModel for Arc<M> {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        (**self).predict(rows)
    }
}

/// A model ready to serve, together with its description
#[derive(Clone)]
pub struct LoadedModel {
    pub model: Arc<dyn PredictiveModel>,
    pub summary: ModelSummary,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

/// Load and validate the model artifact at `path`
pub fn load_model(path: impl AsRef<Path>) -> Result<LoadedModel, ModelLoadError> {
    let path = path.as_ref();
    let artifact = ModelArtifact::from_path(path)?;
    let summary = artifact.describe();

    tracing::info!(
        path = %path.display(),
        kind = %summary.kind,
        declares_feature_names = summary.declares_feature_names,
        "Model artifact loaded"
    );

    Ok(LoadedModel {
        model: Arc::new(artifact),
        summary,
    })
}
