//! Water Potability Core
//!
//! Validation and inference for the water potability service. Given nine
//! water-quality measurements, decide with a pre-trained binary classifier
//! whether the water is fit to drink.
//!
//! ## Architecture
//!
//! 1. **Sample** (`sample/`): schema validator turning an untyped JSON payload
//!    into a [`WaterSample`], reporting every offending field.
//!
//! 2. **Features** (`features/`): the fixed training column order
//!    [`FEATURE_COLUMNS`] and the single-row [`FeatureVector`].
//!
//! 3. **Model** (`model/`): the [`PredictiveModel`] seam plus the serialized
//!    artifact formats (logistic regression, decision tree, random forest).
//!
//! 4. **Pipeline** (`pipeline/`): vectorize, predict, map to a
//!    [`PotabilityLabel`].
//!
//! Nothing here holds mutable state. A loaded model is read-only and may be
//! shared freely across threads.
//!
//! ## Example
//!
//! ```rust,no_run
//! use potability_core::{load_model, InferencePipeline};
//! use serde_json::json;
//!
//! let loaded = load_model("model.json").expect("model artifact");
//! let pipeline = InferencePipeline::new(loaded.model);
//!
//! let label = pipeline
//!     .predict_payload(&json!({
//!         "ph": 7.0, "Hardness": 200, "Solids": 10000, "Chloramines": 7,
//!         "Sulfate": 300, "Conductivity": 400, "Organic_carbon": 10,
//!         "Trihalomethanes": 60, "Turbidity": 4
//!     }))
//!     .expect("valid sample");
//! println!("{}", label);
//! ```

pub mod error;
pub mod features;
pub mod label;
pub mod model;
pub mod pipeline;
pub mod sample;

pub use error::{
    FieldIssue, FieldIssueKind, InferenceError, ModelError, ModelLoadError, PayloadError,
    PipelineError, ValidationError,
};
pub use features::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
pub use label::PotabilityLabel;
pub use model::{load_model, LoadedModel, ModelArtifact, ModelSummary, PredictiveModel};
pub use pipeline::{predict, InferencePipeline};
pub use sample::{validate, validate_json, WaterSample};
