//! Inference pipeline
//!
//! Single pass, no state: vectorize the sample in [`FEATURE_COLUMNS`] order,
//! ask the model for exactly one prediction, map it to a label.
//!
//! [`FEATURE_COLUMNS`]: crate::features::FEATURE_COLUMNS

use serde_json::Value;
use std::sync::Arc;

use crate::error::{InferenceError, PipelineError};
use crate::features::FeatureVector;
use crate::label::PotabilityLabel;
use crate::model::PredictiveModel;
use crate::sample::{self, WaterSample};

/// Predict the potability of a validated sample
pub fn predict(
    sample: &WaterSample,
    model: &dyn PredictiveModel,
) -> Result<PotabilityLabel, InferenceError> {
    let row = FeatureVector::from(sample);
    let outputs = model.predict(std::slice::from_ref(&row))?;

    let raw = match outputs.as_slice() {
        [] => return Err(InferenceError::EmptyOutput),
        [raw] => *raw,
        many => return Err(InferenceError::UnexpectedOutputLength(many.len())),
    };

    let label = PotabilityLabel::from_model_output(raw)?;
    tracing::debug!(raw, label = label.as_str(), "Model prediction mapped");
    Ok(label)
}

/// Shared, read-only handle on a loaded model
#[derive(Clone)]
pub struct InferencePipeline {
    model: Arc<dyn PredictiveModel>,
}

impl InferencePipeline {
    pub fn new(model: Arc<dyn PredictiveModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Arc<dyn PredictiveModel> {
        &self.model
    }

    pub fn predict_sample(&self, sample: &WaterSample) -> Result<PotabilityLabel, InferenceError> {
        predict(sample, self.model.as_ref())
    }

    /// Validate an untyped payload, then predict
    ///
    /// The model is not consulted when validation fails.
    pub fn predict_payload(&self, payload: &Value) -> Result<PotabilityLabel, PipelineError> {
        let sample = sample::validate(payload)?;
        Ok(self.predict_sample(&sample)?)
    }
}

impl std::fmt::Debug for InferencePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferencePipeline").finish_non_exhaustive()
    }
}
