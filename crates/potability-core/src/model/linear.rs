//! Logistic regression classifier

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelLoadError};
use crate::features::{FeatureVector, FEATURE_COUNT};

fn default_threshold() -> f64 {
    0.5
}

/// Binary logistic regression: `sigmoid(w . x + b) >= threshold` predicts `1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Column names the model was trained on, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    /// One weight per feature, in column order
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticRegression {
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelLoadError::invalid(format!(
                "logistic regression needs {} coefficients, found {}",
                FEATURE_COUNT,
                self.coefficients.len()
            )));
        }
        if self.coefficients.iter().any(|w| !w.is_finite()) || !self.intercept.is_finite() {
            return Err(ModelLoadError::invalid(
                "logistic regression weights must be finite",
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelLoadError::invalid(format!(
                "decision threshold {} is outside [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Probability of the potable class
    pub fn probability(&self, row: &FeatureVector) -> Result<f64, ModelError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                actual: FEATURE_COUNT,
            });
        }

        let z = self
            .coefficients
            .iter()
            .zip(row.as_slice())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;

        Ok(sigmoid(z))
    }

    pub fn predict_row(&self, row: &FeatureVector) -> Result<f64, ModelError> {
        let p = self.probability(row)?;
        if p.is_nan() {
            return Err(ModelError::Other("decision function is NaN".to_string()));
        }
        Ok(if p >= self.threshold { 1.0 } else { 0.0 })
    }
}

// Split on sign so exp never overflows.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(coefficients: Vec<f64>, intercept: f64) -> LogisticRegression {
        LogisticRegression {
            feature_names: None,
            coefficients,
            intercept,
            threshold: 0.5,
        }
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(1000.0) > 0.999);
        assert!(sigmoid(-1000.0) < 0.001);
        assert!(sigmoid(-1000.0).is_finite());
    }

    #[test]
    fn test_predict_uses_threshold() {
        // Only ph carries weight: ph above 7 is potable.
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[0] = 1.0;
        let lr = model(weights, -7.0);

        let acidic = FeatureVector::from_columns([5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let basic = FeatureVector::from_columns([9.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(lr.predict_row(&acidic).unwrap(), 0.0);
        assert_eq!(lr.predict_row(&basic).unwrap(), 1.0);
    }

    #[test]
    fn test_validate_rejects_wrong_arity() {
        let lr = model(vec![0.1; 8], 0.0);
        assert!(lr.validate().is_err());

        let row = FeatureVector::from_columns([0.0; FEATURE_COUNT]);
        assert!(matches!(
            lr.predict_row(&row),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_threshold_and_weights() {
        let mut lr = model(vec![0.0; FEATURE_COUNT], 0.0);
        lr.threshold = 1.5;
        assert!(lr.validate().is_err());

        let mut lr = model(vec![0.0; FEATURE_COUNT], 0.0);
        lr.coefficients[3] = f64::NAN;
        assert!(lr.validate().is_err());
    }

    #[test]
    fn test_threshold_defaults_when_absent() {
        let lr: LogisticRegression = serde_json::from_str(
            r#"{"coefficients": [0,0,0,0,0,0,0,0,0], "intercept": 0.0}"#,
        )
        .unwrap();
        assert_eq!(lr.threshold, 0.5);
        assert!(lr.validate().is_ok());
    }
}
