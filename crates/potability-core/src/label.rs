//! Potability labels

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InferenceError;

/// Raw model output that means "potable"
pub const POTABLE_OUTPUT: f64 = 1.0;

/// Human-readable outcome of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotabilityLabel {
    Consumable,
    NotConsumable,
}

impl PotabilityLabel {
    /// Map a raw binary model output to a label
    ///
    /// `1` is consumable. Every other integral value (`0`, `-1`, `2`, ...) is
    /// not. Fractional and non-finite outputs are rejected rather than guessed.
    pub fn from_model_output(raw: f64) -> Result<Self, InferenceError> {
        if !raw.is_finite() || raw.fract() != 0.0 {
            return Err(InferenceError::NonBinaryOutput(raw));
        }

        if raw == POTABLE_OUTPUT {
            Ok(PotabilityLabel::Consumable)
        } else {
            Ok(PotabilityLabel::NotConsumable)
        }
    }

    /// Response text returned to callers
    pub fn message(&self) -> &'static str {
        match self {
            PotabilityLabel::Consumable => "Water is Consumable",
            PotabilityLabel::NotConsumable => "Water is Not Consumable",
        }
    }

    /// Short identifier used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            PotabilityLabel::Consumable => "consumable",
            PotabilityLabel::NotConsumable => "not_consumable",
        }
    }

    pub fn is_consumable(&self) -> bool {
        matches!(self, PotabilityLabel::Consumable)
    }
}

impl fmt::Display for PotabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
