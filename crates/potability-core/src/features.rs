//! Feature vectorization
//!
//! The model was trained on a table whose columns appear in one fixed order.
//! [`FEATURE_COLUMNS`] is that order and it is the single source of truth for
//! it: the validator reads fields in this order, [`FeatureVector`] lays values
//! out in this order, and artifacts that declare feature names are checked
//! against it at load time.
//!
//! Reordering this constant does not raise any error. The model silently
//! receives permuted inputs and returns wrong predictions.

use serde::Serialize;

use crate::sample::WaterSample;

/// Number of features in a sample
pub const FEATURE_COUNT: usize = 9;

/// Column order the model was trained on. Do not reorder.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "ph",
    "Hardness",
    "Solids",
    "Chloramines",
    "Sulfate",
    "Conductivity",
    "Organic_carbon",
    "Trihalomethanes",
    "Turbidity",
];

/// Position of a column in [`FEATURE_COLUMNS`]
pub fn column_index(name: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|column| *column == name)
}

/// A single model input row, ordered as [`FEATURE_COLUMNS`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Build a row from values already in column order
    pub fn from_columns(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f64> {
        column_index(column).map(|idx| self.0[idx])
    }

    /// Column-value pairs in model order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_COLUMNS.iter().copied().zip(self.0.iter().copied())
    }
}

impl From<&WaterSample> for FeatureVector {
    fn from(sample: &WaterSample) -> Self {
        Self([
            sample.ph(),
            sample.hardness(),
            sample.solids(),
            sample.chloramines(),
            sample.sulfate(),
            sample.conductivity(),
            sample.organic_carbon(),
            sample.trihalomethanes(),
            sample.turbidity(),
        ])
    }
}

impl From<WaterSample> for FeatureVector {
    fn from(sample: WaterSample) -> Self {
        Self::from(&sample)
    }
}
