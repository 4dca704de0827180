//! Water sample schema and validation
//!
//! A [`WaterSample`] can only be obtained through [`validate`] (or its
//! `TryFrom`/`Deserialize` wrappers), so every instance satisfies the schema:
//! all nine measurements present and finite. Physical ranges are not checked.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{FieldIssue, FieldIssueKind, PayloadError, ValidationError};
use crate::features::{column_index, FEATURE_COLUMNS, FEATURE_COUNT};

/// Nine water-quality measurements of a single sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct WaterSample {
    ph: f64,
    #[serde(rename = "Hardness")]
    hardness: f64,
    #[serde(rename = "Solids")]
    solids: f64,
    #[serde(rename = "Chloramines")]
    chloramines: f64,
    #[serde(rename = "Sulfate")]
    sulfate: f64,
    #[serde(rename = "Conductivity")]
    conductivity: f64,
    #[serde(rename = "Organic_carbon")]
    organic_carbon: f64,
    #[serde(rename = "Trihalomethanes")]
    trihalomethanes: f64,
    #[serde(rename = "Turbidity")]
    turbidity: f64,
}

impl WaterSample {
    // Values must be finite and in FEATURE_COLUMNS order.
    fn from_checked_columns(values: [f64; FEATURE_COUNT]) -> Self {
        let [ph, hardness, solids, chloramines, sulfate, conductivity, organic_carbon, trihalomethanes, turbidity] =
            values;
        Self {
            ph,
            hardness,
            solids,
            chloramines,
            sulfate,
            conductivity,
            organic_carbon,
            trihalomethanes,
            turbidity,
        }
    }

    pub fn ph(&self) -> f64 {
        self.ph
    }

    pub fn hardness(&self) -> f64 {
        self.hardness
    }

    pub fn solids(&self) -> f64 {
        self.solids
    }

    pub fn chloramines(&self) -> f64 {
        self.chloramines
    }

    pub fn sulfate(&self) -> f64 {
        self.sulfate
    }

    pub fn conductivity(&self) -> f64 {
        self.conductivity
    }

    pub fn organic_carbon(&self) -> f64 {
        self.organic_carbon
    }

    pub fn trihalomethanes(&self) -> f64 {
        self.trihalomethanes
    }

    pub fn turbidity(&self) -> f64 {
        self.turbidity
    }

    /// Look up a measurement by its wire name (e.g. `"Organic_carbon"`)
    pub fn field(&self, name: &str) -> Option<f64> {
        let idx = column_index(name)?;
        Some(crate::features::FeatureVector::from(self).values()[idx])
    }
}

/// Build a sample from values in [`FEATURE_COLUMNS`] order
impl TryFrom<[f64; FEATURE_COUNT]> for WaterSample {
    type Error = ValidationError;

    fn try_from(values: [f64; FEATURE_COUNT]) -> Result<Self, Self::Error> {
        let issues: Vec<FieldIssue> = FEATURE_COLUMNS
            .iter()
            .zip(values.iter())
            .filter(|(_, value)| !value.is_finite())
            .map(|(field, _)| FieldIssue::new(*field, FieldIssueKind::NotFinite { actual: "number" }))
            .collect();

        if issues.is_empty() {
            Ok(Self::from_checked_columns(values))
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

impl TryFrom<Value> for WaterSample {
    type Error = ValidationError;

    fn try_from(payload: Value) -> Result<Self, Self::Error> {
        validate(&payload)
    }
}

/// Validate an untyped payload into a [`WaterSample`]
///
/// The payload must be a JSON object holding all nine wire keys. Each value
/// may be a JSON number or a string that parses as a float (`"7.0"`); any
/// other type is rejected. Unknown keys are ignored. All offending fields are
/// reported, in column order.
pub fn validate(payload: &Value) -> Result<WaterSample, ValidationError> {
    let Some(map) = payload.as_object() else {
        return Err(ValidationError::new(vec![FieldIssue::not_an_object(
            json_type_name(payload),
        )]));
    };

    validate_fields(|field| map.get(field).map(coerce_float))
}

/// Validate a raw JSON body into a [`WaterSample`]
///
/// Same rules as [`validate`], but a field holding a number too large for
/// `f64` (`1e400`) is reported as a `NotFinite` issue on that field instead
/// of failing the whole parse. Only a body that is not JSON at all is a
/// [`PayloadError::Syntax`].
pub fn validate_json(body: &[u8]) -> Result<WaterSample, PayloadError> {
    let strict = match serde_json::from_slice::<Value>(body) {
        Ok(payload) => return Ok(validate(&payload)?),
        Err(err) => err,
    };

    // RawValue skips over numbers without converting them.
    let fields: BTreeMap<String, Box<RawValue>> = match serde_json::from_slice(body) {
        Ok(fields) => fields,
        Err(_) => return Err(PayloadError::Syntax(strict)),
    };

    Ok(validate_fields(|field| fields.get(field).map(|raw| coerce_raw(raw)))?)
}

fn validate_fields(
    lookup: impl Fn(&str) -> Option<Result<f64, FieldIssueKind>>,
) -> Result<WaterSample, ValidationError> {
    let mut values = [0.0; FEATURE_COUNT];
    let mut issues = Vec::new();

    for (slot, field) in values.iter_mut().zip(FEATURE_COLUMNS) {
        match lookup(field) {
            None => issues.push(FieldIssue::missing(field)),
            Some(Ok(number)) => *slot = number,
            Some(Err(kind)) => issues.push(FieldIssue::new(field, kind)),
        }
    }

    if !issues.is_empty() {
        tracing::debug!(issue_count = issues.len(), "Water sample failed validation");
        return Err(ValidationError::new(issues));
    }

    Ok(WaterSample::from_checked_columns(values))
}

fn coerce_float(value: &Value) -> Result<f64, FieldIssueKind> {
    let actual = json_type_name(value);
    let number = match value {
        Value::Number(n) => n.as_f64().ok_or(FieldIssueKind::NotFinite { actual })?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| FieldIssueKind::WrongType { actual })?,
        _ => return Err(FieldIssueKind::WrongType { actual }),
    };

    if number.is_finite() {
        Ok(number)
    } else {
        Err(FieldIssueKind::NotFinite { actual })
    }
}

// A raw field that does not parse as a `Value` holds an out-of-range number,
// either directly or nested inside a container.
fn coerce_raw(raw: &RawValue) -> Result<f64, FieldIssueKind> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.get()) {
        return coerce_float(&value);
    }

    let actual = match raw.get().trim_start().as_bytes().first() {
        Some(b'[') => "array",
        Some(b'{') => "object",
        Some(b'"') => "string",
        _ => "number",
    };
    if actual == "number" {
        Err(FieldIssueKind::NotFinite { actual })
    } else {
        Err(FieldIssueKind::WrongType { actual })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
