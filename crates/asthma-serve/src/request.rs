//! Request schema for the prediction endpoints.

use std::collections::BTreeMap;

use asthma_io::FeatureOrder;
use serde_json::{Map, Value};

use crate::error::ServeError;

const NO_SYMPTOMS: &str = "No symptoms provided";

/// A validated prediction request.
///
/// Accepted JSON bodies:
///
/// ```json
/// {"symptoms": [25, 6, 6, 7, 5, 4, 8]}
/// {"record": {"Age": 25, "PollutionExposure": 6, "PollenExposure": 6, ...}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PredictRequest {
    /// Values in feature order.
    Symptoms(Vec<f64>),
    /// Values keyed by feature name, in any order.
    Record(BTreeMap<String, f64>),
}

impl PredictRequest {
    /// Parse a request body.
    ///
    /// # Errors
    ///
    /// [`ServeError::PredictionInput`] when the body is not a JSON object,
    /// carries neither or both payloads, or holds a non-numeric value.
    pub fn from_slice(body: &[u8]) -> Result<Self, ServeError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ServeError::input(NO_SYMPTOMS));
        }
        let mut fields: Map<String, Value> = serde_json::from_slice(body)
            .map_err(|e| ServeError::input(format!("invalid JSON body: {e}")))?;

        match (fields.remove("symptoms"), fields.remove("record")) {
            (Some(_), Some(_)) => Err(ServeError::input(
                "provide either \"symptoms\" or \"record\", not both",
            )),
            (Some(Value::Array(items)), None) if !items.is_empty() => items
                .iter()
                .enumerate()
                .map(|(i, v)| number(v, || format!("symptoms[{i}]")))
                .collect::<Result<_, _>>()
                .map(Self::Symptoms),
            (None, Some(Value::Object(fields))) if !fields.is_empty() => fields
                .iter()
                .map(|(k, v)| Ok::<_, ServeError>((k.clone(), number(v, || format!("record.{k}"))?)))
                .collect::<Result<_, _>>()
                .map(Self::Record),
            (Some(Value::Array(_)) | Some(Value::Null) | None, None)
            | (None, Some(Value::Object(_)) | Some(Value::Null)) => {
                Err(ServeError::input(NO_SYMPTOMS))
            }
            (Some(_), None) => Err(ServeError::input("\"symptoms\" must be a list of numbers")),
            (None, Some(_)) => Err(ServeError::input(
                "\"record\" must be an object of feature values",
            )),
        }
    }

    /// Lay the values out in `order`.
    ///
    /// # Errors
    ///
    /// [`ServeError::PredictionInput`] on a wrong list length, a missing or
    /// unknown record field, or a non-finite value.
    pub fn into_features(self, order: &FeatureOrder) -> Result<Vec<f64>, ServeError> {
        let values = match self {
            Self::Symptoms(values) => {
                if values.len() != order.len() {
                    return Err(ServeError::input(format!(
                        "expected {} symptom values ({}), got {}",
                        order.len(),
                        order.names().join(", "),
                        values.len()
                    )));
                }
                values
            }
            Self::Record(mut fields) => {
                let values = order
                    .iter()
                    .map(|name| {
                        fields
                            .remove(name)
                            .ok_or_else(|| ServeError::input(format!("missing field \"{name}\"")))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(unknown) = fields.keys().next() {
                    return Err(ServeError::input(format!("unknown field \"{unknown}\"")));
                }
                values
            }
        };
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ServeError::input(format!(
                "value for \"{}\" is not finite",
                order.names()[i]
            )));
        }
        Ok(values)
    }
}

fn number(value: &Value, at: impl FnOnce() -> String) -> Result<f64, ServeError> {
    value
        .as_f64()
        .ok_or_else(|| ServeError::input(format!("{} is not a number: {value}", at())))
}
