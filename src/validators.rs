use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::models::LocationCommand;

/// Checks a raw creation payload. `name` is checked before the coordinates.
pub(crate) fn validate_location(payload: &Map<String, Value>) -> Result<LocationCommand, ValidationError> {
    let name = text_field(payload, "name");
    let address = text_field(payload, "address");
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    let lat = coordinate(payload.get("lat")).ok_or(ValidationError::InvalidCoordinates)?;
    let lng = coordinate(payload.get("lng")).ok_or(ValidationError::InvalidCoordinates)?;
    Ok(LocationCommand { name, lat, lng, address })
}

// missing and non-string values read as empty
fn text_field(payload: &Map<String, Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_owned()
}

fn coordinate(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then(|| n)
}
