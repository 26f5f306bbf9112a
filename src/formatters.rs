use chrono::{SecondsFormat, TimeZone, Utc};
use mongodb::bson::{Bson, Document};
use serde_json::Value;

use crate::models::LocationView;

/// Shapes a stored document into its API form. Missing fields fall back to
/// defaults, so this never fails.
pub(crate) fn format_location(id: &str, fields: &Document) -> LocationView {
    LocationView {
        id: id.to_owned(),
        name: text(fields, "name"),
        lat: passthrough(fields, "lat"),
        lng: passthrough(fields, "lng"),
        address: text(fields, "address"),
        created_at: fields.get("createdAt").and_then(iso_timestamp),
    }
}

fn text(fields: &Document, key: &str) -> String {
    match fields.get(key) {
        Some(Bson::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn passthrough(fields: &Document, key: &str) -> Value {
    fields
        .get(key)
        .cloned()
        .map(Bson::into_relaxed_extjson)
        .unwrap_or(Value::Null)
}

/// Renders timestamp-like values as UTC ISO-8601 with microseconds and a
/// `+00:00` offset. A single fixed format keeps text order chronological.
pub(crate) fn iso_timestamp(value: &Bson) -> Option<String> {
    let instant = match value {
        Bson::DateTime(dt) => Utc.timestamp_millis_opt(dt.timestamp_millis()).single(),
        Bson::Timestamp(ts) => Utc.timestamp_opt(i64::from(ts.time), 0).single(),
        _ => None,
    }?;
    Some(instant.to_rfc3339_opts(SecondsFormat::Micros, false))
}
