use mongodb::bson::Bson;
use serde::Serialize;
use serde_json::Value;

pub(crate) const LOCATIONS_COLLECTION: &str = "user_locations";

/// A value handed to the document store on write.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldValue {
    Literal(Bson),
    /// Resolved to the store's clock when the write commits.
    ServerTimestamp,
}

pub(crate) type Fields = Vec<(String, FieldValue)>;

/// A validated creation request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationCommand {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl LocationCommand {
    pub fn into_fields(self) -> Fields {
        vec![
            ("name".to_owned(), FieldValue::Literal(Bson::String(self.name))),
            ("lat".to_owned(), FieldValue::Literal(Bson::Double(self.lat))),
            ("lng".to_owned(), FieldValue::Literal(Bson::Double(self.lng))),
            ("address".to_owned(), FieldValue::Literal(Bson::String(self.address))),
            ("createdAt".to_owned(), FieldValue::ServerTimestamp),
        ]
    }
}

/// Canonical API shape of a stored location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct LocationView {
    pub id: String,
    pub name: String,
    pub lat: Value,
    pub lng: Value,
    pub address: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddLocationResponse {
    pub ok: bool,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
