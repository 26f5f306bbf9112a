use crate::error::{Error, StoreError};
use crate::formatters::format_location;
use crate::models::{Fields, LocationView, LOCATIONS_COLLECTION};
use crate::validators::validate_location;
use futures::stream::LocalBoxStream;
use futures::StreamExt;
use log::info;
use mongodb::bson::Document;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;

/// Lazy, single-pass sequence of `(id, fields)` pairs in store order.
pub(crate) type DocumentStream<'a> = LocalBoxStream<'a, Result<(String, Document), StoreError>>;

pub(crate) trait Persister {
    /// Writes a new document under a store-generated id and returns that id.
    fn create_document<'a>(&'a self, collection: &'a str, fields: Fields) -> Pin<Box<dyn Future<Output = Result<String, StoreError>> + 'a>>;
    /// Streams every document of the collection.
    fn list_documents<'a>(&'a self, collection: &'a str) -> Pin<Box<dyn Future<Output = Result<DocumentStream<'a>, StoreError>> + 'a>>;
}

pub(crate) async fn add_location<P>(persister: &P, payload: &Map<String, Value>) -> Result<String, Error>
where
    P: Persister,
{
    let loc = validate_location(payload)?;
    let name = loc.name.clone();
    let id = persister.create_document(LOCATIONS_COLLECTION, loc.into_fields()).await?;
    info!("saved location {} ({})", id, name);
    Ok(id)
}

pub(crate) async fn list_locations<P>(persister: &P) -> Result<Vec<LocationView>, Error>
where
    P: Persister,
{
    let mut docs = persister.list_documents(LOCATIONS_COLLECTION).await?;
    let mut rows = Vec::new();
    while let Some(doc) = docs.next().await {
        let (id, fields) = doc?;
        rows.push(format_location(&id, &fields));
    }
    sort_newest_first(&mut rows);
    Ok(rows)
}

/// Orders by `createdAt` text, descending, with missing timestamps last.
/// Ties keep store order.
pub(crate) fn sort_newest_first(rows: &mut [LocationView]) {
    rows.sort_by(|a, b| {
        let a = a.created_at.as_deref().unwrap_or("");
        let b = b.created_at.as_deref().unwrap_or("");
        b.cmp(a)
    });
}
