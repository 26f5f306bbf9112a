use crate::core::{DocumentStream, Persister};
use crate::error::StoreError;
use crate::models::{FieldValue, Fields};
use anyhow::anyhow;
use futures::stream::{self, StreamExt};
use log::info;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use mongodb::options::{ClientOptions, UpdateOptions};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, OnceLock};

static MONGO_CLIENT: OnceLock<mongodb::Client> = OnceLock::new();

#[derive(Clone)]
pub(crate) struct MongoPersister {
    db: mongodb::Database,
}

impl MongoPersister {
    /// Builds the process-wide client. A second call is an error.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let options = ClientOptions::parse(uri).await?;
        let client = mongodb::Client::with_options(options)?;
        let db = client.database(database);
        MONGO_CLIENT
            .set(client)
            .map_err(|_| anyhow!("document store client is already initialized"))?;
        info!("connected to document store, database {}", database);
        Ok(Self { db })
    }
}

impl Persister for MongoPersister {
    fn create_document<'a>(&'a self, collection: &'a str, fields: Fields) -> Pin<Box<dyn Future<Output = Result<String, StoreError>> + 'a>> {
        Box::pin(async move {
            let id = ObjectId::new();
            let options = UpdateOptions::builder().upsert(true).build();
            self.db
                .collection::<Document>(collection)
                .update_one(doc! { "_id": id }, upsert_update(fields), options)
                .await?;
            Ok(id.to_hex())
        })
    }

    fn list_documents<'a>(&'a self, collection: &'a str) -> Pin<Box<dyn Future<Output = Result<DocumentStream<'a>, StoreError>> + 'a>> {
        Box::pin(async move {
            let cursor = self.db.collection::<Document>(collection).find(None, None).await?;
            let docs = cursor
                .map(|res| -> Result<(String, Document), StoreError> {
                    let mut doc = res?;
                    let id = document_id(doc.remove("_id"));
                    Ok((id, doc))
                })
                .boxed_local();
            Ok(docs)
        })
    }
}

/// Update document for an upsert on a fresh `_id`. Literals go to
/// `$setOnInsert`; `ServerTimestamp` fields go to `$currentDate` so the server
/// clock stamps them at commit.
fn upsert_update(fields: Fields) -> Document {
    let mut literals = Document::new();
    let mut stamped = Document::new();
    for (key, value) in fields {
        match value {
            FieldValue::Literal(v) => {
                literals.insert(key, v);
            }
            FieldValue::ServerTimestamp => {
                stamped.insert(key, true);
            }
        }
    }
    let mut update = Document::new();
    if !literals.is_empty() || stamped.is_empty() {
        update.insert("$setOnInsert", literals);
    }
    if !stamped.is_empty() {
        update.insert("$currentDate", stamped);
    }
    update
}

fn document_id(id: Option<Bson>) -> String {
    match id {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Keeps collections in process memory. Server timestamps resolve to the
/// local clock at insert.
#[derive(Default)]
pub(crate) struct MemoryPersister {
    collections: Mutex<HashMap<String, Vec<(String, Document)>>>,
}

impl MemoryPersister {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<(String, Document)>>>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::from(anyhow!("memory store lock poisoned")))
    }

    #[cfg(test)]
    pub fn seed(&self, collection: &str, id: &str, fields: Document) {
        self.lock()
            .unwrap()
            .entry(collection.to_owned())
            .or_default()
            .push((id.to_owned(), fields));
    }
}

impl Persister for MemoryPersister {
    fn create_document<'a>(&'a self, collection: &'a str, fields: Fields) -> Pin<Box<dyn Future<Output = Result<String, StoreError>> + 'a>> {
        Box::pin(async move {
            let id = ObjectId::new().to_hex();
            let now = DateTime::now();
            let doc: Document = fields
                .into_iter()
                .map(|(key, value)| match value {
                    FieldValue::Literal(v) => (key, v),
                    FieldValue::ServerTimestamp => (key, Bson::DateTime(now)),
                })
                .collect();
            self.lock()?
                .entry(collection.to_owned())
                .or_default()
                .push((id.clone(), doc));
            Ok(id)
        })
    }

    fn list_documents<'a>(&'a self, collection: &'a str) -> Pin<Box<dyn Future<Output = Result<DocumentStream<'a>, StoreError>> + 'a>> {
        Box::pin(async move {
            let snapshot = self.lock()?.get(collection).cloned().unwrap_or_default();
            Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed_local())
        })
    }
}
