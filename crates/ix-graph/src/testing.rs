//! Mock Graph API for exporter tests.

use crate::client::GraphApi;
use crate::document::Document;
use crate::error::{GraphError, GraphResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Programmable [`GraphApi`] backed by in-memory route tables.
///
/// Paths not registered behave like 404s: `get_object` and
/// `list_collection` fail with `NotFound`, `try_get_collection` answers
/// `Ok(None)`. Registered errors take precedence over payloads.
#[derive(Default)]
pub struct MockGraphApi {
    objects: Arc<RwLock<HashMap<String, Document>>>,
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
    errors: Arc<RwLock<HashMap<String, GraphError>>>,
}

impl MockGraphApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_object(&self, path: &str, value: Value) {
        let doc = Document::try_from(value).expect("mock object must be a JSON object");
        self.objects.write().await.insert(path.to_string(), doc);
    }

    pub async fn set_collection(&self, path: &str, values: Vec<Value>) {
        let docs = values
            .into_iter()
            .map(|v| Document::try_from(v).expect("mock collection element must be an object"))
            .collect();
        self.collections.write().await.insert(path.to_string(), docs);
    }

    pub async fn set_error(&self, path: &str, error: GraphError) {
        self.errors.write().await.insert(path.to_string(), error);
    }

    async fn check_error(&self, path: &str) -> GraphResult<()> {
        if let Some(e) = self.errors.read().await.get(path) {
            return Err(e.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl GraphApi for MockGraphApi {
    async fn get_object(&self, path: &str) -> GraphResult<Document> {
        self.check_error(path).await?;
        self.objects
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| GraphError::NotFound(path.to_string()))
    }

    async fn list_collection(&self, path: &str) -> GraphResult<Vec<Document>> {
        self.check_error(path).await?;
        self.collections
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| GraphError::NotFound(path.to_string()))
    }

    async fn try_get_collection(&self, path: &str) -> GraphResult<Option<Vec<Document>>> {
        match self.list_collection(path).await {
            Ok(docs) => Ok(Some(docs)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
