//! Graph API access behind the [`GraphApi`] trait.

use crate::document::Document;
use crate::error::{GraphError, GraphResult};
use crate::http::HttpClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// The slice of the Graph API the exporters consume: single objects and
/// paginated collections. Implemented by [`GraphClient`] for the real API
/// and by the mock in [`crate::testing`] for tests.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Fetches a single object. Non-2xx responses are errors.
    async fn get_object(&self, path: &str) -> GraphResult<Document>;

    /// Fetches a collection, following `@odata.nextLink` pages until
    /// exhausted.
    async fn list_collection(&self, path: &str) -> GraphResult<Vec<Document>>;

    /// Fetches an optional sub-resource collection. A 404 answer means the
    /// sub-resource does not exist for this object and yields `Ok(None)`
    /// rather than an error.
    async fn try_get_collection(&self, path: &str) -> GraphResult<Option<Vec<Document>>>;
}

/// One page of an OData collection response.
#[derive(Deserialize)]
struct CollectionPage {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// [`GraphApi`] implementation over the real Graph REST API.
pub struct GraphClient {
    http: HttpClient,
}

impl GraphClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn page_documents(page: Vec<Value>, path: &str) -> GraphResult<Vec<Document>> {
        page.into_iter()
            .map(|v| {
                Document::try_from(v).map_err(|_| {
                    GraphError::InvalidResponse(format!(
                        "collection {} contains a non-object element",
                        path
                    ))
                })
            })
            .collect()
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn get_object(&self, path: &str) -> GraphResult<Document> {
        let value: Value = self.http.get_json(path).await?;
        Document::try_from(value)
            .map_err(|_| GraphError::InvalidResponse(format!("{} is not a JSON object", path)))
    }

    async fn list_collection(&self, path: &str) -> GraphResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page: CollectionPage = self.http.get_json(path).await?;
        loop {
            documents.extend(Self::page_documents(page.value, path)?);
            match page.next_link {
                Some(next) => {
                    debug!(path, "Following collection page");
                    page = self.http.get_url_json(&next).await?;
                }
                None => break,
            }
        }
        Ok(documents)
    }

    async fn try_get_collection(&self, path: &str) -> GraphResult<Option<Vec<Document>>> {
        match self.list_collection(path).await {
            Ok(docs) => Ok(Some(docs)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
