//! HTTP client for the knowledge service.

use super::KnowledgeStore;
use crate::config::KnowledgeSettings;
use crate::error::{PodforgeError, Result};
use crate::http::{create_client_with_timeout, endpoint_url};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct LookupRequest<'a> {
    query: &'a str,
    collection: &'a str,
}

/// Tag the knowledge service stores with every uploaded chunk.
const ORIGIN: &str = "podforge";

const LOOKUP_ROUTE: &str = "/lookup";

#[derive(Serialize)]
struct CollectionRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct ChunkRequest<'a> {
    text: &'a str,
    origin: &'a str,
    collection: &'a str,
}

/// Knowledge service reached over HTTP.
pub struct KnowledgeClient {
    client: reqwest::Client,
    endpoint: String,
}

impl KnowledgeClient {
    /// Create a client from knowledge settings.
    pub fn new(settings: &KnowledgeSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs))?,
            endpoint: settings.endpoint.clone(),
        })
    }

    /// POST a JSON body and return the response text.
    ///
    /// Lookup failures are retrieval errors; collection management failures are
    /// knowledge errors naming the route.
    async fn post<T: Serialize + ?Sized>(&self, route: &'static str, body: &T) -> Result<String> {
        let url = endpoint_url(&self.endpoint, route)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(route, format!("{} request: {}", route, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(route, format!("{} body: {}", route, e)))?;

        if !status.is_success() {
            let status = status.as_u16();
            return Err(if route == LOOKUP_ROUTE {
                PodforgeError::RetrievalStatus { status, body: text }
            } else {
                PodforgeError::KnowledgeStatus {
                    route,
                    status,
                    body: text,
                }
            });
        }
        Ok(text)
    }
}

fn transport_error(route: &str, message: String) -> PodforgeError {
    if route == LOOKUP_ROUTE {
        PodforgeError::Retrieval(message)
    } else {
        PodforgeError::Knowledge(message)
    }
}

#[async_trait]
impl KnowledgeStore for KnowledgeClient {
    #[instrument(skip(self))]
    async fn lookup(&self, query: &str, collection: &str) -> Result<String> {
        let text = self
            .post(LOOKUP_ROUTE, &LookupRequest { query, collection })
            .await?;
        debug!("Lookup returned {} bytes", text.len());
        Ok(text)
    }

    /// The service only takes the collection name; the topic is logged.
    #[instrument(skip(self))]
    async fn create_collection(&self, collection: &str, topic: &str) -> Result<()> {
        self.post("/create-collection", &CollectionRequest { name: collection })
            .await?;
        Ok(())
    }

    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn upload_document(&self, collection: &str, text: &str) -> Result<()> {
        self.post(
            "/chunk",
            &ChunkRequest {
                text,
                origin: ORIGIN,
                collection,
            },
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, collection: &str) -> Result<()> {
        self.post("/delete-collection", &CollectionRequest { name: collection })
            .await?;
        Ok(())
    }
}
