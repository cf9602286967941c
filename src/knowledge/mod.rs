//! Knowledge store abstraction for podforge.
//!
//! A knowledge store holds ingested documents in isolated collections and answers
//! topic lookups with a text blob of relevant excerpts.

mod client;
mod memory;

pub use client::KnowledgeClient;
pub use memory::MemoryKnowledgeStore;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for knowledge store backends.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Return raw context text relevant to `query` within `collection`.
    async fn lookup(&self, query: &str, collection: &str) -> Result<String>;

    /// Create an empty collection.
    async fn create_collection(&self, collection: &str, topic: &str) -> Result<()>;

    /// Ingest a document into an existing collection.
    async fn upload_document(&self, collection: &str, text: &str) -> Result<()>;

    /// Drop a collection and everything in it.
    async fn delete_collection(&self, collection: &str) -> Result<()>;
}
