//! In-memory knowledge store implementation.
//!
//! Useful for testing and offline runs. Relevance is plain word overlap.

use super::KnowledgeStore;
use crate::error::{PodforgeError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// In-memory knowledge store.
pub struct MemoryKnowledgeStore {
    collections: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryKnowledgeStore {
    /// Create a new in-memory knowledge store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live collections.
    pub fn collection_count(&self) -> usize {
        self.collections.read().map(|c| c.len()).unwrap_or(0)
    }

    fn poisoned() -> PodforgeError {
        PodforgeError::Retrieval("knowledge store lock poisoned".to_string())
    }
}

impl Default for MemoryKnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

#[async_trait]
impl KnowledgeStore for MemoryKnowledgeStore {
    async fn lookup(&self, query: &str, collection: &str) -> Result<String> {
        let collections = self.collections.read().map_err(|_| Self::poisoned())?;
        let passages = collections
            .get(collection)
            .ok_or_else(|| PodforgeError::RetrievalStatus {
                status: 404,
                body: format!("collection '{}' not found", collection),
            })?;

        let query_words = words(query);
        let mut scored: Vec<(usize, usize, &String)> = passages
            .iter()
            .enumerate()
            .map(|(order, p)| (words(p).intersection(&query_words).count(), order, p))
            .filter(|(score, _, _)| *score > 0)
            .collect();

        if scored.is_empty() {
            return Ok(passages.join("\n\n"));
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(scored
            .into_iter()
            .map(|(_, _, p)| p.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    async fn create_collection(&self, collection: &str, _topic: &str) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| Self::poisoned())?;
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn upload_document(&self, collection: &str, text: &str) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| Self::poisoned())?;
        let passages = collections
            .get_mut(collection)
            .ok_or_else(|| PodforgeError::KnowledgeStatus {
                route: "/chunk",
                status: 404,
                body: format!("collection '{}' not found", collection),
            })?;
        passages.extend(
            text.split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        );
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| Self::poisoned())?;
        collections.remove(collection);
        Ok(())
    }
}
