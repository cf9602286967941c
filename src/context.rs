//! Context retrieval for script generation.

use crate::error::Result;
use crate::knowledge::KnowledgeStore;
use std::sync::Arc;
use tracing::{info, instrument};

/// Appended to context that was cut at the character budget.
pub const TRUNCATION_MARKER: &str = " …";

/// Fetches a bounded excerpt for a topic from a knowledge store.
pub struct ContextRetriever {
    store: Arc<dyn KnowledgeStore>,
    max_chars: usize,
}

impl ContextRetriever {
    /// Create a new retriever with the given character budget.
    pub fn new(store: Arc<dyn KnowledgeStore>, max_chars: usize) -> Self {
        Self { store, max_chars }
    }

    /// Fetch context for `topic` from `collection`. Single attempt, no retry.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, topic: &str, collection: &str) -> Result<String> {
        let raw = self.store.lookup(topic, collection).await?;
        let context = truncate_context(&raw, self.max_chars);
        if context.len() != raw.len() {
            info!(
                "Context length {} > {}, truncated",
                raw.chars().count(),
                self.max_chars
            );
        }
        Ok(context)
    }
}

/// Cut `text` to at most `max_chars` characters, appending [`TRUNCATION_MARKER`] when cut.
pub fn truncate_context(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
