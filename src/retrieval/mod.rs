//! Retrieval and consolidation of search results.
//!
//! Turns one query vector into a small, temporally diverse, relevance-ranked
//! result set: over-fetch a candidate window from the index, drop candidates
//! too close in time to an already-kept result, then truncate.

mod consolidate;

pub use consolidate::{dedup_by_time, DedupScope};

use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{FlatVectorStore, SearchHit};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Retrieval engine over the vector store.
pub struct RetrievalEngine {
    store: Arc<FlatVectorStore>,
    embedder: Arc<dyn Embedder>,
    candidate_width: usize,
    max_results: usize,
    dedup_window: f64,
    dedup_scope: DedupScope,
}

impl RetrievalEngine {
    /// Create a retrieval engine with the configured consolidation policy.
    pub fn new(
        store: Arc<FlatVectorStore>,
        embedder: Arc<dyn Embedder>,
        settings: &RetrievalSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            candidate_width: settings.candidate_width,
            max_results: settings.max_results,
            dedup_window: settings.dedup_window_seconds,
            dedup_scope: settings.dedup_scope,
        }
    }

    /// Consolidate a query vector into at most `max_results` hits.
    ///
    /// Fetching more candidates than we return prevents the final set from
    /// being three near-identical samples of the same second of video; the
    /// candidate width is a fixed constant, not derived from the result cap.
    #[instrument(skip(self, query_vector))]
    pub fn consolidate(&self, query_vector: &[f32]) -> Result<Vec<SearchHit>> {
        let candidates = self.store.search(query_vector, self.candidate_width)?;
        debug!("Fetched {} raw candidates", candidates.len());

        let mut kept = dedup_by_time(candidates, self.dedup_window, self.dedup_scope);
        kept.truncate(self.max_results);

        debug!("Kept {} results after dedup and truncation", kept.len());
        Ok(kept)
    }

    /// Embed a free-text question and consolidate the result.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn search(&self, question: &str) -> Result<Vec<SearchHit>> {
        let query_vector = self.embedder.embed(question).await?;
        self.consolidate(&query_vector)
    }

    /// The underlying vector store.
    pub fn store(&self) -> &FlatVectorStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::FrameMetadata;
    use async_trait::async_trait;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    fn engine(store: Arc<FlatVectorStore>) -> RetrievalEngine {
        RetrievalEngine::new(store, Arc::new(StubEmbedder), &RetrievalSettings::default())
    }

    /// Store where record n sits at distance n^2 from a zero query, so
    /// search order equals insertion order.
    fn spread_store(timestamps: &[f64]) -> Arc<FlatVectorStore> {
        let store = Arc::new(FlatVectorStore::new(1));
        for (n, &timestamp) in timestamps.iter().enumerate() {
            store
                .add_record(
                    vec![n as f32],
                    FrameMetadata {
                        source_path: "a.mp4".to_string(),
                        timestamp,
                        description: format!("frame at {timestamp}"),
                    },
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_consolidate_caps_at_max_results() {
        // Six temporally spread records; dedup drops nothing, so only the
        // truncation limits the result.
        let store = spread_store(&[0.0, 5.0, 10.0, 15.0, 20.0, 25.0]);
        let engine = engine(store);

        let kept = engine.consolidate(&[0.0]).unwrap();
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].id, 0);
        assert!(kept[0].distance <= kept[1].distance);
        assert!(kept[1].distance <= kept[2].distance);
    }

    #[test]
    fn test_consolidate_dedups_then_truncates() {
        // Best-first candidates at 1.0s, 1.5s, 10.0s: the 1.5s hit falls
        // inside the window of the kept 1.0s hit and is dropped.
        let store = spread_store(&[1.0, 1.5, 10.0]);
        let engine = engine(store);

        let kept = engine.consolidate(&[0.0]).unwrap();
        let timestamps: Vec<f64> = kept.iter().map(|h| h.metadata.timestamp).collect();
        assert_eq!(timestamps, vec![1.0, 10.0]);
    }

    #[test]
    fn test_consolidate_empty_store_is_empty() {
        let engine = engine(Arc::new(FlatVectorStore::new(1)));
        assert!(engine.consolidate(&[0.0]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_embeds_and_consolidates() {
        let store = spread_store(&[0.0, 5.0, 10.0, 15.0]);
        let engine = engine(store);

        let kept = engine.search("what happens first").await.unwrap();
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].id, 0);
    }
}
