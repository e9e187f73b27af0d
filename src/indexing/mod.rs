//! Indexing pipeline: caption, embed, and append sampled frames.
//!
//! Collaborator failures degrade per record instead of aborting the batch:
//! a failed caption indexes a fixed placeholder description, and a failed
//! embedding indexes a zero vector. Both trade retrieval quality for
//! completing the batch.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{FlatVectorStore, FrameMetadata};
use crate::video::Frame;
use crate::vision::Captioner;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Description stored when captioning fails for a frame.
pub const CAPTION_FAILURE_PLACEHOLDER: &str = "Error generating description.";

/// Result of indexing one video.
#[derive(Debug)]
pub struct IndexReport {
    /// Path of the indexed source video.
    pub source_path: String,
    /// Number of frames committed to the store.
    pub frames_indexed: usize,
}

/// Per-frame caption/embed/append pipeline.
pub struct IndexingPipeline {
    captioner: Arc<dyn Captioner>,
    embedder: Arc<dyn Embedder>,
    store: Arc<FlatVectorStore>,
}

impl IndexingPipeline {
    /// Create a pipeline over the given collaborators and store.
    pub fn new(
        captioner: Arc<dyn Captioner>,
        embedder: Arc<dyn Embedder>,
        store: Arc<FlatVectorStore>,
    ) -> Self {
        Self {
            captioner,
            embedder,
            store,
        }
    }

    /// Caption, embed, and append every frame of one video.
    ///
    /// Appends only; re-indexing the same video adds duplicate records.
    /// Persistence is the caller's responsibility once the batch completes.
    #[instrument(skip(self, frames), fields(source = %source_path.display(), frames = frames.len()))]
    pub async fn index_frames(&self, source_path: &Path, frames: &[Frame]) -> Result<IndexReport> {
        let source = source_path.display().to_string();
        let mut indexed = 0;

        for frame in frames {
            debug!("Indexing frame at {:.1}s", frame.timestamp);
            let jpeg = tokio::fs::read(&frame.jpeg_path).await?;

            let description = match self.captioner.caption(&jpeg).await {
                Ok(caption) => caption,
                Err(e) => {
                    warn!("Captioning failed at {:.1}s: {}", frame.timestamp, e);
                    CAPTION_FAILURE_PLACEHOLDER.to_string()
                }
            };

            let vector = match self.embedder.embed(&description).await {
                Ok(vector) => vector,
                Err(e) => {
                    warn!("Embedding failed at {:.1}s: {}", frame.timestamp, e);
                    vec![0.0; self.embedder.dimensions()]
                }
            };

            self.store.add_record(
                vector,
                FrameMetadata {
                    source_path: source.clone(),
                    timestamp: frame.timestamp,
                    description,
                },
            )?;
            indexed += 1;
        }

        info!("Indexed {} frames from {}", indexed, source);
        Ok(IndexReport {
            source_path: source,
            frames_indexed: indexed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlikkError;
    use async_trait::async_trait;

    struct StubCaptioner {
        fail: bool,
    }

    #[async_trait]
    impl Captioner for StubCaptioner {
        async fn caption(&self, _jpeg_bytes: &[u8]) -> Result<String> {
            if self.fail {
                Err(BlikkError::OpenAI("caption service down".into()))
            } else {
                Ok("a red car driving past".to_string())
            }
        }
    }

    struct StubEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.fail {
                Err(BlikkError::OpenAI("embedding service down".into()))
            } else {
                Ok(vec![text.len() as f32, 1.0, 0.0])
            }
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn stub_frames(dir: &Path, count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| {
                let jpeg_path = dir.join(format!("frame_{:06}.jpg", i + 1));
                std::fs::write(&jpeg_path, b"jpeg").unwrap();
                Frame {
                    timestamp: i as f64,
                    jpeg_path,
                }
            })
            .collect()
    }

    fn pipeline(caption_fail: bool, embed_fail: bool) -> (IndexingPipeline, Arc<FlatVectorStore>) {
        let store = Arc::new(FlatVectorStore::new(3));
        let pipeline = IndexingPipeline::new(
            Arc::new(StubCaptioner { fail: caption_fail }),
            Arc::new(StubEmbedder { fail: embed_fail }),
            store.clone(),
        );
        (pipeline, store)
    }

    #[tokio::test]
    async fn test_indexes_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let frames = stub_frames(dir.path(), 3);
        let (pipeline, store) = pipeline(false, false);

        let report = pipeline
            .index_frames(Path::new("demo.mp4"), &frames)
            .await
            .unwrap();

        assert_eq!(report.frames_indexed, 3);
        assert_eq!(store.len(), 3);

        let hits = store.search(&[24.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].metadata.description, "a red car driving past");
    }

    #[tokio::test]
    async fn test_caption_failure_indexes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let frames = stub_frames(dir.path(), 1);
        let (pipeline, store) = pipeline(true, false);

        pipeline
            .index_frames(Path::new("demo.mp4"), &frames)
            .await
            .unwrap();

        let hits = store.search(&[0.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].metadata.description, CAPTION_FAILURE_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_embedding_failure_indexes_zero_vector() {
        let dir = tempfile::tempdir().unwrap();
        let frames = stub_frames(dir.path(), 1);
        let (pipeline, store) = pipeline(false, true);

        let report = pipeline
            .index_frames(Path::new("demo.mp4"), &frames)
            .await
            .unwrap();
        assert_eq!(report.frames_indexed, 1);

        // Zero vector sits at distance 0 from a zero query.
        let hits = store.search(&[0.0, 0.0, 0.0], 1).unwrap();
        assert!(hits[0].distance.abs() < 1e-6);
        assert_eq!(hits[0].metadata.description, "a red car driving past");
    }
}
