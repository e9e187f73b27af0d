//! Pipeline orchestrator for Blikk.
//!
//! Wires settings, collaborators, and the vector store together, and owns
//! the end-to-end indexing batch for one video.

use crate::answer::AnswerEngine;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{BlikkError, Result};
use crate::indexing::{IndexReport, IndexingPipeline};
use crate::retrieval::RetrievalEngine;
use crate::vector_store::FlatVectorStore;
use crate::video::extract_frames;
use crate::vision::{Captioner, OpenAICaptioner};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// The main orchestrator for the Blikk pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    captioner: Arc<dyn Captioner>,
    embedder: Arc<dyn Embedder>,
    store: Arc<FlatVectorStore>,
}

impl Orchestrator {
    /// Create a new orchestrator with default components.
    pub fn new(settings: Settings) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let captioner = Arc::new(OpenAICaptioner::with_config(
            &settings.indexing.caption_model,
            &prompts.caption.user,
        ));

        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let store = Arc::new(FlatVectorStore::open(
            &settings.index_path(),
            &settings.metadata_path(),
            settings.embedding.dimensions as usize,
        )?);

        std::fs::create_dir_all(settings.videos_dir())?;
        std::fs::create_dir_all(settings.clips_dir())?;
        std::fs::create_dir_all(settings.temp_dir())?;

        Ok(Self {
            settings,
            prompts,
            captioner,
            embedder,
            store,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        captioner: Arc<dyn Captioner>,
        embedder: Arc<dyn Embedder>,
        store: Arc<FlatVectorStore>,
    ) -> Result<Self> {
        std::fs::create_dir_all(settings.temp_dir())?;

        Ok(Self {
            settings,
            prompts,
            captioner,
            embedder,
            store,
        })
    }

    /// Get a reference to the vector store.
    pub fn store(&self) -> Arc<FlatVectorStore> {
        self.store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build a retrieval engine over the current store.
    pub fn retrieval_engine(&self) -> Arc<RetrievalEngine> {
        Arc::new(RetrievalEngine::new(
            self.store.clone(),
            self.embedder.clone(),
            &self.settings.retrieval,
        ))
    }

    /// Build an answer engine over the current store.
    pub fn answer_engine(&self) -> AnswerEngine {
        AnswerEngine::new(
            self.retrieval_engine(),
            &self.settings.answer.model,
            self.settings.clips_dir(),
            self.settings.answer.clip_window_seconds,
        )
        .with_prompts(self.prompts.clone())
    }

    /// Process a video: store it, sample frames, caption, embed, and index.
    ///
    /// The source file is copied into the managed videos directory so clips
    /// can be cut from a stable path later. The store is persisted once the
    /// whole batch has been committed.
    #[instrument(skip(self), fields(input = %input.display()))]
    pub async fn process_video(&self, input: &Path) -> Result<IndexReport> {
        if !input.exists() {
            return Err(BlikkError::InvalidInput(format!(
                "Video file not found: {}",
                input.display()
            )));
        }

        let stored = self.stored_video_path(input)?;

        if stored != input {
            info!("Copying {} into video library", input.display());
            eprintln!("  Copying into video library...");
            std::fs::copy(input, &stored)?;
        }

        // Sample frames into a scratch dir that is removed when we're done
        info!("Extracting frames from {}", stored.display());
        eprintln!("  Extracting frames...");
        let work_dir = tempfile::tempdir_in(self.settings.temp_dir())?;
        let frames = extract_frames(
            &stored,
            self.settings.indexing.frame_interval_seconds,
            work_dir.path(),
        )
        .await?;
        eprintln!("  Extracted {} frames", frames.len());

        info!("Indexing {} frames...", frames.len());
        eprintln!("  Captioning and indexing frames...");
        let pipeline = IndexingPipeline::new(
            self.captioner.clone(),
            self.embedder.clone(),
            self.store.clone(),
        );
        let report = pipeline.index_frames(&stored, &frames).await?;
        eprintln!("  Indexed {} frames", report.frames_indexed);

        // One save per batch; the index/metadata pair is written together
        self.store
            .persist(&self.settings.index_path(), &self.settings.metadata_path())?;

        Ok(report)
    }

    /// Resolve where the input video lives inside the managed library.
    fn stored_video_path(&self, input: &Path) -> Result<std::path::PathBuf> {
        let file_name = input
            .file_name()
            .ok_or_else(|| {
                BlikkError::InvalidInput(format!("Not a file path: {}", input.display()))
            })?
            .to_owned();

        let stored = self.settings.videos_dir().join(file_name);

        // Indexing a file already inside the library must not copy onto itself.
        let same = match (input.canonicalize(), stored.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };

        Ok(if same { input.to_path_buf() } else { stored })
    }
}
