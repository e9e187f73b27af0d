//! Blikk - Video Question Answering
//!
//! A local-first CLI tool for asking questions about your videos.
//!
//! The name "Blikk" comes from the Norwegian/Scandinavian word for "glance."
//!
//! # Overview
//!
//! Blikk allows you to:
//! - Index local videos by sampling frames and captioning them with a vision model
//! - Ask free-text questions and get AI-powered answers grounded in video moments
//! - Search your video library semantically
//! - Get short clips around each matched moment
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `video` - Frame extraction and clip trimming (ffmpeg)
//! - `vision` - Frame captioning
//! - `embedding` - Embedding generation
//! - `vector_store` - Flat L2 vector index with parallel metadata
//! - `indexing` - Per-frame caption/embed/append pipeline
//! - `retrieval` - Over-fetch, temporal dedup, and truncation of search results
//! - `answer` - Intent routing, answer generation, and clip attachment
//! - `orchestrator` - Component wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use blikk::config::Settings;
//! use blikk::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Sample, caption, and index a video
//!     let report = orchestrator.process_video(std::path::Path::new("demo.mp4")).await?;
//!     println!("Indexed {} frames", report.frames_indexed);
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod indexing;
pub mod openai;
pub mod orchestrator;
pub mod retrieval;
pub mod vector_store;
pub mod video;
pub mod vision;

pub use error::{BlikkError, Result};
