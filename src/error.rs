//! Error types for Blikk.

use thiserror::Error;

/// Library-level error type for Blikk operations.
#[derive(Error, Debug)]
pub enum BlikkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Frame extraction failed: {0}")]
    FrameExtraction(String),

    #[error("Captioning failed: {0}")]
    Captioning(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Answer generation failed: {0}")]
    Answer(String),

    #[error("Clip extraction failed: {0}")]
    ClipExtraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Blikk operations.
pub type Result<T> = std::result::Result<T, BlikkError>;
