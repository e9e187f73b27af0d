//! Configuration settings for Blikk.

use crate::retrieval::DedupScope;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub indexing: IndexingSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub answer: AnswerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.blikk".to_string(),
            temp_dir: "/tmp/blikk".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Video indexing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    /// Seconds between sampled frames.
    pub frame_interval_seconds: f64,
    /// Vision model used for frame captioning.
    pub caption_model: String,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            frame_interval_seconds: 1.0,
            caption_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Retrieval and consolidation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Raw candidates fetched from the index before deduplication.
    pub candidate_width: usize,
    /// Final results kept after deduplication.
    pub max_results: usize,
    /// Minimum seconds between two kept results.
    pub dedup_window_seconds: f64,
    /// Whether the dedup window applies per source video or globally.
    pub dedup_scope: DedupScope,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            candidate_width: 10,
            max_results: 3,
            dedup_window_seconds: 2.0,
            dedup_scope: DedupScope::PerSource,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    /// LLM model for intent classification and answer generation.
    pub model: String,
    /// Seconds of video kept on each side of a matched moment.
    pub clip_window_seconds: f64,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            clip_window_seconds: 2.0,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::BlikkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("blikk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Directory where indexed source videos are kept.
    pub fn videos_dir(&self) -> PathBuf {
        self.data_dir().join("videos")
    }

    /// Directory where extracted clips are written.
    pub fn clips_dir(&self) -> PathBuf {
        self.data_dir().join("clips")
    }

    /// Path of the on-disk vector index file.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir().join("index").join("index.json")
    }

    /// Path of the on-disk metadata file paired with the index.
    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir().join("index").join("metadata.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_retrieval_policy() {
        let settings = Settings::default();
        assert_eq!(settings.retrieval.candidate_width, 10);
        assert_eq!(settings.retrieval.max_results, 3);
        assert!((settings.retrieval.dedup_window_seconds - 2.0).abs() < f64::EPSILON);
        assert_eq!(settings.retrieval.dedup_scope, DedupScope::PerSource);
        assert_eq!(settings.embedding.dimensions, 1536);
    }

    #[test]
    fn test_derived_paths_share_data_dir() {
        let mut settings = Settings::default();
        settings.general.data_dir = "/tmp/blikk-test".to_string();

        assert_eq!(
            settings.index_path(),
            PathBuf::from("/tmp/blikk-test/index/index.json")
        );
        assert_eq!(
            settings.metadata_path(),
            PathBuf::from("/tmp/blikk-test/index/metadata.json")
        );
        assert_eq!(settings.clips_dir(), PathBuf::from("/tmp/blikk-test/clips"));
    }

    #[test]
    fn test_roundtrip_toml() {
        let settings = Settings::default();
        let serialized = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.retrieval.candidate_width, 10);
        assert_eq!(parsed.answer.model, "gpt-4o-mini");
    }
}
