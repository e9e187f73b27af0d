//! Configuration management for Blikk.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, CaptionPrompts, ChatPrompts, IntentPrompts, Prompts};
pub use settings::{
    AnswerSettings, EmbeddingSettings, GeneralSettings, IndexingSettings, PromptSettings,
    RetrievalSettings, Settings,
};
