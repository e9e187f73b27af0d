//! Frame captioning via a vision model.

mod openai;

pub use openai::OpenAICaptioner;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for frame captioning.
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Generate a natural-language description for a JPEG-encoded frame.
    async fn caption(&self, jpeg_bytes: &[u8]) -> Result<String>;
}
