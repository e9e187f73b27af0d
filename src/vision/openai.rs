//! OpenAI vision captioning implementation.

use super::Captioner;
use crate::error::{BlikkError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{debug, instrument};

/// Upper bound on caption length; captions are indexed per frame, so short.
const MAX_CAPTION_TOKENS: u32 = 100;

/// Vision-model captioner over the OpenAI chat API.
pub struct OpenAICaptioner {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    prompt: String,
}

impl OpenAICaptioner {
    /// Create a captioner with the given vision model and caption prompt.
    pub fn with_config(model: &str, prompt: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            prompt: prompt.to_string(),
        }
    }
}

#[async_trait]
impl Captioner for OpenAICaptioner {
    #[instrument(skip(self, jpeg_bytes), fields(bytes = jpeg_bytes.len()))]
    async fn caption(&self, jpeg_bytes: &[u8]) -> Result<String> {
        let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg_bytes));

        let text_part = ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(self.prompt.clone())
            .build()
            .map_err(|e| BlikkError::Captioning(format!("Failed to build request: {}", e)))?;

        let image_part = ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(
                ImageUrlArgs::default()
                    .url(data_url)
                    .detail(ImageDetail::Low)
                    .build()
                    .map_err(|e| {
                        BlikkError::Captioning(format!("Failed to build request: {}", e))
                    })?,
            )
            .build()
            .map_err(|e| BlikkError::Captioning(format!("Failed to build request: {}", e)))?;

        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(vec![text_part.into(), image_part.into()])
            .build()
            .map_err(|e| BlikkError::Captioning(format!("Failed to build request: {}", e)))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![user_message.into()])
            .max_tokens(MAX_CAPTION_TOKENS)
            .build()
            .map_err(|e| BlikkError::Captioning(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BlikkError::OpenAI(format!("Caption API error: {}", e)))?;

        let caption = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| BlikkError::Captioning("Empty caption response".to_string()))?
            .trim()
            .to_string();

        debug!("Generated caption ({} chars)", caption.len());
        Ok(caption)
    }
}
