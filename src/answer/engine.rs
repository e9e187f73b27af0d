//! Answer engine: intent routing, grounded generation, clip attachment.

use super::{
    format_findings, AnswerResponse, Conversation, Finding, GeneratedAnswer, QueryIntent,
};
use crate::config::Prompts;
use crate::error::{BlikkError, Result};
use crate::openai::create_client;
use crate::retrieval::RetrievalEngine;
use crate::video::{clip_output_path, extract_clip};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Shown when the index has nothing to offer for a retrieval query.
const NO_RESULTS_ANSWER: &str =
    "I couldn't find any relevant moments in your video library for this question.";

/// Answer engine for user queries.
pub struct AnswerEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    retrieval: Arc<RetrievalEngine>,
    prompts: Prompts,
    clips_dir: PathBuf,
    clip_window: f64,
}

impl AnswerEngine {
    /// Create a new answer engine.
    pub fn new(
        retrieval: Arc<RetrievalEngine>,
        model: &str,
        clips_dir: PathBuf,
        clip_window: f64,
    ) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            retrieval,
            prompts: Prompts::default(),
            clips_dir,
            clip_window,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer a single question end to end.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<AnswerResponse> {
        info!("Processing question: {}", question);

        match self.classify_intent(question).await {
            QueryIntent::Chat => {
                let answer = self.general_chat(question, &[]).await?;
                Ok(AnswerResponse::text_only(answer))
            }
            QueryIntent::Retrieval => self.answer_with_retrieval(question, &[]).await,
        }
    }

    /// Continue a conversation with a new message.
    ///
    /// The conversation is owned by the caller; both the user message and the
    /// generated answer are appended to it.
    #[instrument(skip(self, conversation), fields(message = %message))]
    pub async fn chat(
        &self,
        conversation: &mut Conversation,
        message: &str,
    ) -> Result<AnswerResponse> {
        let response = match self.classify_intent(message).await {
            QueryIntent::Chat => {
                let answer = self.general_chat(message, conversation.messages()).await?;
                AnswerResponse::text_only(answer)
            }
            QueryIntent::Retrieval => {
                self.answer_with_retrieval(message, conversation.messages())
                    .await?
            }
        };

        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(message)
            .build()
            .map_err(|e| BlikkError::Answer(e.to_string()))?;
        conversation.push(user_message.into());

        let assistant_message =
            async_openai::types::ChatCompletionRequestAssistantMessageArgs::default()
                .content(response.answer.clone())
                .build()
                .map_err(|e| BlikkError::Answer(e.to_string()))?;
        conversation.push(assistant_message.into());

        Ok(response)
    }

    /// Run the retrieval path: consolidate, generate, attach clips.
    async fn answer_with_retrieval(
        &self,
        question: &str,
        history: &[ChatCompletionRequestMessage],
    ) -> Result<AnswerResponse> {
        let hits = self.retrieval.search(question).await?;

        if hits.is_empty() {
            info!("No retrieval results; skipping generation and clips");
            return Ok(AnswerResponse::text_only(NO_RESULTS_ANSWER));
        }

        let findings: Vec<Finding> = hits.into_iter().map(Finding::from).collect();
        let generated = self.generate_answer(question, &findings, history).await?;

        let clips = if generated.has_relevant_findings {
            self.attach_clips(&findings).await
        } else {
            info!("Generator judged findings irrelevant; skipping clips");
            Vec::new()
        };

        Ok(AnswerResponse {
            answer: generated.text,
            findings,
            clips,
        })
    }

    /// Classify the query's intent, defaulting to retrieval on any failure.
    ///
    /// Fail-open: a missed search is worse than an unnecessary one.
    async fn classify_intent(&self, query: &str) -> QueryIntent {
        let result = self.classify_intent_inner(query).await;

        match result {
            Ok(Some(intent)) => intent,
            Ok(None) => {
                warn!("Unrecognized intent reply, defaulting to retrieval");
                QueryIntent::Retrieval
            }
            Err(e) => {
                warn!("Intent classification failed ({}), defaulting to retrieval", e);
                QueryIntent::Retrieval
            }
        }
    }

    async fn classify_intent_inner(&self, query: &str) -> Result<Option<QueryIntent>> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.intent.system.clone())
                .build()
                .map_err(|e| BlikkError::Answer(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(query)
                .build()
                .map_err(|e| BlikkError::Answer(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .build()
            .map_err(|e| BlikkError::Answer(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BlikkError::OpenAI(format!("Intent API error: {}", e)))?;

        let reply = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default();

        debug!("Intent classifier replied: {}", reply);
        Ok(QueryIntent::parse(reply))
    }

    /// Answer a general-conversation query without retrieval.
    async fn general_chat(
        &self,
        query: &str,
        history: &[ChatCompletionRequestMessage],
    ) -> Result<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.chat.system.clone())
                .build()
                .map_err(|e| BlikkError::Answer(e.to_string()))?
                .into(),
        ];
        messages.extend(history.iter().cloned());
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(query)
                .build()
                .map_err(|e| BlikkError::Answer(e.to_string()))?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| BlikkError::Answer(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BlikkError::OpenAI(format!("Chat API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| BlikkError::Answer("Empty response from LLM".to_string()))
    }

    /// Generate a grounded answer with a structured relevance verdict.
    async fn generate_answer(
        &self,
        question: &str,
        findings: &[Finding],
        history: &[ChatCompletionRequestMessage],
    ) -> Result<GeneratedAnswer> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("findings".to_string(), format_findings(findings));

        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.answer.user, &vars);

        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.answer.system.clone())
                .build()
                .map_err(|e| BlikkError::Answer(e.to_string()))?
                .into(),
        ];
        messages.extend(history.iter().cloned());
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| BlikkError::Answer(e.to_string()))?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| BlikkError::Answer(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BlikkError::OpenAI(format!("Answer API error: {}", e)))?;

        let raw = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| BlikkError::Answer("Empty response from LLM".to_string()))?;

        debug!("Generated answer for {} findings", findings.len());
        Ok(GeneratedAnswer::parse(raw))
    }

    /// Extract a clip around each finding, skipping existing output files.
    ///
    /// A failed extraction drops that clip and keeps the rest.
    async fn attach_clips(&self, findings: &[Finding]) -> Vec<PathBuf> {
        let mut clips = Vec::new();

        for finding in findings {
            let start = (finding.timestamp - self.clip_window).max(0.0);
            let end = finding.timestamp + self.clip_window;

            let source = Path::new(&finding.source_path);
            let output = clip_output_path(&self.clips_dir, source, start, end);

            if !output.exists() {
                if let Err(e) = extract_clip(source, start, end, &output).await {
                    warn!("Clip extraction failed for {:?}: {}", output, e);
                    continue;
                }
            }

            if output.exists() {
                clips.push(output);
            }
        }

        clips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalSettings;
    use crate::embedding::Embedder;
    use crate::vector_store::FlatVectorStore;
    use async_trait::async_trait;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0, 0.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn engine(clips_dir: PathBuf) -> AnswerEngine {
        let store = Arc::new(FlatVectorStore::new(3));
        let retrieval = Arc::new(RetrievalEngine::new(
            store,
            Arc::new(StubEmbedder),
            &RetrievalSettings::default(),
        ));
        AnswerEngine::new(retrieval, "gpt-4o-mini", clips_dir, 2.0)
    }

    #[tokio::test]
    async fn test_attach_clips_skips_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let clips_dir = dir.path().join("clips");
        std::fs::create_dir_all(&clips_dir).unwrap();

        let finding = Finding {
            source_path: dir.path().join("a.mp4").display().to_string(),
            timestamp: 5.0,
            description: "a red car".to_string(),
            distance: 0.1,
        };

        // Pre-create the deterministic output; the extractor must not run.
        let expected = clip_output_path(&clips_dir, Path::new(&finding.source_path), 3.0, 7.0);
        std::fs::write(&expected, b"existing clip").unwrap();

        let clips = engine(clips_dir).attach_clips(&[finding]).await;
        assert_eq!(clips, vec![expected.clone()]);
        assert_eq!(std::fs::read(&expected).unwrap(), b"existing clip");
    }

    #[tokio::test]
    async fn test_attach_clips_drops_failed_extractions() {
        let dir = tempfile::tempdir().unwrap();
        let clips_dir = dir.path().join("clips");

        // Source file does not exist, so extraction fails and the clip is
        // dropped without failing the whole response.
        let finding = Finding {
            source_path: "/nonexistent/a.mp4".to_string(),
            timestamp: 5.0,
            description: "a red car".to_string(),
            distance: 0.1,
        };

        let clips = engine(clips_dir).attach_clips(&[finding]).await;
        assert!(clips.is_empty());
    }

    #[tokio::test]
    async fn test_clip_window_clamps_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let clips_dir = dir.path().join("clips");
        std::fs::create_dir_all(&clips_dir).unwrap();

        let finding = Finding {
            source_path: dir.path().join("a.mp4").display().to_string(),
            timestamp: 0.5,
            description: "opening shot".to_string(),
            distance: 0.1,
        };

        // Window is [max(0, 0.5-2), 0.5+2] = [0, 2.5].
        let expected = clip_output_path(&clips_dir, Path::new(&finding.source_path), 0.0, 2.5);
        std::fs::write(&expected, b"clip").unwrap();

        let clips = engine(clips_dir).attach_clips(&[finding]).await;
        assert_eq!(clips, vec![expected]);
    }
}
