//! Prompt templates for Blikk.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub caption: CaptionPrompts,
    pub intent: IntentPrompts,
    pub answer: AnswerPrompts,
    pub chat: ChatPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompt for frame captioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionPrompts {
    pub user: String,
}

impl Default for CaptionPrompts {
    fn default() -> Self {
        Self {
            user: "Describe this video frame in detail. Mention objects, actions, and any \
                   visible text."
                .to_string(),
        }
    }
}

/// Prompt for query intent classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentPrompts {
    pub system: String,
}

impl Default for IntentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an intent classifier. Analyze the user's input.
If the user is asking to find, look for, spot, or describe something in a video, return 'RETRIEVAL'.
If the user is asking for your name, greeting, or general knowledge, return 'CHAT'.
Output ONLY the word 'RETRIEVAL' or 'CHAT'."#
                .to_string(),
        }
    }
}

/// Prompts for grounded answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
    pub user: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a video analysis assistant.
1. Use the provided 'Video Findings' to answer the user's question.
2. If multiple events are relevant, mention all of them with their timestamps.
3. Judge whether the findings are actually relevant to the question (e.g. the user asks for a car but the findings describe a cat). If they are not, say you found nothing matching the request.

Respond with a JSON object with exactly two fields:
- "answer": your natural-language answer
- "found": true if the findings were relevant to the question, false otherwise"#
                .to_string(),

            user: r#"User Question: {{question}}

Video Findings:
{{findings}}"#
                .to_string(),
        }
    }
}

/// Prompt for general conversation without retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub system: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful video assistant. You help users find events in their \
                     videos. Answer conversationally and suggest what the user could search for."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let caption_path = custom_path.join("caption.toml");
            if caption_path.exists() {
                let content = std::fs::read_to_string(&caption_path)?;
                prompts.caption = toml::from_str(&content)?;
            }

            let intent_path = custom_path.join("intent.toml");
            if intent_path.exists() {
                let content = std::fs::read_to_string(&intent_path)?;
                prompts.intent = toml::from_str(&content)?;
            }

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.caption.user.is_empty());
        assert!(prompts.intent.system.contains("RETRIEVAL"));
        assert!(prompts.answer.system.contains("found"));
    }

    #[test]
    fn test_render_template() {
        let template = "Question: {{question}}\nFindings: {{findings}}";
        let mut vars = std::collections::HashMap::new();
        vars.insert("question".to_string(), "where is the dog".to_string());
        vars.insert("findings".to_string(), "- 3.0s: a dog".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Question: where is the dog\nFindings: - 3.0s: a dog");
    }

    #[test]
    fn test_custom_variables_lose_to_provided() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("question".to_string(), "stale".to_string());

        let mut vars = std::collections::HashMap::new();
        vars.insert("question".to_string(), "fresh".to_string());

        let rendered = prompts.render_with_custom("{{question}}", &vars);
        assert_eq!(rendered, "fresh");
    }
}
