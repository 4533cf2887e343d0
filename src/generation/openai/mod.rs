
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatGenerator, GenerationError, prompt};
use crate::config::{ConfigError, OpenAiConfig};
use crate::database::ContextResult;
use crate::languages::Language;
use crate::openai::{OpenAiHttp, RequestFailure};

#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    http: OpenAiHttp,
    model: String,
    temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl From<RequestFailure> for GenerationError {
    #[inline]
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Timeout(after) => Self::Timeout(after),
            RequestFailure::Status { status, body } => Self::Status { status, body },
            RequestFailure::Transport(message) => Self::Transport(message),
        }
    }
}

impl OpenAiChatClient {
    #[inline]
    pub fn new(config: &OpenAiConfig) -> Result<Self, ConfigError> {
        let http = OpenAiHttp::new(config, config.generation_timeout())?;

        Ok(Self {
            http,
            model: config.chat_model.clone(),
            temperature: config.temperature,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.http.timeout()
    }

    /// System and user messages for one translation request.
    #[inline]
    pub fn messages(
        english_text: &str,
        context: &[ContextResult],
        language: Language,
    ) -> [ChatMessage; 2] {
        [
            ChatMessage {
                role: "system".to_string(),
                content: prompt::system_prompt(language),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompt::user_prompt(english_text, context, language),
            },
        ]
    }

    /// Blocking variant of [`ChatGenerator::generate`].
    #[inline]
    pub fn generate_blocking(
        &self,
        english_text: &str,
        context: &[ContextResult],
        language: Language,
    ) -> Result<String, GenerationError> {
        debug!(
            "Requesting {} translation with {} context cards",
            language,
            context.len()
        );

        let messages = Self::messages(english_text, context, language);
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            temperature: self.temperature,
        };
        let response_text = self.http.post_json("chat/completions", &request)?;

        let response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| GenerationError::Decode(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationError::NoChoices)?
            .message
            .content
            .unwrap_or_default();

        let translation = content.trim();
        if translation.is_empty() {
            return Err(GenerationError::EmptyContent);
        }

        Ok(translation.to_string())
    }
}

#[async_trait]
impl ChatGenerator for OpenAiChatClient {
    #[inline]
    async fn generate(
        &self,
        english_text: &str,
        context: &[ContextResult],
        language: Language,
    ) -> Result<String, GenerationError> {
        let client = self.clone();
        let english_text = english_text.to_string();
        let context = context.to_vec();

        tokio::task::spawn_blocking(move || {
            client.generate_blocking(&english_text, &context, language)
        })
        .await
        .map_err(|e| GenerationError::Task(e.to_string()))?
    }
}
