//! Chat-LLM provider trait and a Cohere-backed implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::json_extract::parse_json_or_null;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// A single chat completion request. `temperature`/`max_tokens` are
/// per-call since extraction, verification, and synthesis prompts each use
/// different values.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: "command-a-03-2025".to_string(),
            temperature: 0.3,
            max_tokens: 1200,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A chat-completion result: the raw text the model returned plus, if it
/// parsed as JSON (after fence-stripping), the parsed value.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub raw_text: String,
    pub parsed: Option<serde_json::Value>,
}

/// A provider capable of running a single chat completion and reporting
/// both the raw text and a best-effort JSON parse.
#[async_trait]
pub trait ChatLlm: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ChatError>;
}

/// Cohere chat completions over its v2 REST API.
pub struct CohereChat {
    client: reqwest::Client,
    api_key: String,
}

impl CohereChat {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize)]
struct CohereChatRequest<'a> {
    model: &'a str,
    messages: [CohereMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct CohereMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CohereChatResponse {
    message: CohereResponseMessage,
}

#[derive(Deserialize)]
struct CohereResponseMessage {
    content: Vec<CohereContentBlock>,
}

#[derive(Deserialize)]
struct CohereContentBlock {
    text: String,
}

#[async_trait]
impl ChatLlm for CohereChat {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let body = CohereChatRequest {
            model: &request.model,
            messages: [CohereMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post("https://api.cohere.com/v2/chat")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<CohereChatResponse>()
            .await?;

        let raw_text = response
            .message
            .content
            .into_iter()
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        let parsed = parse_json_or_null(&raw_text);
        Ok(ChatResponse { raw_text, parsed })
    }
}
