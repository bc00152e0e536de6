pub mod error;

pub use error::{LlmError, LlmResult};

use analysis_core::{AnalysisError, CompletionRequest, LanguageModel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the OpenAI-compatible chat endpoint
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    pub fn with_defaults() -> Self {
        Self::new(LlmConfig::default())
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    /// Run one chat completion and return the trimmed reply text
    pub async fn chat(&self, request: &CompletionRequest) -> LlmResult<String> {
        if !self.is_configured() {
            return Err(LlmError::MissingApiKey);
        }

        let body = build_chat_request(&self.config.model, request);
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        tracing::debug!(
            "Chat completion: model={}, temperature={}, prompt_chars={}",
            body.model,
            body.temperature,
            request.prompt.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        match response.status().as_u16() {
            401 => return Err(LlmError::InvalidApiKey),
            429 => return Err(LlmError::RateLimited),
            s if !(200..300).contains(&s) => {
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::ServiceUnavailable(format!("Status: {} {}", s, text)));
            }
            _ => {}
        }

        let text = response.text().await?;
        parse_chat_response(&text)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AnalysisError> {
        self.chat(&request).await.map_err(AnalysisError::from)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn build_chat_request(model: &str, request: &CompletionRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system {
        messages.push(ChatMessage {
            role: "system",
            content: system.clone(),
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: request.prompt.clone(),
    });

    ChatRequest {
        model: model.to_string(),
        messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

fn parse_chat_response(body: &str) -> LlmResult<String> {
    let response: ChatResponse = serde_json::from_str(body)?;
    extract_content(response)
}

fn extract_content(response: ChatResponse) -> LlmResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .ok_or_else(|| LlmError::InvalidResponse("No content in response".to_string()))
}
