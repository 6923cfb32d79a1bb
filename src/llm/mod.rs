pub mod queue;

use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestMessage, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::config::LlmConfig;
use crate::error::LlmError;

pub use queue::LlmQueue;

/// A chat collaborator: system instruction + user input in, raw text out.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, system_prompt: &str, user_input: &str) -> Result<String, LlmError>;
}

/// Backend for Ollama/FastAPI-style servers. The response shape varies by
/// deployment, so the reply is duck-typed: `{message:{content}}`,
/// `{response}`, `{output}`, or a bare JSON string all work.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate(&self, system_prompt: &str, user_input: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_input },
            ],
            "stream": false,
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let raw: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            // Some gateways return the model text as-is
            Err(_) => return Ok(text),
        };
        Ok(extract_content(&raw).unwrap_or(text))
    }
}

/// Pull the model text out of whichever field this backend uses.
pub(crate) fn extract_content(raw: &Value) -> Option<String> {
    if let Some(s) = raw.as_str() {
        return Some(s.to_string());
    }
    for pointer in ["/message/content", "/response", "/output"] {
        if let Some(s) = raw.pointer(pointer).and_then(|v| v.as_str()) {
            return Some(s.to_string());
        }
    }
    None
}

/// OpenAI-compatible backend (also covers local servers exposing the
/// OpenAI API via a custom base URL).
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, base_url: Option<String>, model: String) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }
        let client = Client::with_config(config);
        Self { client, model }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, system_prompt: &str, user_input: &str) -> Result<String, LlmError> {
        info!("🤖 Sending request to LLM (Model: {})...", self.model);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestMessage::System(
                    async_openai::types::ChatCompletionRequestSystemMessageArgs::default()
                        .content(system_prompt)
                        .build()
                        .map_err(|e| LlmError::Backend(e.to_string()))?,
                ),
                ChatCompletionRequestMessage::User(
                    async_openai::types::ChatCompletionRequestUserMessageArgs::default()
                        .content(user_input)
                        .build()
                        .map_err(|e| LlmError::Backend(e.to_string()))?,
                ),
            ])
            .build()
            .map_err(|e| LlmError::Backend(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| match e {
                async_openai::error::OpenAIError::Reqwest(re) => LlmError::Network(re),
                other => LlmError::Backend(other.to_string()),
            })?;

        info!("🤖 LLM Response received.");

        Ok(response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

/// Build the configured backend. Which collaborator a deployment talks to
/// is configuration, not a separate code path.
pub fn build_backend(config: &LlmConfig) -> Arc<dyn ChatBackend> {
    match config.backend.to_lowercase().as_str() {
        "openai" => Arc::new(OpenAiBackend::new(
            config.api_key.clone().unwrap_or_default(),
            config.base_url.clone(),
            config.model.clone(),
        )),
        _ => Arc::new(OllamaBackend::new(
            config
                .base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            config.model.clone(),
        )),
    }
}
