//! Text completion against an OpenAI-compatible `/chat/completions` endpoint
//! (OpenAI, Ollama, vLLM, llama.cpp server, ...).
//!
//! One request per call and no retries; errors surface as
//! `CompletionFailure`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use siftrag_core::config::LlmSettings;
use siftrag_core::error::Error;
use siftrag_core::traits::TextCompletion;

pub struct OpenAiCompatible {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    client: Client,
}

impl OpenAiCompatible {
    pub fn from_settings(settings: &LlmSettings) -> siftrag_core::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            temperature: settings.temperature,
            client,
        })
    }

    pub fn model(&self) -> &str { &self.model }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let request = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": self.temperature,
            "stream": false
        });

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key { builder = builder.bearer_auth(key); }
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow!("Request to {} timed out", self.endpoint)
            } else if e.is_connect() {
                anyhow!("Failed to connect to {}: {}", self.endpoint, e)
            } else {
                anyhow!("Request to {} failed: {}", self.endpoint, e)
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| anyhow!("Failed to read response body from {}: {}", self.endpoint, e))?;
        if !status.is_success() {
            let preview: String = body.chars().take(300).collect();
            return Err(anyhow!("API error ({}): {}", status, preview));
        }
        extract_content(&body)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// First choice's message content from a chat completion body.
fn extract_content(body: &str) -> Result<String> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        let preview: String = trimmed.chars().take(200).collect();
        return Err(anyhow!("endpoint returned HTML instead of JSON: {}", preview));
    }
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(300).collect();
        anyhow!("Failed to parse JSON: {}. Body: {}", e, preview)
    })?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| anyhow!("completion returned empty choices array"))
}

#[async_trait]
impl TextCompletion for OpenAiCompatible {
    async fn complete(&self, prompt: &str) -> siftrag_core::Result<String> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "completion request");
        self.chat(prompt).await.map_err(|e| Error::CompletionFailure(format!("{e:#}")))
    }
}
