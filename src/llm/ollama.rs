//! Ollama HTTP client for chat completions and embeddings.

use super::{Embedder, TextGenerator};
use crate::config::ModelConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Connection and model settings for [`OllamaClient`].
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub ollama_url: String,
    pub model_name: String,
    pub embed_model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl From<&ModelConfig> for LlmSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            ollama_url: config.ollama_url.trim_end_matches('/').to_string(),
            model_name: config.name.clone(),
            embed_model: config.embed_model.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        }
    }
}

/// Message in a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Ollama embed API request.
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Ollama embed API response.
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for a single Ollama server.
pub struct OllamaClient {
    settings: LlmSettings,
    http_client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client with the configured request timeout.
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    async fn post_json<Req: Serialize + ?Sized>(&self, endpoint: &str, body: &Req) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.settings.ollama_url, endpoint);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Request timed out after {}s", self.settings.timeout_seconds)
                } else if e.is_connect() {
                    anyhow::anyhow!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.settings.ollama_url
                    )
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Ollama API error {}: {}", status, body));
        }

        Ok(response)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = OllamaChatRequest {
            model: &self.settings.model_name,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: self.settings.temperature,
            },
        };

        debug!(
            "Sending chat request to {} ({} prompt chars)",
            self.settings.model_name,
            prompt.len()
        );

        let chat_response: OllamaChatResponse = self
            .post_json("/api/chat", &request)
            .await?
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OllamaEmbedRequest {
            model: &self.settings.embed_model,
            input: texts,
        };

        let embed_response: OllamaEmbedResponse = self
            .post_json("/api/embed", &request)
            .await?
            .json()
            .await
            .context("Failed to parse Ollama embed response")?;

        if embed_response.embeddings.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Ollama returned {} embeddings for {} inputs",
                embed_response.embeddings.len(),
                texts.len()
            ));
        }

        Ok(embed_response.embeddings)
    }
}
