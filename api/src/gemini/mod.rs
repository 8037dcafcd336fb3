pub mod client;

use async_trait::async_trait;
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeminiConfig;

pub use client::GeminiClient;

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY not configured")]
    MissingApiKey,
    #[error("failed to reach the generative language service: {0}")]
    Transport(String),
    #[error("{0}")]
    Upstream(String),
    #[error("malformed generative language response: {0}")]
    MalformedResponse(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl From<&GeminiConfig> for GenerationConfig {
    fn from(config: &GeminiConfig) -> Self {
        GenerationConfig {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    /// A single-turn request holding `prompt` as its only part.
    pub fn single_turn(prompt: &str, generation_config: GenerationConfig) -> Self {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Transport to the generative language service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GeminiError>;
}

/// Sends one prompt and returns the first generated candidate.
pub struct ChatClient {
    api: Box<dyn GenerationApi>,
    api_key: Option<String>,
    generation_config: GenerationConfig,
}

impl ChatClient {
    pub fn new(
        api: Box<dyn GenerationApi>,
        api_key: Option<String>,
        generation_config: GenerationConfig,
    ) -> Self {
        ChatClient {
            api,
            api_key,
            generation_config,
        }
    }

    pub async fn ask(&self, prompt: &str) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;

        let request = GenerateRequest::single_turn(prompt, self.generation_config.clone());
        debug!("Sending a {} bytes prompt", prompt.len());
        let response = self.api.generate(api_key, &request).await?;

        let text = response
            .first_text()
            .ok_or_else(|| GeminiError::MalformedResponse("no candidate text".to_string()))?;
        info!("Received a {} bytes reply", text.len());

        Ok(text.to_string())
    }
}
