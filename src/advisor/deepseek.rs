// src/advisor/deepseek.rs
use crate::advisor::TextGenerator;
use crate::config::AdvisorConfig;
use crate::domain::errors::{AdvisorError, AdvisorResult};
use crate::http::{HttpClient, HttpError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

const SYSTEM_PROMPT: &str =
    "You are a professional quantitative trading analyst, skilled in technical and volume-price analysis.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// OpenAI-style chat completion client for DeepSeek
pub struct DeepSeekClient {
    http: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl DeepSeekClient {
    pub fn new(http: HttpClient, config: &AdvisorConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_body(&self, prompt: &str, temperature: f64) -> AdvisorResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature,
            max_tokens: self.max_tokens,
        };
        serde_json::to_string(&request)
            .map_err(|e| AdvisorError::InvalidResponse(format!("failed to encode request: {}", e)))
    }
}

/// First choice's message content of a chat completion body
pub fn parse_completion(body: &str) -> AdvisorResult<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AdvisorError::InvalidResponse(format!("unparsable completion: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AdvisorError::InvalidResponse("completion has no choices".to_string()))
}

#[async_trait]
impl TextGenerator for DeepSeekClient {
    async fn generate(&self, prompt: &str, temperature: f64) -> AdvisorResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AdvisorError::MissingCredential("DEEPSEEK_API_KEY is not set".to_string()))?;

        let body = self.request_body(prompt, temperature)?;
        let authorization = format!("Bearer {}", api_key);
        log::debug!("Requesting completion from {} ({})", self.api_url, self.model);

        let response = self
            .http
            .post_json(
                &self.api_url,
                &[("Authorization", authorization.as_str())],
                body,
                self.timeout,
            )
            .await
            .map_err(|e| match e {
                HttpError::Timeout(secs) => {
                    AdvisorError::Http(format!("request timed out after {}s", secs))
                }
                other => AdvisorError::Http(other.to_string()),
            })?;

        if !response.is_success() {
            return Err(AdvisorError::Http(format!(
                "status {}: {}",
                response.status, response.body
            )));
        }
        parse_completion(&response.body)
    }
}
