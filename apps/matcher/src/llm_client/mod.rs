/// LLM Client — the text-generation collaborator behind rubric extraction and scoring.
///
/// The evaluation core never talks to a model directly: it depends on [`TextGenerator`],
/// and [`LlmClient`] is the OpenRouter-backed implementation used in production.
/// Responses are returned as raw text; pulling JSON out of them is the sanitizer's job.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Unexpected API response format: {0}")]
    UnexpectedFormat(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One generation call. `name` labels the call in logs (e.g. `rubric_extraction`).
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub name: &'a str,
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Raw generator output plus what the call cost.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub model: String,
    pub usage: Usage,
    pub latency: Duration,
}

/// Anything that turns a prompt into free text. Swap implementations without touching
/// the evaluation pipeline.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation, LlmError>;

    /// Model identifier recorded alongside cached rubrics.
    fn model(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

impl ChatResponse {
    /// Text of the first choice, rejecting API-level errors and blank output.
    fn into_text(self) -> Result<(String, Usage), LlmError> {
        if let Some(error) = self.error {
            return Err(LlmError::Api {
                status: 200,
                message: error.message,
            });
        }
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            LlmError::UnexpectedFormat("response contained no choices".to_string())
        })?;
        let text = choice
            .message
            .content
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;
        Ok((text, self.usage))
    }
}

/// OpenRouter chat-completions client with retry on 429/5xx.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            model,
        })
    }

    /// Same credentials, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    async fn call(&self, request: &ChatRequest<'_>) -> Result<(String, Usage), LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(OPENROUTER_API_URL)
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(request)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.text().await?;
            let parsed: ChatResponse = serde_json::from_str(&body)?;
            return parsed.into_text();
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            messages,
        };

        let started = Instant::now();
        let (text, usage) = self.call(&body).await?;
        let latency = started.elapsed();

        debug!(
            call = request.name,
            model = %self.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            latency_ms = latency.as_millis() as u64,
            "LLM call succeeded"
        );

        Ok(Generation {
            text,
            model: self.model.clone(),
            usage,
            latency,
        })
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

/// Exponential backoff before retry `attempt`. With `MAX_RETRIES = 3` only 1s and 2s are used.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1 << attempt.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_chat_response_text_and_usage() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"criteria\": []}"}}],
            "usage": {"prompt_tokens": 812, "completion_tokens": 240, "total_tokens": 1052}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let (text, usage) = parsed.into_text().unwrap();
        assert_eq!(text, "{\"criteria\": []}");
        assert_eq!(usage.total_tokens, 1052);
    }

    #[test]
    fn test_chat_response_api_error_body() {
        let body = r#"{"error": {"message": "model overloaded", "code": 502}}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        match parsed.into_text().unwrap_err() {
            LlmError::Api { message, .. } => assert_eq!(message, "model overloaded"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_chat_response_without_choices() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            parsed.into_text(),
            Err(LlmError::UnexpectedFormat(_))
        ));
    }

    #[test]
    fn test_chat_response_blank_content() {
        let body = r#"{"choices": [{"message": {"content": "   "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(parsed.into_text(), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_request_serializes_system_then_user() {
        let body = ChatRequest {
            model: "anthropic/claude-haiku-4.5",
            max_tokens: 2000,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "json only",
                },
                ChatMessage {
                    role: "user",
                    content: "extract",
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "extract");
        assert_eq!(json["max_tokens"], 2000);
    }
}
