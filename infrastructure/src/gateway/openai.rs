//! OpenAI-compatible chat completions gateway.
//!
//! Speaks `POST {base_url}/chat/completions`. HTTP statuses map onto
//! [`InferenceError`] so the retry layer can tell transient failures
//! (429, 5xx, timeouts, resets) from permanent ones.

use crate::config::FileGatewayConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use swarm_application::{InferenceError, InferenceGateway, InferenceReply};
use swarm_domain::{ConversationTurn, TokenUsage};
use tracing::debug;

pub struct OpenAiCompatibleGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl OpenAiCompatibleGateway {
    pub fn new(
        base_url: impl AsRef<str>,
        model: impl Into<String>,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.as_ref().trim_end_matches('/')),
            api_key,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        })
    }

    /// Build a gateway from the `[gateway]` section.
    pub fn from_config(config: &FileGatewayConfig) -> Result<Self, InferenceError> {
        let gateway = Self::new(
            &config.base_url,
            config.model.clone(),
            config.resolve_api_key(),
            Duration::from_secs(config.request_timeout_seconds),
        )?;
        Ok(gateway
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request<'a>(
        &'a self,
        role_instructions: &'a str,
        conversation: &'a [ConversationTurn],
    ) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: role_instructions,
        });
        messages.extend(conversation.iter().map(|turn| ChatMessage {
            role: turn.role.as_str(),
            content: turn.content.as_str(),
        }));
        ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// `Retry-After` in delta-seconds form. HTTP dates are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn transport_error(error: reqwest::Error) -> InferenceError {
    if error.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Transport(error.to_string())
    }
}

fn into_reply(response: ChatResponse) -> Result<InferenceReply, InferenceError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| InferenceError::MalformedResponse("no message content".to_string()))?;
    let usage = response
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();
    Ok(InferenceReply::new(content, usage))
}

#[async_trait]
impl InferenceGateway for OpenAiCompatibleGateway {
    async fn invoke(
        &self,
        role_instructions: &str,
        conversation: &[ConversationTurn],
    ) -> Result<InferenceReply, InferenceError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&self.request(role_instructions, conversation));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let wait = retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            debug!("{} answered {}: {}", self.endpoint, status, body);
            return Err(match InferenceError::from_status(status.as_u16(), body) {
                InferenceError::RateLimited { .. } => InferenceError::RateLimited { retry_after: wait },
                other => other,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;
        into_reply(parsed)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
