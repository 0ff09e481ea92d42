//! LLM access for options generation.
//!
//! Two layers:
//! - [`LlmClient`]: a chat-completion client (OpenRouter in production)
//! - [`OptionsLlm`]: the boundary the generator talks to. It takes a system
//!   prompt, ordered user turns and a temperature, and returns the answer
//!   split around its fenced options block, or `None` on any failure.

mod error;
mod extract;
mod openrouter;

pub use error::{LlmError, RetryConfig};
pub use extract::split_fenced;
pub use openrouter::OpenRouterClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::LlmResponse;

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A text message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Response from a chat completion.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    pub model: Option<String>,
}

/// Token usage information (if provided by the upstream provider).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Optional sampling parameters for chat completions.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u64>,
}

/// Chat-completion client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> anyhow::Result<ChatResponse>;
}

/// Boundary used by the options generator.
///
/// All failures (transport, empty answer, no fenced block) collapse to `None`.
#[async_trait]
pub trait OptionsLlm: Send + Sync {
    async fn invoke(
        &self,
        system: &str,
        user_turns: &[String],
        temperature: f64,
    ) -> Option<LlmResponse>;
}

/// [`OptionsLlm`] backed by a chat-completion client.
pub struct ChatOptionsLlm {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl ChatOptionsLlm {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// System message first, then one user message per turn.
    pub fn messages(system: &str, user_turns: &[String]) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::new(Role::System, system))
            .chain(
                user_turns
                    .iter()
                    .map(|turn| ChatMessage::new(Role::User, turn.as_str())),
            )
            .collect()
    }
}

#[async_trait]
impl OptionsLlm for ChatOptionsLlm {
    async fn invoke(
        &self,
        system: &str,
        user_turns: &[String],
        temperature: f64,
    ) -> Option<LlmResponse> {
        let messages = Self::messages(system, user_turns);
        let options = ChatOptions {
            temperature: Some(temperature),
            ..ChatOptions::default()
        };

        let response = match self
            .client
            .chat_completion(&self.model, &messages, options)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("LLM request failed: {}", e);
                return None;
            }
        };

        if let Some(usage) = &response.usage {
            tracing::debug!(
                "LLM usage: prompt={} completion={} total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        let Some(content) = response.content.filter(|c| !c.trim().is_empty()) else {
            tracing::warn!(
                "LLM returned no content (finish_reason: {:?})",
                response.finish_reason
            );
            return None;
        };

        let split = split_fenced(&content);
        if split.is_none() {
            tracing::warn!("LLM response has no fenced options block");
        }
        split
    }
}
