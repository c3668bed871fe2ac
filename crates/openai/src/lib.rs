//! Chat-completion client for prompt refinement.
//!
//! The backend can optionally pass the user's prompt through an
//! OpenAI-compatible LLM before generation -- either to polish it with a
//! refiner system prompt, or (metaprompt mode) to treat the user's text as
//! an instruction to write the actual image prompt.

use serde::{Deserialize, Serialize};

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for refinement calls.
const DEFAULT_MODEL: &str = "gpt-4o";

/// Sentinel reply meaning the model declines to rewrite the prompt.
/// Declining is not an error; the original prompt is used unchanged.
const CANNOT_HELP: &str = "CANNOT HELP";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Errors from the chat-completion layer.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Chat API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The API returned no choices.
    #[error("Chat API returned an empty response")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for an OpenAI-compatible chat-completion API.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the API base URL (for compatible providers or test mocks).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Refine `user_prompt` under `system_message`.
    ///
    /// Returns the assistant's rewrite, or the original prompt unchanged
    /// when the model replies with the decline sentinel.
    pub async fn refine(
        &self,
        user_prompt: &str,
        system_message: &str,
    ) -> Result<String, OpenAiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_message,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(OpenAiError::EmptyResponse)?;

        if content.trim() == CANNOT_HELP {
            tracing::info!("Refiner declined; using original prompt");
            return Ok(user_prompt.to_string());
        }

        tracing::info!(chars = content.len(), "Refiner proposed a rewritten prompt");
        Ok(content)
    }
}
