//! Chat-completion client for OpenAI-compatible endpoints and Anthropic.
//!
//! The oracle only ever needs one exchange: a system prompt describing the
//! seat and a user message describing the decision. Both backends are built
//! once per game and reused for every seat.

use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Which wire protocol the client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI chat completions, or any compatible endpoint (DashScope, vLLM, ...).
    OpenAI,
    /// Anthropic messages API.
    Anthropic,
}

/// Model and endpoint for the automated seats.
#[derive(Debug, Clone, Getters)]
pub struct LlmConfig {
    provider: LlmProvider,
    #[getter(skip)]
    api_key: String,
    model: String,
    max_tokens: u32,
    api_base: Option<String>,
}

impl LlmConfig {
    /// Targets the provider's public endpoint.
    pub fn new(provider: LlmProvider, api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            provider,
            api_key,
            model,
            max_tokens,
            api_base: None,
        }
    }

    /// Targets a compatible endpoint instead, e.g. DashScope.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

#[derive(Debug, Clone)]
enum Backend {
    OpenAI(OpenAIClient<OpenAIConfig>),
    Anthropic { http: reqwest::Client, url: String },
}

/// One prompt in, one reply out.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
    backend: Backend,
}

impl LlmClient {
    /// Builds the backend for the configured provider.
    #[instrument(skip(config), fields(provider = ?config.provider, model = %config.model))]
    pub fn new(config: LlmConfig) -> Self {
        let backend = match config.provider {
            LlmProvider::OpenAI => {
                let mut openai = OpenAIConfig::new().with_api_key(config.api_key.clone());
                if let Some(base) = &config.api_base {
                    openai = openai.with_api_base(base.clone());
                }
                Backend::OpenAI(OpenAIClient::with_config(openai))
            }
            LlmProvider::Anthropic => {
                let base = config
                    .api_base
                    .as_deref()
                    .unwrap_or(ANTHROPIC_API_BASE)
                    .trim_end_matches('/');
                Backend::Anthropic {
                    http: reqwest::Client::new(),
                    url: format!("{base}/v1/messages"),
                }
            }
        };
        debug!(base = ?config.api_base, "Oracle backend ready");
        Self { config, backend }
    }

    /// Settings this client was built from.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Sends one exchange and returns the model's text.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-success statuses and replies without
    /// text.
    #[instrument(skip_all, fields(model = %self.config.model, prompt_len = user.len()))]
    pub async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let reply = match &self.backend {
            Backend::OpenAI(client) => self.ask_openai(client, system, user).await?,
            Backend::Anthropic { http, url } => self.ask_anthropic(http, url, system, user).await?,
        };
        debug!(reply_len = reply.len(), "Oracle reply received");
        Ok(reply)
    }

    async fn ask_openai(
        &self,
        client: &OpenAIClient<OpenAIConfig>,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| LlmError::new(format!("Bad system prompt: {e}")))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()
                    .map_err(|e| LlmError::new(format!("Bad user prompt: {e}")))?,
            ),
        ];
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(messages)
            .max_tokens(self.config.max_tokens)
            .build()
            .map_err(|e| LlmError::new(format!("Bad completion request: {e}")))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::new(format!("Completion endpoint failed: {e}")))?;

        response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::new("Completion had no text"))
    }

    async fn ask_anthropic(
        &self,
        http: &reqwest::Client,
        url: &str,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: [UserTurn {
                role: "user",
                content: user,
            }],
        };
        let response = http
            .post(url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::new(format!("Messages endpoint unreachable: {e}")))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| LlmError::new(format!("Messages reply unreadable: {e}")))?;
        if !status.is_success() {
            return Err(LlmError::new(format!("Messages endpoint returned {status}: {raw}")));
        }
        MessagesReply::parse(&raw)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserTurn<'a>; 1],
}

#[derive(Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesReply {
    /// Joins every text block of a messages reply.
    fn parse(raw: &str) -> Result<String, LlmError> {
        let reply: MessagesReply = serde_json::from_str(raw)
            .map_err(|e| LlmError::new(format!("Messages reply is not JSON: {e}")))?;
        let text: Vec<String> = reply
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        if text.is_empty() {
            return Err(LlmError::new("Messages reply had no text"));
        }
        Ok(text.join("\n"))
    }
}

/// A failed model call, with the place it was raised.
#[derive(Debug, Clone, Display, Error)]
#[display("LLM error: {} at {}:{}", message, file, line)]
pub struct LlmError {
    /// What went wrong.
    pub message: String,
    /// Line where the error was raised.
    pub line: u32,
    /// File where the error was raised.
    pub file: &'static str,
}

impl LlmError {
    /// Records the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        let message = message.into();
        warn!(error_message = %message, file = loc.file(), line = loc.line(), "Model call failed");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
