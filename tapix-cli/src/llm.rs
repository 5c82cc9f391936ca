use anyhow::{Result, bail};
use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tapix_core::{
    ChatBackend, CompletionRequest, ConversationMessage, LlmError, LlmResult, OfflineBackend, Period, Role,
    Transaction,
};

use crate::auth::{AuthState, resolve_api_key};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
    /// Rule-based answers from the loaded data, no network
    Offline,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Offline => "offline",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Offline => "offline assistant",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Anthropic => "claude-3-5-sonnet-latest",
            Provider::Offline => "rules",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::Offline => "",
        }
    }

    pub fn key_env(self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Offline => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "offline" | "local" => Ok(Provider::Offline),
            other => bail!("unknown provider '{other}' (expected openai, anthropic or offline)"),
        }
    }
}

/// Remote chat-completion endpoint reached over HTTPS
pub struct HttpBackend {
    provider: Provider,
    api_key: Option<String>,
    key_env: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(provider: Provider, api_key: Option<String>, key_env: impl Into<String>, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .unwrap_or(provider.default_base_url())
            .trim_end_matches('/')
            .to_string();
        Self {
            provider,
            api_key,
            key_env: key_env.into(),
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        match self.provider {
            Provider::Anthropic => format!("{}/v1/messages", self.base_url),
            _ => format!("{}/v1/chat/completions", self.base_url),
        }
    }

    async fn complete_async(&self, key: &str, request: &CompletionRequest) -> LlmResult<String> {
        let timeout = request.options.timeout;
        let builder = self.client.post(self.endpoint()).timeout(timeout);
        let builder = match self.provider {
            Provider::Anthropic => builder
                .header("x-api-key", key)
                .header("anthropic-version", "2023-06-01")
                .header(CONTENT_TYPE, "application/json")
                .json(&anthropic_body(request)),
            _ => builder
                .header(AUTHORIZATION, format!("Bearer {key}"))
                .json(&openai_body(request)),
        };

        let resp = builder.send().await.map_err(|e| transport_error(e, timeout))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error(e, timeout))?;
        if !status.is_success() {
            return Err(LlmError::Provider {
                status: status.as_u16(),
                body: truncate(&text, 300),
            });
        }

        match self.provider {
            Provider::Anthropic => parse_anthropic(&text),
            _ => parse_openai(&text),
        }
    }
}

impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        self.provider.display_name()
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(LlmError::MissingCredential {
                provider: self.provider.to_string(),
                env_var: self.key_env.clone(),
            });
        };
        debug!("POST {} model={}", self.endpoint(), request.options.model);

        // `main` runs inside a multi-threaded runtime; a nested block_on would panic,
        // so hop off the worker with block_in_place when one is present.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete_async(key, request)))
        } else {
            let rt = tokio::runtime::Runtime::new().map_err(|e| LlmError::Transport(format!("create tokio runtime: {e}")))?;
            rt.block_on(self.complete_async(key, request))
        }
    }
}

fn transport_error(e: reqwest::Error, timeout: std::time::Duration) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(timeout)
    } else {
        LlmError::Transport(e.to_string())
    }
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}

#[derive(Debug, Serialize, PartialEq)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<WireMessage>,
}

fn openai_body(request: &CompletionRequest) -> OpenAiRequest {
    OpenAiRequest {
        model: request.options.model.clone(),
        messages: request
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: m.content.clone(),
            })
            .collect(),
        max_tokens: request.options.max_tokens,
        temperature: request.options.temperature,
    }
}

/// The messages API takes system text separately and wants a user turn first
/// with alternating roles, so leading assistant turns are dropped and runs of
/// the same role are merged.
fn anthropic_body(request: &CompletionRequest) -> AnthropicRequest {
    let mut messages: Vec<WireMessage> = Vec::new();
    let turns = request
        .turns()
        .skip_while(|m: &&ConversationMessage| m.role == Role::Assistant);
    for m in turns {
        match messages.last_mut() {
            Some(prev) if prev.role == m.role.as_str() => {
                prev.content.push_str("\n\n");
                prev.content.push_str(&m.content);
            }
            _ => messages.push(WireMessage {
                role: m.role.as_str(),
                content: m.content.clone(),
            }),
        }
    }
    AnthropicRequest {
        model: request.options.model.clone(),
        max_tokens: request.options.max_tokens,
        temperature: request.options.temperature,
        system: request.system_text(),
        messages,
    }
}

fn parse_openai(body: &str) -> LlmResult<String> {
    #[derive(Deserialize)]
    struct Resp {
        choices: Vec<Choice>,
    }
    #[derive(Deserialize)]
    struct Choice {
        message: MsgOut,
    }
    #[derive(Deserialize)]
    struct MsgOut {
        content: Option<String>,
    }

    let out: Resp = serde_json::from_str(body).map_err(|e| LlmError::Malformed(e.to_string()))?;
    let content = out
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    Ok(content.trim().to_string())
}

fn parse_anthropic(body: &str) -> LlmResult<String> {
    #[derive(Deserialize)]
    struct Resp {
        content: Vec<ContentBlock>,
    }
    #[derive(Deserialize)]
    struct ContentBlock {
        #[serde(rename = "type")]
        t: String,
        text: Option<String>,
    }

    let out: Resp = serde_json::from_str(body).map_err(|e| LlmError::Malformed(e.to_string()))?;
    let text: String = out
        .content
        .into_iter()
        .filter(|b| b.t == "text")
        .filter_map(|b| b.text)
        .collect();
    Ok(text.trim().to_string())
}

/// Backend selected by `[llm] provider`
pub fn build_backend(
    config: &Config,
    auth: &AuthState,
    env: impl Fn(&str) -> Option<String>,
    transactions: Arc<[Transaction]>,
    period: Period,
) -> Box<dyn ChatBackend> {
    let provider = config.llm.provider;
    if provider == Provider::Offline {
        return Box::new(OfflineBackend::new(transactions, period, config.data.currency_symbol.clone()));
    }
    let api_key_env = config.llm.api_key_env.as_deref();
    let key = resolve_api_key(provider, api_key_env, env, auth);
    let key_env = api_key_env.or(provider.key_env()).unwrap_or_default();
    Box::new(HttpBackend::new(provider, key, key_env, config.llm.base_url.as_deref()))
}
