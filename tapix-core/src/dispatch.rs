//! Response dispatcher: assembles the outbound message list and hands it to
//! an external text-generation backend.
//!
//! [`respond`] always returns text. A missing credential short-circuits to
//! [`MISSING_CREDENTIAL_ADVISORY`] without calling the backend, and every
//! backend failure becomes an apology string, so callers never branch on
//! failure.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::context::ChatContext;
use crate::conversation::{ConversationMessage, Role};
use crate::error::{LlmError, LlmResult};
use crate::prompts::{MISSING_CREDENTIAL_ADVISORY, SYSTEM_PROMPT, apology};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Prior messages forwarded with each request
pub const DEFAULT_HISTORY_WINDOW: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Deadline for the whole round-trip
    pub timeout: Duration,
    pub history_window: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

/// Everything a backend needs for one round-trip
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ConversationMessage>,
    pub options: GenerationOptions,
}

impl CompletionRequest {
    /// System-role messages joined with blank lines (for providers with a separate system field)
    pub fn system_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Non-system messages in order
    pub fn turns(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }

    /// Latest user message text
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// A synchronous text-generation capability: request in, text out
pub trait ChatBackend {
    /// Display name used in apology messages ("OpenAI", "Anthropic")
    fn name(&self) -> &str;

    /// False when no credential is configured; the dispatcher then never calls [`complete`](Self::complete)
    fn has_credential(&self) -> bool {
        true
    }

    fn complete(&self, request: &CompletionRequest) -> LlmResult<String>;
}

/// Outbound list: instruction preamble, serialized context, then the most
/// recent `history_window` conversation messages (system entries dropped).
pub fn build_messages(
    history: &[ConversationMessage],
    context: &ChatContext,
    history_window: usize,
) -> Vec<ConversationMessage> {
    let turns: Vec<&ConversationMessage> = history.iter().filter(|m| m.role != Role::System).collect();
    let start = turns.len().saturating_sub(history_window.max(1));

    let mut messages = Vec::with_capacity(2 + turns.len() - start);
    messages.push(ConversationMessage::system(SYSTEM_PROMPT));
    messages.push(ConversationMessage::system(context.to_lines()));
    messages.extend(turns[start..].iter().map(|m| (*m).clone()));
    messages
}

/// Produce the assistant reply for `history`. Never fails.
pub fn respond(
    backend: &dyn ChatBackend,
    history: &[ConversationMessage],
    context: &ChatContext,
    options: &GenerationOptions,
) -> String {
    if !backend.has_credential() {
        info!("no credential configured for {}; returning advisory", backend.name());
        return MISSING_CREDENTIAL_ADVISORY.to_string();
    }

    let request = CompletionRequest {
        messages: build_messages(history, context, options.history_window),
        options: options.clone(),
    };
    debug!(
        "dispatching {} messages to {} (model={}, max_tokens={})",
        request.messages.len(),
        backend.name(),
        options.model,
        options.max_tokens
    );

    match backend.complete(&request) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!("{} returned an empty reply", backend.name());
            apology(backend.name(), &LlmError::EmptyResponse)
        }
        Err(LlmError::MissingCredential { .. }) => MISSING_CREDENTIAL_ADVISORY.to_string(),
        Err(e) => {
            warn!("{} call failed: {e}", backend.name());
            apology(backend.name(), &e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summarize;
    use std::cell::RefCell;

    struct Scripted {
        reply: LlmResult<String>,
        credential: bool,
        seen: RefCell<Vec<CompletionRequest>>,
    }

    impl Scripted {
        fn new(reply: LlmResult<String>) -> Self {
            Self {
                reply,
                credential: true,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn has_credential(&self) -> bool {
            self.credential
        }

        fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
            self.seen.borrow_mut().push(request.clone());
            self.reply.clone()
        }
    }

    fn ctx() -> ChatContext {
        let s = summarize(&[], "2025-07".parse().unwrap());
        ChatContext::build(&s, &[], &[])
    }

    fn history() -> Vec<ConversationMessage> {
        vec![
            ConversationMessage::assistant("hello"),
            ConversationMessage::user("How much on Tesco?"),
        ]
    }

    #[test]
    fn test_message_order() {
        let msgs = build_messages(&history(), &ctx(), 12);
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].content, SYSTEM_PROMPT);
        assert_eq!(msgs[1].role, Role::System);
        assert!(msgs[1].content.contains("- total spent: 0.00"));
        assert_eq!(msgs[2].role, Role::Assistant);
        assert_eq!(msgs[3], ConversationMessage::user("How much on Tesco?"));
    }

    #[test]
    fn test_history_window_keeps_latest_user() {
        let mut h = Vec::new();
        for i in 0..20 {
            h.push(ConversationMessage::user(format!("q{i}")));
            h.push(ConversationMessage::assistant(format!("a{i}")));
        }
        h.push(ConversationMessage::system("note"));
        h.push(ConversationMessage::user("latest"));

        let msgs = build_messages(&h, &ctx(), 4);
        assert_eq!(msgs.len(), 6);
        assert_eq!(msgs.last().unwrap().content, "latest");
        assert!(msgs[2..].iter().all(|m| m.role != Role::System));

        let msgs = build_messages(&h, &ctx(), 0);
        assert_eq!(msgs.last().unwrap().content, "latest");
    }

    #[test]
    fn test_success_is_trimmed() {
        let b = Scripted::new(Ok("  You spent £71.28.\n".to_string()));
        let reply = respond(&b, &history(), &ctx(), &GenerationOptions::default());
        assert_eq!(reply, "You spent £71.28.");

        let seen = b.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].options.model, DEFAULT_MODEL);
        assert_eq!(seen[0].last_user_text(), Some("How much on Tesco?"));
        assert_eq!(seen[0].turns().count(), 2);
        assert!(seen[0].system_text().starts_with(SYSTEM_PROMPT));
    }

    #[test]
    fn test_missing_credential_short_circuits() {
        let mut b = Scripted::new(Ok("unused".to_string()));
        b.credential = false;
        let reply = respond(&b, &history(), &ctx(), &GenerationOptions::default());
        assert_eq!(reply, MISSING_CREDENTIAL_ADVISORY);
        assert!(b.seen.borrow().is_empty());
    }

    #[test]
    fn test_transport_error_becomes_apology() {
        let b = Scripted::new(Err(LlmError::Transport("connection refused".to_string())));
        let reply = respond(&b, &history(), &ctx(), &GenerationOptions::default());
        assert!(reply.starts_with("Sorry"));
        assert!(reply.contains("connection refused"));
    }

    #[test]
    fn test_timeout_and_empty_reply_become_apology() {
        let b = Scripted::new(Err(LlmError::Timeout(Duration::from_secs(30))));
        let reply = respond(&b, &history(), &ctx(), &GenerationOptions::default());
        assert!(reply.contains("timed out"));

        let b = Scripted::new(Ok("   ".to_string()));
        let reply = respond(&b, &history(), &ctx(), &GenerationOptions::default());
        assert!(reply.contains("empty reply"));
    }

    #[test]
    fn test_late_missing_credential_maps_to_advisory() {
        let b = Scripted::new(Err(LlmError::MissingCredential {
            provider: "openai".to_string(),
            env_var: "OPENAI_API_KEY".to_string(),
        }));
        let reply = respond(&b, &history(), &ctx(), &GenerationOptions::default());
        assert_eq!(reply, MISSING_CREDENTIAL_ADVISORY);
    }
}
