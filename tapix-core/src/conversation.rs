//! Append-only conversation history for one session

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::prompts::GREETING;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered history. Messages can only be appended; nothing is edited or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Start a conversation seeded with the assistant greeting
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ConversationMessage::assistant(greeting)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &ConversationMessage {
        self.push(ConversationMessage::user(content))
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &ConversationMessage {
        self.push(ConversationMessage::assistant(content))
    }

    fn push(&mut self, msg: ConversationMessage) -> &ConversationMessage {
        self.messages.push(msg);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    /// Most recent user message, if any
    pub fn last_user(&self) -> Option<&ConversationMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    pub fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_greeting() {
        let c = Conversation::new();
        assert_eq!(c.len(), 1);
        assert_eq!(c.messages()[0].role, Role::Assistant);
        assert_eq!(c.messages()[0].content, GREETING);
        assert!(c.last_user().is_none());
    }

    #[test]
    fn test_append_order() {
        let mut c = Conversation::with_greeting("hi");
        c.push_user("How much on Tesco?");
        c.push_assistant("£71.28");
        assert_eq!(c.len(), 3);
        assert_eq!(c.last_user().unwrap().content, "How much on Tesco?");
        assert_eq!(c.last().unwrap().role, Role::Assistant);
        assert_eq!(c.count(Role::Assistant), 2);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let m = ConversationMessage::assistant("ok");
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
        assert_eq!(Role::System.to_string(), "system");
    }
}
