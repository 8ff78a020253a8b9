//! Thread model representing one independent conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Message, Role};

/// Placeholder title carried by a thread until real content names it
pub const NEW_CHAT_TITLE: &str = "New Chat";

/// Unique identifier for a chat thread
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A conversation with its own title and append-only message history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    pub id: ThreadId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl ChatThread {
    /// Create an empty thread with a fresh id and the sentinel title
    pub fn new() -> Self {
        Self::with_id(ThreadId::generate(), Utc::now())
    }

    pub fn with_id(id: ThreadId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: NEW_CHAT_TITLE.to_string(),
            messages: Vec::new(),
            created_at,
        }
    }

    /// Whether the title is still the "New Chat" placeholder
    pub fn has_sentinel_title(&self) -> bool {
        self.title == NEW_CHAT_TITLE
    }

    /// The newest assistant message, if any
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }
}

impl Default for ChatThread {
    fn default() -> Self {
        Self::new()
    }
}
