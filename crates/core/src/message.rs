//! Conversation messages

use serde::{Deserialize, Serialize};

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Scammer,
    Agent,
    /// Generic inbound sender, treated like a scammer for extraction
    User,
}

impl MessageRole {
    /// Inbound (counterparty) message
    pub fn is_inbound(&self) -> bool {
        matches!(self, MessageRole::Scammer | MessageRole::User)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn scammer(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Scammer,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Agent,
            content: content.into(),
        }
    }
}
