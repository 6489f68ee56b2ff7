//! Conversation turns supplied by the caller.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ConversationTurn {
    /// Creates a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.speaker == Speaker::Assistant
    }
}

/// Returns the text of the most recent assistant turn, or `""` when there is none.
pub fn last_assistant_text(history: &[ConversationTurn]) -> &str {
    history
        .iter()
        .rev()
        .find(|turn| turn.is_assistant())
        .map(|turn| turn.text.as_str())
        .unwrap_or("")
}
