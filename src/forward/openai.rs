//! OpenAI-style chat completion response

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
    pub model: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    pub finish_reason: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

/// Token usage. Not computed by the relay, always zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl ChatCompletion {
    /// Single-choice completion carrying `content`.
    pub fn from_text(model: &str, content: String) -> Self {
        Self {
            choices: vec![Choice {
                message: ChoiceMessage { content },
                finish_reason: "stop".to_string(),
                index: 0,
            }],
            model: model.to_string(),
            usage: Usage::default(),
        }
    }
}
