//! Inbound chat request structures
//!
//! Decodes the raw request body and resolves it into the ordered turn list
//! and sampling parameters handed to the Gemini mapper.

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{ForwardError, ForwardResult};
use crate::config::Settings;

/// Conversation role on the Gemini side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Map an OpenAI-style role. Only `"assistant"` becomes `Model`.
    pub fn from_openai(role: Option<&str>) -> Self {
        match role {
            Some("assistant") => Role::Model,
            _ => Role::User,
        }
    }
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }
}

/// Sampling parameters. `None` means the value could not be read as a
/// number and is left to the provider's default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
}

/// A validated chat request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub turns: Vec<ChatTurn>,
    pub sampling: SamplingParams,
}

impl ChatRequest {
    /// Resolve a decoded body into turns and sampling parameters.
    pub fn from_body(body: &Value, settings: &Settings) -> ForwardResult<Self> {
        let turns = build_turns(body)?;
        let sampling = SamplingParams {
            temperature: coerce_float(body.get("temperature"), settings.default_temperature),
            top_p: coerce_float(body.get("top_p"), settings.default_top_p),
        };
        Ok(Self { turns, sampling })
    }
}

/// Decode the raw request body.
///
/// Empty body and JSON `null` are an empty object. A JSON string is
/// treated as a double-encoded payload and decoded again.
pub fn parse_body(raw: &[u8]) -> ForwardResult<Value> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| ForwardError::MalformedPayload(e.to_string()))?;

    let value = match value {
        Value::String(inner) => serde_json::from_str::<Value>(&inner)
            .map_err(|e| ForwardError::MalformedPayload(e.to_string()))?,
        other => other,
    };

    Ok(match value {
        Value::Null => Value::Object(Map::new()),
        other => other,
    })
}

/// Build the turn list: a non-empty `messages` array wins over `prompt`.
pub fn build_turns(body: &Value) -> ForwardResult<Vec<ChatTurn>> {
    if let Some(messages) = body
        .get("messages")
        .and_then(Value::as_array)
        .filter(|m| !m.is_empty())
    {
        return Ok(messages
            .iter()
            .map(|msg| ChatTurn {
                role: Role::from_openai(msg.get("role").and_then(Value::as_str)),
                text: message_text(msg.get("content")),
            })
            .collect());
    }

    match body.get("prompt").and_then(Value::as_str) {
        Some(prompt) if !prompt.trim().is_empty() => Ok(vec![ChatTurn::user(prompt)]),
        _ => Err(ForwardError::MissingInput),
    }
}

/// Flatten OpenAI message content to plain text.
fn message_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                Value::Object(obj) => {
                    let part_type = obj.get("type").and_then(Value::as_str).unwrap_or("text");
                    if part_type == "text" {
                        obj.get("text").and_then(Value::as_str)
                    } else {
                        None
                    }
                }
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Coerce a sampling value to `f64`.
///
/// Absent uses `default`; numbers and numeric strings are read; anything
/// else yields `None`.
pub fn coerce_float(value: Option<&Value>, default: f64) -> Option<f64> {
    match value {
        None => Some(default),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Some(_) => None,
    }
}
