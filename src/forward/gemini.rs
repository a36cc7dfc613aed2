//! Gemini API mapping
//!
//! Builds `generateContent` requests from chat turns and pulls the
//! completion text back out of the reply.

use serde::Serialize;
use serde_json::Value;

use super::context::{ChatRequest, Role};
use super::error::{ForwardError, ForwardResult};
use crate::config::Settings;

/// `generateContent` request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    pub max_output_tokens: u32,
}

/// Map a validated chat request to the Gemini request body.
pub fn build_request(request: &ChatRequest, max_output_tokens: u32) -> GenerateContentRequest {
    let contents = request
        .turns
        .iter()
        .map(|turn| Content {
            role: turn.role,
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        })
        .collect();

    GenerateContentRequest {
        contents,
        generation_config: GenerationConfig {
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            max_output_tokens,
        },
    }
}

/// `generateContent` URL for the configured model. The API key is added as
/// a query parameter by the client, so this URL is safe to log.
pub fn build_url(settings: &Settings) -> String {
    format!(
        "{}/{}/models/{}:generateContent",
        settings.api_base.trim_end_matches('/'),
        settings.api_version.trim_matches('/'),
        settings.model
    )
}

/// Extract the first candidate's text from a Gemini reply.
pub fn extract_text(response: &Value) -> ForwardResult<String> {
    if let Some(error) = response.get("error").filter(|e| is_present(e)) {
        return Err(ForwardError::Upstream(upstream_error_message(error)));
    }

    let Some(candidate) = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .filter(|c| is_present(c))
    else {
        return Err(ForwardError::EmptyUpstreamResponse(block_reason(response)));
    };

    candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or(ForwardError::EmptyContent)
}

fn is_present(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn upstream_error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        _ => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    }
}

fn block_reason(response: &Value) -> Option<String> {
    response
        .get("promptFeedback")
        .and_then(|pf| pf.get("blockReason"))
        .and_then(Value::as_str)
        .map(|reason| format!("Content blocked: {}", reason))
}
