//! HTTP client utilities for forwarding requests
//!
//! One POST per chat request, no retry.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::error::{ForwardError, ForwardResult};
use crate::config::Settings;
use crate::error::{AppError, AppResult};

/// Create the shared HTTP client.
///
/// The total timeout is only set when configured; otherwise the transport
/// default applies.
pub fn create_client(settings: &Settings) -> AppResult<Client> {
    let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
    if let Some(secs) = settings.request_timeout_secs.filter(|s| *s > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Map a reqwest error to a transport failure. The URL is stripped first
/// since it carries the API key.
fn transport_error(e: reqwest::Error, context: &str) -> ForwardError {
    let e = e.without_url();
    if e.is_timeout() {
        ForwardError::Transport(format!("{}: request timeout", context))
    } else if e.is_connect() {
        ForwardError::Transport(format!(
            "{}: connection failed: {}",
            context,
            error_chain(&e)
        ))
    } else {
        ForwardError::Transport(format!("{}: {}", context, error_chain(&e)))
    }
}

/// `e` followed by its causes, e.g. "error sending request: tcp connect
/// error: Connection refused".
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// POST `body` to `url` with the API key as the `key` query parameter and
/// decode the reply as JSON, whatever its HTTP status.
pub async fn generate_content<B: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &B,
) -> ForwardResult<Value> {
    let start = Instant::now();

    crate::logger::debug("client", &format!("Sending request to: {}", url));

    let response = client
        .post(url)
        .query(&[("key", api_key)])
        .json(body)
        .send()
        .await
        .map_err(|e| transport_error(e, "Request failed"))?;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;
    crate::logger::debug(
        "client",
        &format!("Response status: {} ({}ms)", status, latency_ms),
    );

    let text = response
        .text()
        .await
        .map_err(|e| transport_error(e, "Failed to read response"))?;

    parse_json_response(&text).map_err(|e| {
        ForwardError::Transport(format!(
            "Failed to parse response (HTTP {}): {}",
            status.as_u16(),
            e
        ))
    })
}

/// Parse the provider reply.
pub fn parse_json_response(response_text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str::<Value>(response_text.trim())
}
