//! Forward module
//!
//! Accepts OpenAI-style chat requests and answers them through Gemini.
//!
//! ## Flow
//!
//! ```text
//! Request -> context (decode, validate) -> gemini (map) -> client (POST)
//!                                                             |
//! Response <- openai (ChatCompletion) <- gemini (extract) <---+
//! ```
//!
//! ## Components
//!
//! - `context`: body decoding, turn building, sampling coercion
//! - `gemini`: `generateContent` request/response mapping
//! - `openai`: chat completion response schema
//! - `client`: HTTP client and the single upstream call
//! - `error`: error types

pub mod client;
pub mod context;
pub mod error;
pub mod gemini;
pub mod openai;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Client;

use crate::config::Settings;

pub use context::{ChatRequest, ChatTurn, Role, SamplingParams};
pub use error::{ForwardError, ForwardResult};
pub use openai::ChatCompletion;

/// The chat adapter: settings plus the shared HTTP client.
///
/// Each call to [`ChatAdapter::handle`] is independent; the adapter itself
/// holds no mutable state.
pub struct ChatAdapter {
    settings: Arc<Settings>,
    client: Client,
}

impl ChatAdapter {
    pub fn new(settings: Arc<Settings>, client: Client) -> Self {
        Self { settings, client }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle one request.
    ///
    /// `Ok(None)` is the pre-flight answer (200, empty body).
    pub async fn handle(
        &self,
        method: &Method,
        body: &[u8],
    ) -> ForwardResult<Option<ChatCompletion>> {
        if let Some(answer) = answer_by_method(method) {
            return answer;
        }

        let body = context::parse_body(body)?;
        let request = ChatRequest::from_body(&body, &self.settings)?;

        let Some(api_key) = self.settings.api_key() else {
            return Err(ForwardError::Misconfiguration);
        };

        self.generate(&request, api_key).await.map(Some)
    }

    async fn generate(&self, request: &ChatRequest, api_key: &str) -> ForwardResult<ChatCompletion> {
        let start = Instant::now();
        let model = self.settings.model.as_str();

        crate::logger::info(
            "gemini",
            &format!(
                "Request started: model={}, turns={}",
                model,
                request.turns.len()
            ),
        );

        let url = gemini::build_url(&self.settings);
        let body = gemini::build_request(request, self.settings.max_output_tokens);
        let response = client::generate_content(&self.client, &url, api_key, &body).await?;
        let text = gemini::extract_text(&response)?;

        crate::logger::info(
            "gemini",
            &format!(
                "Request completed: model={}, chars={}, latency={}ms",
                model,
                text.chars().count(),
                start.elapsed().as_millis()
            ),
        );

        Ok(ChatCompletion::from_text(model, text))
    }
}

/// Requests the method alone settles: pre-flight and anything but POST.
fn answer_by_method(method: &Method) -> Option<ForwardResult<Option<ChatCompletion>>> {
    if *method == Method::OPTIONS {
        Some(Ok(None))
    } else if *method != Method::POST {
        Some(Err(ForwardError::MethodNotAllowed(method.to_string())))
    } else {
        None
    }
}

/// Chat endpoint
///
/// Route: ANY {chat_path} (POST and OPTIONS are served, the rest get 405).
/// A body that cannot be buffered (over the size limit) is a 400.
pub async fn chat(
    State(adapter): State<Arc<ChatAdapter>>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let result = match body {
        Ok(body) => adapter.handle(&method, &body).await,
        Err(rejection) => answer_by_method(&method)
            .unwrap_or_else(|| Err(ForwardError::MalformedPayload(rejection.body_text()))),
    };
    match result {
        Ok(Some(completion)) => Json(completion).into_response(),
        Ok(None) => StatusCode::OK.into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(api_key: Option<&str>) -> ChatAdapter {
        let settings = Settings {
            api_key: api_key.map(str::to_string),
            // nothing listens here; tests below never reach the network
            api_base: "http://127.0.0.1:9".to_string(),
            ..Settings::default()
        };
        let client = client::create_client(&settings).unwrap();
        ChatAdapter::new(Arc::new(settings), client)
    }

    #[tokio::test]
    async fn test_options_short_circuits() {
        let result = adapter(None).handle(&Method::OPTIONS, b"{not json").await;
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_other_methods_rejected_before_parsing() {
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
            let err = adapter(Some("k"))
                .handle(&method, b"{not json")
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "method_not_allowed");
            assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn test_validation_precedes_key_check() {
        let a = adapter(None);
        let err = a.handle(&Method::POST, b"{oops").await.unwrap_err();
        assert_eq!(err.kind(), "malformed_payload");

        let err = a.handle(&Method::POST, br#"{"prompt": " "}"#).await.unwrap_err();
        assert_eq!(err.kind(), "missing_input");

        let err = a.handle(&Method::POST, br#"{"prompt": "hi"}"#).await.unwrap_err();
        assert_eq!(err, ForwardError::Misconfiguration);
    }
}
