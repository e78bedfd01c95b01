//! Client for the chatbot endpoint.

use std::future::Future;

use serde_json::Value;
use tracing::{debug, info};

use crate::action::{action_from_value, CalendarAction, ChatRequest};
use crate::client::api_error;
use crate::Result;

/// Something that turns a chat request into at most one calendar action.
pub trait ActionSource: Send + Sync {
    fn request_action(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<Option<CalendarAction>>> + Send;
}

/// HTTP client for the chatbot Lambda.
pub struct ChatbotClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl ChatbotClient {
    pub fn new(http_client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }
}

impl ActionSource for ChatbotClient {
    async fn request_action(&self, request: &ChatRequest) -> Result<Option<CalendarAction>> {
        info!(events = request.events.len(), "Sending chat request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, body));
        }

        let envelope: Value = response.json().await?;
        debug!(reply = ?envelope.get("reply"), "Chatbot replied");

        Ok(action_from_envelope(&envelope))
    }
}

/// The action carried by a `{"action": ..., "reply": ...}` chatbot response.
fn action_from_envelope(envelope: &Value) -> Option<CalendarAction> {
    envelope.get("action").cloned().and_then(action_from_value)
}
