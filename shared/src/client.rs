//! REST client for the events API.

use std::future::Future;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::models::{CalendarEvent, EventMutationResponse};
use crate::{Error, Result};

/// Remote side of the calendar: where the session persists its changes.
pub trait EventsBackend: Send + Sync {
    fn list_events(&self) -> impl Future<Output = Result<Vec<CalendarEvent>>> + Send;

    fn create_event(
        &self,
        event: &CalendarEvent,
    ) -> impl Future<Output = Result<CalendarEvent>> + Send;

    fn update_event(
        &self,
        event: &CalendarEvent,
    ) -> impl Future<Output = Result<CalendarEvent>> + Send;

    fn delete_event(&self, id: &str) -> impl Future<Output = Result<CalendarEvent>> + Send;
}

/// HTTP client for the `calendar_events` Lambda.
pub struct EventsClient {
    http_client: reqwest::Client,
    events_url: String,
}

impl EventsClient {
    /// `base_url` is the API root; requests go to `<base_url>/events`.
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Self {
        Self {
            http_client,
            events_url: format!("{}/events", base_url.trim_end_matches('/')),
        }
    }
}

/// Decode a success body or turn the error envelope into an `Error`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    Err(api_error(status, text))
}

/// Map a failed response to an `Error`, preferring the `error` field of the envelope.
pub(crate) fn api_error(status: StatusCode, body: String) -> Error {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        return Error::NotFound(message);
    }

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

impl EventsBackend for EventsClient {
    async fn list_events(&self) -> Result<Vec<CalendarEvent>> {
        let response = self.http_client.get(&self.events_url).send().await?;
        let events: Vec<CalendarEvent> = read_json(response).await?;
        info!(count = events.len(), "Fetched events");
        Ok(events)
    }

    async fn create_event(&self, event: &CalendarEvent) -> Result<CalendarEvent> {
        let response = self
            .http_client
            .post(&self.events_url)
            .json(event)
            .send()
            .await?;
        let created: EventMutationResponse = read_json(response).await?;
        Ok(created.event)
    }

    async fn update_event(&self, event: &CalendarEvent) -> Result<CalendarEvent> {
        let response = self
            .http_client
            .put(&self.events_url)
            .json(event)
            .send()
            .await?;
        let updated: EventMutationResponse = read_json(response).await?;
        Ok(updated.event)
    }

    async fn delete_event(&self, id: &str) -> Result<CalendarEvent> {
        let response = self
            .http_client
            .delete(&self.events_url)
            .query(&[("id", id)])
            .send()
            .await?;
        let deleted: EventMutationResponse = read_json(response).await?;
        Ok(deleted.event)
    }
}
