//! Client-side calendar state: the loaded event list and the chat transcript.
//!
//! Every mutation goes to the backend first; the local list is only touched
//! once the backend accepted the change.

use chrono::{SecondsFormat, Utc};
use tracing::{error, info};

use crate::action::{CalendarAction, ChatEvent, ChatRequest};
use crate::assistant::ActionSource;
use crate::client::EventsBackend;
use crate::models::CalendarEvent;
use crate::{Error, Result};

/// Reply used when the chatbot produced nothing actionable.
pub const NO_ACTION_REPLY: &str = "No valid action found in AI response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

pub struct CalendarSession<B> {
    backend: B,
    timezone: String,
    events: Vec<CalendarEvent>,
    messages: Vec<ChatMessage>,
}

impl<B: EventsBackend> CalendarSession<B> {
    pub fn new(backend: B, timezone: impl Into<String>) -> Self {
        Self {
            backend,
            timezone: timezone.into(),
            events: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn find(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Replace the local list with what the backend holds.
    pub async fn load(&mut self) -> Result<()> {
        self.events = self.backend.list_events().await?;
        info!(count = self.events.len(), "Loaded events");
        Ok(())
    }

    pub async fn add_event(&mut self, event: CalendarEvent) -> Result<&CalendarEvent> {
        let saved = self.backend.create_event(&event).await?;
        self.events.push(saved);
        Ok(&self.events[self.events.len() - 1])
    }

    /// Rewrite a loaded event after normalizing it the way the editor does.
    pub async fn update_event(&mut self, event: CalendarEvent) -> Result<&CalendarEvent> {
        self.persist_update(event.normalized()).await
    }

    /// Rewrite a loaded event exactly as given.
    async fn persist_update(&mut self, event: CalendarEvent) -> Result<&CalendarEvent> {
        let index = self
            .events
            .iter()
            .position(|e| e.id == event.id)
            .ok_or_else(|| Error::NotFound(format!("No event found with id {}", event.id)))?;

        let saved = self.backend.update_event(&event).await?;
        self.events[index] = saved;
        Ok(&self.events[index])
    }

    pub async fn delete_event(&mut self, id: &str) -> Result<CalendarEvent> {
        let removed = self.backend.delete_event(id).await?;
        self.events.retain(|e| e.id != id);
        Ok(removed)
    }

    /// Send a user message to the chatbot and apply whatever it asks for.
    ///
    /// Returns the AI reply appended to the transcript, or `None` for a blank message.
    pub async fn chat<S: ActionSource>(&mut self, message: &str, source: &S) -> Option<String> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: message.to_string(),
        });

        let request = ChatRequest {
            user_request: message.to_string(),
            now: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            timezone: self.timezone.clone(),
            events: self.events.iter().map(ChatEvent::from).collect(),
        };

        let reply = match source.request_action(&request).await {
            Ok(Some(action)) => match self.apply(action).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!(error = %e, "Failed to apply chatbot action");
                    format!("Something went wrong: {}", e)
                }
            },
            Ok(None) => NO_ACTION_REPLY.to_string(),
            Err(e) => {
                error!(error = %e, "Chatbot request failed");
                format!("Something went wrong: {}", e)
            }
        };

        self.messages.push(ChatMessage {
            sender: Sender::Ai,
            text: reply.clone(),
        });
        Some(reply)
    }

    async fn apply(&mut self, action: CalendarAction) -> Result<String> {
        match action {
            CalendarAction::DeleteEvent(args) => {
                let Some(description) = self.find(&args.id).map(|e| e.description.clone()) else {
                    return Ok(format!("No event found with id {}", args.id));
                };
                self.delete_event(&args.id).await?;
                Ok(format!("Deleted event: {}", description))
            }
            CalendarAction::AddEvent(args) => {
                let event = args.to_event()?;
                self.add_event(event).await?;
                Ok(format!(
                    "Added event: {} from {} to {}",
                    args.description, args.start, args.end
                ))
            }
            CalendarAction::UpdateEvent(args) => {
                if self.find(&args.id).is_none() {
                    return Ok(format!("No event found with id {}", args.id));
                }
                let event = args.to_event()?;
                self.persist_update(event).await?;
                Ok(format!(
                    "Updated event: {} from {} to {}",
                    args.description, args.start, args.end
                ))
            }
        }
    }
}
