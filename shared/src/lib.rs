//! Shared library for the calendar Lambda functions and terminal client.
//!
//! This crate provides the event model, persistence, HTTP helpers, and the
//! clients used across the events API, the chatbot, and the terminal client.

pub mod action;
pub mod assistant;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod llm;
pub mod models;
pub mod session;
pub mod store;

pub use action::{parse_action, CalendarAction, ChatRequest, ChatResponse};
pub use assistant::{ActionSource, ChatbotClient};
pub use client::{EventsBackend, EventsClient};
pub use config::{ClientConfig, Config};
pub use error::{Error, Result};
pub use http::{ApiError, Cors};
pub use llm::{BedrockModel, CompletionModel};
pub use models::{CalendarEvent, EventMutationResponse, EventPayload};
pub use session::{CalendarSession, ChatMessage, Sender};
pub use store::{DynamoEventStore, EventStore, MemoryEventStore};
