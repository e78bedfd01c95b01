//! AI Chatbot Lambda - Turns a natural-language request into one calendar action.
//!
//! Receives the user's message together with the current time, timezone and
//! event list, asks a Bedrock model for exactly one action, and returns
//! `{"action": ..., "reply": ...}`. `action` is null when the model's reply
//! holds no recognizable action.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::action::{parse_action, ChatRequest, ChatResponse};
use shared::{parse_body, BedrockModel, CompletionModel, Config, Cors};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState<M> {
    model: M,
    cors: Cors,
}

impl AppState<BedrockModel> {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env();
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()))
            .load()
            .await;
        let bedrock_client = aws_sdk_bedrockruntime::Client::new(&aws_config);

        info!(model_id = %config.bedrock_model_id, "Using chatbot model");

        Ok(Self {
            model: BedrockModel::new(bedrock_client, config.bedrock_model_id),
            cors: Cors::new(config.cors_allow_origin),
        })
    }
}

/// System prompt describing the action format and the calendar's current state.
fn build_system_prompt(request: &ChatRequest) -> Result<String, Error> {
    let events = serde_json::to_string_pretty(&request.events)?;

    Ok(format!(
        r#"You manage a user's calendar. Reply with exactly one JSON object and nothing else.

To add an event:
{{"type": "calendar.addEvent", "args": {{"description": string, "start": string, "end": string, "allDay": boolean}}}}

To update an existing event (every field is rewritten):
{{"type": "calendar.updateEvent", "args": {{"_id": string, "description": string, "start": string, "end": string, "allDay": boolean}}}}

To delete an existing event:
{{"type": "calendar.deleteEvent", "args": {{"_id": string}}}}

Timestamps are RFC 3339 with an explicit UTC offset. Interpret relative dates
from the current time {now} in the {timezone} timezone. Only use an "_id" that
appears in the event list. If the request is not one of these actions, reply
with {{"type": "none"}}.

Current events:
{events}"#,
        now = request.now,
        timezone = request.timezone,
        events = events,
    ))
}

async fn handle_chat<M: CompletionModel>(
    state: &AppState<M>,
    request: ChatRequest,
) -> Result<Response<Body>, Error> {
    let user_request = request.user_request.trim();
    if user_request.is_empty() {
        return state.cors.error(400, "userRequest cannot be empty");
    }

    info!(events = request.events.len(), timezone = %request.timezone, "Chat request");

    let system_prompt = build_system_prompt(&request)?;

    let reply = match state.model.complete(&system_prompt, user_request).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "Model invocation failed");
            return state.cors.error(502, "Chatbot is unavailable");
        }
    };

    let action = parse_action(&reply);
    info!(has_action = action.is_some(), "Chat reply parsed");

    state.cors.json(200, &ChatResponse { action, reply })
}

async fn handler<M: CompletionModel>(
    state: &AppState<M>,
    event: Request,
) -> Result<Response<Body>, Error> {
    let cors = &state.cors;

    match event.method().as_str() {
        "OPTIONS" => cors.preflight(),
        "POST" => {
            let request: ChatRequest = parse_body!(cors, event.body());
            handle_chat(state, request).await
        }
        other => cors.error(400, format!("Invalid request type: {}", other)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state.as_ref(), event).await }
    }))
    .await
}
