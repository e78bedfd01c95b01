//! Calendar Events Lambda - CRUD operations over the events table.
//!
//! Dispatches on HTTP method only; the path is not routed on:
//! - GET - List every event
//! - POST - Create an event
//! - PUT - Rewrite an existing event
//! - DELETE - Delete an event (id in the body or `?id=`)
//! - OPTIONS - CORS preflight

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::query_param;
use shared::models::{DeleteRequest, EventMutationResponse, EventPayload};
use shared::{parse_body, Config, Cors, DynamoEventStore, EventStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState<S> {
    store: S,
    cors: Cors,
}

impl AppState<DynamoEventStore> {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env();
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()))
            .load()
            .await;
        let client = aws_sdk_dynamodb::Client::new(&aws_config);

        info!(table = %config.table_name, "Using events table");

        Ok(Self {
            store: DynamoEventStore::new(client, config.table_name),
            cors: Cors::new(config.cors_allow_origin),
        })
    }
}

/// Turn a failed operation into an error response.
fn failure(cors: &Cors, err: shared::Error) -> Result<Response<Body>, Error> {
    let status = err.status_code();
    if status >= 500 {
        error!(error = %err, "Events request failed");
        return cors.error(status, "Internal server error");
    }

    warn!(error = %err, status, "Events request rejected");
    cors.error(status, err.to_string())
}

fn mutation(
    cors: &Cors,
    status: u16,
    message: &str,
    event: shared::CalendarEvent,
) -> Result<Response<Body>, Error> {
    cors.json(
        status,
        &EventMutationResponse {
            message: message.to_string(),
            event,
        },
    )
}

async fn list_events<S: EventStore>(state: &AppState<S>) -> Result<Response<Body>, Error> {
    match state.store.list_events().await {
        Ok(events) => state.cors.json(200, &events),
        Err(e) => failure(&state.cors, e),
    }
}

async fn create_event<S: EventStore>(
    state: &AppState<S>,
    payload: EventPayload,
) -> Result<Response<Body>, Error> {
    let event = match payload.into_new_event() {
        Ok(event) => event,
        Err(e) => return failure(&state.cors, e),
    };

    match state.store.put_event(&event).await {
        Ok(()) => {
            info!(event_id = %event.id, "Event created");
            mutation(&state.cors, 201, "Event created successfully", event)
        }
        Err(e) => failure(&state.cors, e),
    }
}

async fn update_event<S: EventStore>(
    state: &AppState<S>,
    payload: EventPayload,
) -> Result<Response<Body>, Error> {
    let event = match payload.into_existing_event() {
        Ok(event) => event,
        Err(e) => return failure(&state.cors, e),
    };

    match state.store.update_event(&event).await {
        Ok(updated) => {
            info!(event_id = %updated.id, "Event updated");
            mutation(&state.cors, 200, "Event updated successfully", updated)
        }
        Err(e) => failure(&state.cors, e),
    }
}

async fn delete_event<S: EventStore>(state: &AppState<S>, id: &str) -> Result<Response<Body>, Error> {
    if id.trim().is_empty() {
        return state.cors.error(400, "Event id is required");
    }

    match state.store.delete_event(id).await {
        Ok(deleted) => {
            info!(event_id = %deleted.id, "Event deleted");
            mutation(&state.cors, 200, "Event deleted successfully", deleted)
        }
        Err(e) => failure(&state.cors, e),
    }
}

async fn handler<S: EventStore>(state: &AppState<S>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let cors = &state.cors;

    info!(method, path = event.uri().path(), "Events request");

    match method {
        "OPTIONS" => cors.preflight(),
        "GET" => list_events(state).await,
        "POST" => {
            let payload: EventPayload = parse_body!(cors, event.body());
            create_event(state, payload).await
        }
        "PUT" => {
            let payload: EventPayload = parse_body!(cors, event.body());
            update_event(state, payload).await
        }
        "DELETE" => {
            let id = match query_param(&event, "id") {
                Some(id) => id,
                None => {
                    let request: DeleteRequest = parse_body!(cors, event.body());
                    request.id
                }
            };
            delete_event(state, &id).await
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
