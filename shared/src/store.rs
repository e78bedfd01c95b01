//! Persistence for calendar events.
//!
//! One DynamoDB item per event, keyed by `id`. Updates rewrite every non-key
//! attribute; deletes return the removed item.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::CalendarEvent;
use crate::{Error, Result};

type Item = HashMap<String, AttributeValue>;

/// CRUD operations over the event table.
pub trait EventStore: Send + Sync {
    /// Every stored event.
    fn list_events(&self) -> impl Future<Output = Result<Vec<CalendarEvent>>> + Send;

    /// Insert or overwrite an event.
    fn put_event(&self, event: &CalendarEvent) -> impl Future<Output = Result<()>> + Send;

    /// Rewrite an existing event, returning the stored result.
    fn update_event(
        &self,
        event: &CalendarEvent,
    ) -> impl Future<Output = Result<CalendarEvent>> + Send;

    /// Remove an event, returning what was removed.
    fn delete_event(&self, id: &str) -> impl Future<Output = Result<CalendarEvent>> + Send;
}

/// DynamoDB-backed store.
#[derive(Clone)]
pub struct DynamoEventStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoEventStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn key(id: &str) -> (String, AttributeValue) {
    ("id".to_string(), AttributeValue::S(id.to_string()))
}

/// Pull one attribute out of an encoded event so updates store what puts store.
fn take(item: &mut Item, name: &str) -> Result<AttributeValue> {
    item.remove(name)
        .ok_or_else(|| Error::Internal(format!("Encoded event has no {} attribute", name)))
}

impl EventStore for DynamoEventStore {
    async fn list_events(&self) -> Result<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| Error::Aws(format!("Failed to scan events: {}", e.into_service_error())))?;

            for item in output.items.unwrap_or_default() {
                let decoded: serde_dynamo::Result<CalendarEvent> = from_item(item);
                match decoded {
                    Ok(event) => events.push(event),
                    Err(e) => warn!(error = %e, "Skipping undecodable event item"),
                }
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        info!(count = events.len(), table = %self.table_name, "Scanned events");
        Ok(events)
    }

    async fn put_event(&self, event: &CalendarEvent) -> Result<()> {
        let item: Item = to_item(event)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| Error::Aws(format!("Failed to put event: {}", e.into_service_error())))?;

        Ok(())
    }

    async fn update_event(&self, event: &CalendarEvent) -> Result<CalendarEvent> {
        let (key_name, key_value) = key(&event.id);
        let mut item: Item = to_item(event)?;

        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .update_expression(
                "SET #description = :d, #allDay = :a, #startDate = :s, #endDate = :e",
            )
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", "id")
            .expression_attribute_names("#description", "description")
            .expression_attribute_names("#allDay", "allDay")
            .expression_attribute_names("#startDate", "startDate")
            .expression_attribute_names("#endDate", "endDate")
            .expression_attribute_values(":d", take(&mut item, "description")?)
            .expression_attribute_values(":a", take(&mut item, "allDay")?)
            .expression_attribute_values(":s", take(&mut item, "startDate")?)
            .expression_attribute_values(":e", take(&mut item, "endDate")?)
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    Error::NotFound(format!("Event {} not found", event.id))
                } else {
                    Error::Aws(format!("Failed to update event: {}", service_error))
                }
            })?;

        let attributes = output
            .attributes
            .ok_or_else(|| Error::Aws("Update returned no attributes".to_string()))?;

        Ok(from_item(attributes)?)
    }

    async fn delete_event(&self, id: &str) -> Result<CalendarEvent> {
        let (key_name, key_value) = key(id);

        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| Error::Aws(format!("Failed to delete event: {}", e.into_service_error())))?;

        match output.attributes {
            Some(attributes) if !attributes.is_empty() => Ok(from_item(attributes)?),
            _ => Err(Error::NotFound(format!("Event {} not found", id))),
        }
    }
}

/// In-process store for local runs and tests.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<BTreeMap<String, CalendarEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = CalendarEvent>) -> Self {
        Self {
            events: RwLock::new(events.into_iter().map(|e| (e.id.clone(), e)).collect()),
        }
    }
}

impl EventStore for MemoryEventStore {
    async fn list_events(&self) -> Result<Vec<CalendarEvent>> {
        Ok(self.events.read().await.values().cloned().collect())
    }

    async fn put_event(&self, event: &CalendarEvent) -> Result<()> {
        self.events
            .write()
            .await
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn update_event(&self, event: &CalendarEvent) -> Result<CalendarEvent> {
        let mut events = self.events.write().await;
        match events.get_mut(&event.id) {
            Some(stored) => {
                *stored = event.clone();
                Ok(stored.clone())
            }
            None => Err(Error::NotFound(format!("Event {} not found", event.id))),
        }
    }

    async fn delete_event(&self, id: &str) -> Result<CalendarEvent> {
        self.events
            .write()
            .await
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("Event {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::delete_item::DeleteItemOutput;
    use aws_sdk_dynamodb::operation::scan::ScanOutput;
    use aws_sdk_dynamodb::operation::update_item::{UpdateItemError, UpdateItemOutput};
    use aws_sdk_dynamodb::types::error::ConditionalCheckFailedException;
    use aws_smithy_mocks::{mock, mock_client, RuleMode};
    use chrono::{TimeZone, Utc};

    fn event(id: &str, description: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            description: description.to_string(),
            all_day: false,
            start_date: Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_item_layout() {
        let item: Item = to_item(&event("evt-1", "Dentist")).unwrap();

        assert_eq!(item["id"], AttributeValue::S("evt-1".to_string()));
        assert_eq!(item["allDay"], AttributeValue::Bool(false));
        assert_eq!(
            item["startDate"],
            AttributeValue::S("2026-10-19T09:00:00Z".to_string())
        );

        let back: CalendarEvent = from_item(item).unwrap();
        assert_eq!(back.description, "Dentist");
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryEventStore::new();
        store.put_event(&event("evt-1", "Dentist")).await.unwrap();

        let mut changed = event("evt-1", "Dentist (moved)");
        changed.all_day = true;
        let updated = store.update_event(&changed).await.unwrap();
        assert_eq!(updated, changed);

        let listed = store.list_events().await.unwrap();
        assert_eq!(listed, vec![changed.clone()]);

        let deleted = store.delete_event("evt-1").await.unwrap();
        assert_eq!(deleted, changed);
        assert!(store.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_missing_ids() {
        let store = MemoryEventStore::new();

        assert!(matches!(
            store.update_event(&event("ghost", "x")).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.delete_event("ghost").await,
            Err(Error::NotFound(_))
        ));
    }

    fn item(event: &CalendarEvent) -> Item {
        to_item(event).unwrap()
    }

    #[tokio::test]
    async fn test_scan_follows_pages_and_skips_bad_items() {
        let mut legacy = item(&event("evt-2", "Legacy"));
        legacy.insert(
            "startDate".to_string(),
            AttributeValue::S("Mon Oct 19 2026 09:00:00 GMT-0400".to_string()),
        );

        let first_page = mock!(DynamoClient::scan)
            .match_requests(|req| req.exclusive_start_key().is_none())
            .then_output(move || {
                ScanOutput::builder()
                    .items(item(&event("evt-1", "Dentist")))
                    .items(legacy.clone())
                    .last_evaluated_key("id", AttributeValue::S("evt-2".to_string()))
                    .build()
            });
        let second_page = mock!(DynamoClient::scan)
            .match_requests(|req| {
                req.exclusive_start_key().and_then(|k| k.get("id"))
                    == Some(&AttributeValue::S("evt-2".to_string()))
            })
            .then_output(|| {
                ScanOutput::builder()
                    .items(item(&event("evt-3", "Gym")))
                    .build()
            });

        let client = mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&first_page, &second_page]);
        let store = DynamoEventStore::new(client, "calendar-events");

        let events = store.list_events().await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["evt-1", "evt-3"]);
        assert_eq!(first_page.num_calls(), 1);
        assert_eq!(second_page.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_update_writes_same_timestamps_as_put() {
        let mut changed = event("evt-1", "Dentist (moved)");
        changed.start_date = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        let expected = item(&changed);
        let returned = expected.clone();

        let update = mock!(DynamoClient::update_item)
            .match_requests(move |req| {
                let values = req.expression_attribute_values();
                values.and_then(|v| v.get(":s")) == expected.get("startDate")
                    && values.and_then(|v| v.get(":e")) == expected.get("endDate")
                    && values.and_then(|v| v.get(":a")) == Some(&AttributeValue::Bool(false))
            })
            .then_output(move || {
                UpdateItemOutput::builder()
                    .set_attributes(Some(returned.clone()))
                    .build()
            });

        let client = mock_client!(aws_sdk_dynamodb, [&update]);
        let store = DynamoEventStore::new(client, "calendar-events");

        let updated = store.update_event(&changed).await.unwrap();
        assert_eq!(updated, changed);
        assert_eq!(
            item(&changed)["startDate"],
            AttributeValue::S("2026-10-19T09:30:00.250Z".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_of_missing_event_is_not_found() {
        let update = mock!(DynamoClient::update_item).then_error(|| {
            UpdateItemError::ConditionalCheckFailedException(
                ConditionalCheckFailedException::builder()
                    .message("The conditional request failed")
                    .build(),
            )
        });

        let client = mock_client!(aws_sdk_dynamodb, [&update]);
        let store = DynamoEventStore::new(client, "calendar-events");

        assert!(matches!(
            store.update_event(&event("ghost", "x")).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_without_old_item_is_not_found() {
        let delete = mock!(DynamoClient::delete_item)
            .match_requests(|req| {
                req.key().and_then(|k| k.get("id")) == Some(&AttributeValue::S("ghost".to_string()))
            })
            .then_output(|| DeleteItemOutput::builder().build());

        let client = mock_client!(aws_sdk_dynamodb, [&delete]);
        let store = DynamoEventStore::new(client, "calendar-events");

        assert!(matches!(
            store.delete_event("ghost").await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(delete.num_calls(), 1);
    }
}
