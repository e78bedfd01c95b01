//! Shared data models.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{Error, Result};

/// Hours an all-day event spans once normalized.
pub const ALL_DAY_SPAN_HOURS: i64 = 12;

/// A calendar event as stored in DynamoDB and exchanged over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub all_day: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl CalendarEvent {
    /// Create an event with a freshly generated id.
    pub fn new(
        description: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        all_day: bool,
    ) -> Self {
        Self {
            id: generate_id(),
            description: description.into(),
            all_day,
            start_date,
            end_date,
        }
    }

    /// Zero the seconds of both bounds; an all-day event ends twelve hours after it starts.
    pub fn normalized(mut self) -> Self {
        self.start_date = truncate_to_minute(self.start_date);
        self.end_date = if self.all_day {
            self.start_date + Duration::hours(ALL_DAY_SPAN_HOURS)
        } else {
            truncate_to_minute(self.end_date)
        };
        self
    }
}

fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// Generate a new event id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Body of a create or update request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(default, alias = "_id")]
    #[validate(length(min = 1, max = 256))]
    pub id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 4096))]
    pub description: String,
    #[serde(default)]
    pub all_day: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl EventPayload {
    /// Validate and build the event to create, generating an id when the client sent none.
    pub fn into_new_event(self) -> Result<CalendarEvent> {
        self.check()?;
        Ok(CalendarEvent {
            id: self.id.unwrap_or_else(generate_id),
            description: self.description,
            all_day: self.all_day,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }

    /// Validate and build the replacement for an existing event.
    pub fn into_existing_event(self) -> Result<CalendarEvent> {
        self.check()?;
        let id = self
            .id
            .ok_or_else(|| Error::Validation("id is required".to_string()))?;
        Ok(CalendarEvent {
            id,
            description: self.description,
            all_day: self.all_day,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }

    fn check(&self) -> Result<()> {
        self.validate()?;
        if self.end_date < self.start_date {
            return Err(Error::Validation(
                "endDate must not precede startDate".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of a delete request.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(alias = "_id")]
    pub id: String,
}

/// Response to a successful write.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventMutationResponse {
    pub message: String,
    pub event: CalendarEvent,
}
