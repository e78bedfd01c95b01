//! Structured calendar actions produced by the chatbot, and its wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::CalendarEvent;
use crate::{Error, Result};

/// One mutation the chatbot asks the calendar to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args")]
pub enum CalendarAction {
    #[serde(rename = "calendar.addEvent")]
    AddEvent(AddEventArgs),
    #[serde(rename = "calendar.updateEvent")]
    UpdateEvent(UpdateEventArgs),
    #[serde(rename = "calendar.deleteEvent")]
    DeleteEvent(DeleteEventArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEventArgs {
    pub description: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub all_day: bool,
}

impl AddEventArgs {
    /// Build a new event with a generated id.
    pub fn to_event(&self) -> Result<CalendarEvent> {
        Ok(CalendarEvent::new(
            self.description.clone(),
            parse_timestamp(&self.start)?,
            parse_timestamp(&self.end)?,
            self.all_day,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventArgs {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub description: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub all_day: bool,
}

impl UpdateEventArgs {
    /// Build the replacement for the event named by `id`.
    pub fn to_event(&self) -> Result<CalendarEvent> {
        Ok(CalendarEvent {
            id: self.id.clone(),
            description: self.description.clone(),
            all_day: self.all_day,
            start_date: parse_timestamp(&self.start)?,
            end_date: parse_timestamp(&self.end)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEventArgs {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
}

/// Parse an RFC 3339 timestamp coming from the chatbot.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Validation(format!("Invalid timestamp '{}': {}", value, e)))
}

/// Find a calendar action in model output.
///
/// Accepts bare JSON, JSON surrounded by prose or code fences, and an
/// `{"action": ...}` envelope.
pub fn parse_action(text: &str) -> Option<CalendarAction> {
    let trimmed = text.trim();

    let value = serde_json::from_str::<Value>(trimmed).ok().or_else(|| {
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        if start >= end {
            return None;
        }
        serde_json::from_str(&trimmed[start..=end]).ok()
    })?;

    action_from_value(value)
}

/// Interpret a JSON value as an action, unwrapping an `action` envelope.
pub fn action_from_value(value: Value) -> Option<CalendarAction> {
    let value = match value {
        Value::Object(mut map) if !map.contains_key("type") && map.contains_key("action") => {
            map.remove("action")?
        }
        other => other,
    };

    serde_json::from_value(value).ok()
}

/// Event as presented to the chatbot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub all_day: bool,
}

impl From<&CalendarEvent> for ChatEvent {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id.clone(),
            description: event.description.clone(),
            start: Some(event.start_date.to_rfc3339()),
            end: Some(event.end_date.to_rfc3339()),
            all_day: event.all_day,
        }
    }
}

/// Request sent to the chatbot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_request: String,
    pub now: String,
    pub timezone: String,
    #[serde(default)]
    pub events: Vec<ChatEvent>,
}

/// Reply from the chatbot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub action: Option<CalendarAction>,
    #[serde(default)]
    pub reply: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_event() {
        let text = r#"{"type":"calendar.addEvent","args":{"description":"Dinner","start":"2026-10-20T18:00:00-04:00","end":"2026-10-20T20:00:00-04:00","allDay":false}}"#;

        let action = parse_action(text).unwrap();
        let CalendarAction::AddEvent(args) = action else {
            panic!("expected add action");
        };
        let event = args.to_event().unwrap();
        assert_eq!(event.description, "Dinner");
        assert_eq!(event.start_date.to_rfc3339(), "2026-10-20T22:00:00+00:00");
    }

    #[test]
    fn test_parse_delete_from_fenced_prose() {
        let text = "Sure, removing it now.\n```json\n{\"type\": \"calendar.deleteEvent\", \"args\": {\"_id\": \"evt-7\"}}\n```";

        assert_eq!(
            parse_action(text),
            Some(CalendarAction::DeleteEvent(DeleteEventArgs {
                id: "evt-7".to_string()
            }))
        );
    }

    #[test]
    fn test_parse_action_envelope() {
        let text = r#"{"action":{"type":"calendar.updateEvent","args":{"_id":"evt-2","description":"Standup","start":"2026-10-20T09:00:00Z","end":"2026-10-20T09:15:00Z"}}}"#;

        let Some(CalendarAction::UpdateEvent(args)) = parse_action(text) else {
            panic!("expected update action");
        };
        assert_eq!(args.id, "evt-2");
        assert!(!args.all_day);
    }

    #[test]
    fn test_rejects_incomplete_or_unknown_actions() {
        assert_eq!(parse_action("I could not understand that."), None);
        assert_eq!(
            parse_action(r#"{"type":"calendar.deleteEvent","args":{}}"#),
            None
        );
        assert_eq!(
            parse_action(r#"{"type":"calendar.addEvent","args":{"description":"x","start":"2026-10-20T09:00:00Z"}}"#),
            None
        );
        assert_eq!(
            parse_action(r#"{"type":"calendar.moveEvent","args":{"_id":"1"}}"#),
            None
        );
        assert_eq!(parse_action(r#"{"action":null}"#), None);
    }

    #[test]
    fn test_bad_timestamp_is_validation_error() {
        let args = AddEventArgs {
            description: "Dinner".to_string(),
            start: "tomorrow at six".to_string(),
            end: "2026-10-20T20:00:00Z".to_string(),
            all_day: false,
        };
        assert!(matches!(args.to_event(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_chat_request_wire_format() {
        let request = ChatRequest {
            user_request: "cancel lunch".to_string(),
            now: "2026-10-19T12:00:00Z".to_string(),
            timezone: "America/New_York".to_string(),
            events: vec![ChatEvent {
                id: "1".to_string(),
                description: "Lunch".to_string(),
                start: Some("2026-10-19T16:00:00+00:00".to_string()),
                end: None,
                all_day: false,
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userRequest"], "cancel lunch");
        assert_eq!(json["events"][0]["_id"], "1");
        assert_eq!(json["events"][0]["allDay"], false);
        assert!(json["events"][0]["end"].is_null());
    }
}
