//! Calendar Chat - Terminal client for the events API and the AI chatbot.
//!
//! Loads the calendar, prints it, then reads commands from stdin:
//! - `list` - print the loaded events
//! - `delete <id>` - delete an event directly
//! - `quit` / `exit` - leave
//! - anything else - sent to the chatbot, whose action is applied

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use shared::{CalendarEvent, CalendarSession, ChatbotClient, ClientConfig, EventsClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    List,
    Delete(&'a str),
    Quit,
    Chat(&'a str),
}

fn parse_command(line: &str) -> Option<Command<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match line.split_once(char::is_whitespace) {
        Some(("delete", id)) if !id.trim().contains(char::is_whitespace) => {
            Some(Command::Delete(id.trim()))
        }
        _ => match line {
            "list" => Some(Command::List),
            "quit" | "exit" => Some(Command::Quit),
            _ => Some(Command::Chat(line)),
        },
    }
}

fn format_event(event: &CalendarEvent) -> String {
    let start = event.start_date.with_timezone(&Local);
    let end = event.end_date.with_timezone(&Local);
    let when = if event.all_day {
        format!("{} (all day)", start.format("%a %b %d"))
    } else {
        format!("{} - {}", start.format("%a %b %d %H:%M"), end.format("%H:%M"))
    };
    format!("{:<38} {}  {}", event.id, when, event.description)
}

fn print_events(events: &[CalendarEvent]) {
    if events.is_empty() {
        println!("(no events)");
        return;
    }

    let mut sorted: Vec<&CalendarEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.start_date);
    for event in sorted {
        println!("{}", format_event(event));
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush().context("Failed to flush stdout")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()
        .context("EVENTS_API_URL and AI_ENDPOINT must be set")?;

    let http_client = reqwest::Client::new();
    let backend = EventsClient::new(http_client.clone(), &config.events_api_url);
    let chatbot = ChatbotClient::new(http_client, config.ai_endpoint.clone());

    let mut session = CalendarSession::new(backend, config.timezone.clone());
    session.load().await.context("Failed to load events")?;

    info!(timezone = %config.timezone, "Calendar loaded");
    print_events(session.events());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            None => {}
            Some(Command::Quit) => break,
            Some(Command::List) => print_events(session.events()),
            Some(Command::Delete(id)) => match session.delete_event(id).await {
                Ok(deleted) => println!("Deleted event: {}", deleted.description),
                Err(e) => println!("Could not delete {}: {}", id, e),
            },
            Some(Command::Chat(message)) => {
                if let Some(reply) = session.chat(message, &chatbot).await {
                    println!("{}", reply);
                }
            }
        }
        prompt()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("   "), None);
        assert_eq!(parse_command("list"), Some(Command::List));
        assert_eq!(parse_command(" exit "), Some(Command::Quit));
        assert_eq!(parse_command("delete  evt-1 "), Some(Command::Delete("evt-1")));
        assert_eq!(parse_command("delete"), Some(Command::Chat("delete")));
        assert_eq!(
            parse_command("delete lunch tomorrow please"),
            Some(Command::Chat("delete lunch tomorrow please"))
        );
        assert_eq!(
            parse_command("move standup to 10am"),
            Some(Command::Chat("move standup to 10am"))
        );
    }
}
