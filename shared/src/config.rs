//! Configuration management for the Lambda functions and the terminal client.

use std::env;

/// Default DynamoDB table holding calendar events.
pub const DEFAULT_TABLE_NAME: &str = "calendar-events";

/// Default Bedrock model used by the chatbot.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";

/// Default timezone sent to the chatbot.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Lambda configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB table name
    pub table_name: String,
    /// AWS region
    pub aws_region: String,
    /// Value of the Access-Control-Allow-Origin header
    pub cors_allow_origin: String,
    /// Bedrock model id for the chatbot
    pub bedrock_model_id: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            table_name: env::var("TABLE_NAME").unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string()),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-2".to_string()),
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            bedrock_model_id: env::var("BEDROCK_MODEL_ID")
                .unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string()),
        }
    }
}

/// Terminal client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the events API
    pub events_api_url: String,
    /// URL of the chatbot endpoint
    pub ai_endpoint: String,
    /// IANA timezone name the chatbot should reason in
    pub timezone: String,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            events_api_url: env::var("EVENTS_API_URL")?,
            ai_endpoint: env::var("AI_ENDPOINT")?,
            timezone: env::var("CALENDAR_TIMEZONE")
                .unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string()),
        })
    }
}
