//! Language model access for the chatbot, via the Bedrock Converse API.

use std::future::Future;

use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use aws_sdk_bedrockruntime::Client as BedrockClient;

use crate::{Error, Result};

/// A model that answers one user turn under a system prompt.
pub trait CompletionModel: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Bedrock-hosted model.
pub struct BedrockModel {
    client: BedrockClient,
    model_id: String,
    max_tokens: i32,
}

impl BedrockModel {
    pub fn new(client: BedrockClient, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            max_tokens: 512,
        }
    }
}

impl CompletionModel for BedrockModel {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(user_message.to_string()))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build message: {}", e)))?;

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(system_prompt.to_string()))
            .messages(message)
            .inference_config(
                InferenceConfiguration::builder()
                    .max_tokens(self.max_tokens)
                    .temperature(0.0)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| Error::Aws(format!("Failed to invoke model: {}", e.into_service_error())))?;

        let output = response
            .output()
            .ok_or_else(|| Error::Aws("No output from model".to_string()))?
            .as_message()
            .map_err(|_| Error::Aws("Model output is not a message".to_string()))?;

        let text: Vec<&str> = output
            .content()
            .iter()
            .filter_map(|block| block.as_text().ok())
            .map(String::as_str)
            .collect();

        if text.is_empty() {
            return Err(Error::Aws("Model returned no text".to_string()));
        }

        Ok(text.join("\n"))
    }
}
