use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::config::CoachConfig;
use crate::errors::{CoreError, CoreResult};
use crate::types::*;

/// Seam between the orchestration loop and the hosted completion endpoint.
///
/// The HTTP client implements this; tests script replies through it.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> CoreResult<AssistantReply>;
}

/// Client for the chat-completion endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ChatClient {
    /// Create a new client. Fails when no API key is configured.
    pub fn new(config: &CoachConfig) -> CoreResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            CoreError::ConfigError(
                "API key is required to initialize the completion client".to_string(),
            )
        })?;

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send one chat-completion request and parse the response.
    pub async fn chat_completion(&self, request: ChatRequest) -> CoreResult<ChatResponse> {
        let url = self.completions_url();
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, |t| t.len()),
            "Calling completion endpoint"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CoreError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                CoreError::ResponseError(format!("Failed to read error response: {}", e))
            })?;
            error!(status = %status, "Completion endpoint returned an error");

            return Err(CoreError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        let response_body = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| CoreError::ParsingError(format!("Failed to parse response: {}", e)))?;

        Ok(response_body)
    }

    /// Helper to distill the first candidate into text + tool calls.
    pub fn extract_reply(response: ChatResponse) -> CoreResult<AssistantReply> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::ResponseError("No choices in response".to_string()))?;

        Ok(AssistantReply {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, request: ChatRequest) -> CoreResult<AssistantReply> {
        let response = self.chat_completion(request).await?;
        Self::extract_reply(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatResponse, Choice, ResponseMessage};

    #[test]
    fn missing_api_key_is_a_config_error() {
        let config = CoachConfig::default();
        let err = ChatClient::new(&config).unwrap_err();
        assert!(matches!(err, CoreError::ConfigError(_)));
    }

    #[test]
    fn extract_reply_takes_first_choice() {
        let response = ChatResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some("hello".to_string()),
                    tool_calls: None,
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        };
        let reply = ChatClient::extract_reply(response).unwrap();
        assert_eq!(reply.content.as_deref(), Some("hello"));
        assert!(!reply.has_tool_calls());
    }

    #[test]
    fn extract_reply_rejects_empty_choices() {
        let response = ChatResponse {
            choices: vec![],
            usage: None,
        };
        assert!(matches!(
            ChatClient::extract_reply(response),
            Err(CoreError::ResponseError(_))
        ));
    }
}
