use std::env;

use async_trait::async_trait;
use eyre::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("OPENAI_API_KEY is not set. Create a .env file or set the env var.")]
    MissingApiKey,
    #[error("OPENAI_BASE_URL is not a valid URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("API response contained no completion text")]
    EmptyResponse,
}

/// Role tag of a chat message, as understood by the completion endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Seam between the session loop and the completion endpoint, so the loop
/// can be exercised against a test double.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(model: String) -> Result<Self, ApiError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| ApiError::MissingApiKey)?;

        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url)?;

        let client = reqwest::Client::new();

        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

fn build_request_body(model: &str, messages: &[Message]) -> Value {
    let formatted_messages = messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role.as_str(),
                "content": message.content,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "model": model,
        "messages": formatted_messages,
    })
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

fn extract_reply(completion: ChatCompletionResponse) -> Result<String, ApiError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(ApiError::EmptyResponse)
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let api_url = format!("{}/chat/completions", self.base_url);

        let request_body = build_request_body(&self.model, messages);

        debug!(
            "Sending request to OpenAI API: {}",
            serde_json::to_string_pretty(&request_body)?
        );

        let response = self
            .client
            .post(&api_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            error!("API request failed with response: {}", error_text);
            return Err(ApiError::RequestFailed(error_text).into());
        }

        let completion: ChatCompletionResponse = response.json().await?;

        debug!("Received response from OpenAI API");

        Ok(extract_reply(completion)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_fatal() {
        env::remove_var("OPENAI_API_KEY");
        let result = OpenAiClient::new("gpt-4o-mini".to_string());
        assert!(matches!(result, Err(ApiError::MissingApiKey)));
    }

    #[test]
    fn role_maps_to_wire_name() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn request_body_carries_model_and_messages() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];
        let body = build_request_body("gpt-4o-mini", &messages);

        assert_eq!(body["model"], "gpt-4o-mini");

        let sent = body["messages"].as_array().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["role"], "system");
        assert_eq!(sent[0]["content"], "be brief");
        assert_eq!(sent[1]["role"], "user");
        assert_eq!(sent[1]["content"], "hi");
    }

    #[test]
    fn reply_extracted_from_first_choice() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "hello there"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_reply(completion).unwrap(), "hello there");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let completion: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            extract_reply(completion),
            Err(ApiError::EmptyResponse)
        ));
    }

    #[test]
    fn null_content_is_an_error() {
        let completion: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(
            extract_reply(completion),
            Err(ApiError::EmptyResponse)
        ));
    }
}
