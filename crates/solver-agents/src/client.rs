//! OpenAI-compatible chat client.
//!
//! Speaks `POST {base_url}/chat/completions`, which Gemini, OpenAI, Groq,
//! Mistral, Together, Fireworks, DeepSeek and Ollama all expose.

use crate::model::{ChatMessage, ModelCapability, ModelError};
use async_trait::async_trait;
use reasoner::ModelInfo;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    /// Reasoning models may put everything here and leave `content` empty.
    #[serde(default)]
    reasoning_content: Option<String>,
}

/// Pull the answer text out of a decoded response.
fn extract_content(response: ChatResponse) -> Result<String, ModelError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(ModelError::EmptyResponse)?;

    let content = choice
        .message
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let reasoning = choice
        .message
        .reasoning_content
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    content.or(reasoning).ok_or(ModelError::EmptyResponse)
}

pub struct OpenAiCompatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    info: ModelInfo,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiCompatClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        info: ModelInfo,
    ) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            info,
            temperature: crate::config::DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelCapability for OpenAiCompatClient {
    fn info(&self) -> ModelInfo {
        self.info.clone()
    }

    async fn ask(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: &self.info.name,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let started = Instant::now();
        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(model = %self.info, status = status.as_u16(), "model provider error");
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::InvalidResponse(format!("{e}")))?;
        let content = extract_content(decoded)?;

        tracing::debug!(
            model = %self.info,
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = content.len(),
            "model response"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<String, ModelError> {
        extract_content(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_endpoint_joins_path() {
        let info = ModelInfo::new("openai", "gpt-4o-mini");
        let client =
            OpenAiCompatClient::new(reqwest::Client::new(), "https://api.openai.com/v1/", None, info);
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("2x = 4")];
        let request = ChatRequest {
            model: "gemini-2.5-flash",
            messages: &messages,
            temperature: 0.2,
            max_tokens: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gemini-2.5-flash");
        assert_eq!(json["messages"][1]["content"], "2x = 4");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_content_is_trimmed() {
        let text = decode(r#"{"choices":[{"message":{"content":"  {\"final_answer\":\"2\"}\n"}}]}"#);
        assert_eq!(text.unwrap(), r#"{"final_answer":"2"}"#);
    }

    #[test]
    fn test_reasoning_content_fallback() {
        let text = decode(
            r#"{"choices":[{"message":{"content":"","reasoning_content":"x = 2"}}]}"#,
        );
        assert_eq!(text.unwrap(), "x = 2");
    }

    #[test]
    fn test_empty_responses_are_errors() {
        assert!(matches!(decode(r#"{"choices":[]}"#), Err(ModelError::EmptyResponse)));
        assert!(matches!(
            decode(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(ModelError::EmptyResponse)
        ));
    }
}
