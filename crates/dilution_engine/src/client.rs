use std::time::Duration;

use dilution_core::AttemptOutcome;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// One chat completion: a system prompt, a user message and sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_input: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    /// Non-success HTTP status or transport failure; worth another attempt.
    #[error("api error: {0}")]
    Api(String),
    /// Malformed or contentless response, or a request that could not be built.
    #[error("unexpected error: {0}")]
    Fatal(String),
}

impl InvokeError {
    pub fn outcome(&self) -> AttemptOutcome {
        match self {
            InvokeError::RateLimited(_) | InvokeError::Api(_) => AttemptOutcome::Transient,
            InvokeError::Fatal(_) => AttemptOutcome::Fatal,
        }
    }
}

#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, InvokeError>;
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: impl Into<String>, settings: ClientSettings) -> Result<Self, InvokeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| InvokeError::Fatal(err.to_string()))?;
        let endpoint = format!(
            "{}/chat/completions",
            settings.base_url.trim_end_matches('/')
        );
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint,
        })
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait::async_trait]
impl ModelClient for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, InvokeError> {
        let body = CompletionBody {
            model: &request.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system_prompt,
                },
                Message {
                    role: "user",
                    content: &request.user_input,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        };
        let payload =
            serde_json::to_string(&body).map_err(|err| InvokeError::Fatal(err.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(classify_status(status, text));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|err| InvokeError::Fatal(format!("malformed completion response: {err}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| InvokeError::Fatal("completion response has no content".into()))
    }
}

fn classify_status(status: StatusCode, body: String) -> InvokeError {
    let message = format!("http status {status}: {body}");
    // Every status the provider answers with is an API error and gets retried.
    if status == StatusCode::TOO_MANY_REQUESTS {
        InvokeError::RateLimited(message)
    } else {
        InvokeError::Api(message)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> InvokeError {
    if err.is_builder() {
        return InvokeError::Fatal(err.to_string());
    }
    InvokeError::Api(err.to_string())
}
