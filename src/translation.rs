use crate::config::{ApiConfig, Config};
use crate::error::{Result, TranslateError};
use crate::locale::LocaleCode;
use crate::metrics::TranslationMetrics;
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Something that can translate a piece of text between two locales.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &LocaleCode, target: &LocaleCode)
        -> Result<String>;
}

/// A single text to translate. Lives only for the duration of one call.
#[derive(Debug, Clone, Copy)]
pub struct TranslationRequest<'a> {
    pub text: &'a str,
    pub source: &'a LocaleCode,
    pub target: &'a LocaleCode,
}

impl TranslationRequest<'_> {
    /// Build the user prompt for translation
    pub fn prompt(&self) -> String {
        format!(
            "Translate this text from {} to {}: {}",
            self.source, self.target, self.text
        )
    }
}

/// Chat Completion request body
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
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
    content: Option<String>,
}

/// Chat-completion backed translator with bounded retries.
pub struct TranslationClient {
    http: reqwest::Client,
    api: ApiConfig,
    temperature: f32,
    max_tokens: u32,
    retry: RetryConfig,
    metrics: Arc<TranslationMetrics>,
}

impl TranslationClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.api.timeout)
            .build()
            .map_err(|e| TranslateError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            api: config.api.clone(),
            temperature: config.settings.temperature,
            max_tokens: config.settings.max_tokens,
            retry: RetryConfig::translation(),
            metrics: Arc::new(TranslationMetrics::new()),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Share a metrics collector (typically the orchestrator's).
    pub fn with_metrics(mut self, metrics: Arc<TranslationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<TranslationMetrics> {
        &self.metrics
    }

    fn check_configuration(&self) -> Result<()> {
        if self.api.key.trim().is_empty() {
            return Err(TranslateError::ConfigurationMissing("api.key"));
        }
        if self.api.url.trim().is_empty() {
            return Err(TranslateError::ConfigurationMissing("api.url"));
        }
        Ok(())
    }

    fn chat_request(&self, request: &TranslationRequest<'_>) -> ChatRequest {
        ChatRequest {
            model: self.api.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// One HTTP round trip, classified into transient / client / empty failures.
    async fn send_once(&self, body: &ChatRequest) -> Result<String> {
        self.metrics.record_api_call();

        let result = self.send_and_parse(body).await;
        if result.is_err() {
            self.metrics.record_api_failure();
        }
        result
    }

    async fn send_and_parse(&self, body: &ChatRequest) -> Result<String> {
        let response = self
            .http
            .post(&self.api.url)
            .header("Authorization", format!("Bearer {}", self.api.key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| TranslateError::TransientApi {
                status: e.status().map(|s| s.as_u16()),
                detail: format!("Failed to send translation request: {}", e),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TranslateError::TransientApi {
                status: Some(status.as_u16()),
                detail: format!("Failed to read translation response: {}", e),
            })?;
        let payload: Option<Value> = serde_json::from_str(&text).ok();

        if status.is_server_error() {
            return Err(TranslateError::TransientApi {
                status: Some(status.as_u16()),
                detail: error_detail(payload.as_ref(), &text),
            });
        }

        if !status.is_success() {
            return Err(TranslateError::ClientApi {
                status: status.as_u16(),
                detail: error_detail(payload.as_ref(), &text),
            });
        }

        let Some(payload) = payload else {
            return Err(TranslateError::EmptyModelResponse);
        };

        // Some gateways report failures with a 200 and an `error` member
        if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
            return Err(TranslateError::ClientApi {
                status: status.as_u16(),
                detail: render_error(error),
            });
        }

        let chat: ChatResponse =
            serde_json::from_value(payload).map_err(|_| TranslateError::EmptyModelResponse)?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(TranslateError::EmptyModelResponse)
    }
}

#[async_trait]
impl Translator for TranslationClient {
    /// Translate `text` from `source` to `target`.
    ///
    /// Fails with `ConfigurationMissing` before any network call when the API
    /// key or URL is empty. Every other failure is reported as
    /// `TranslationFailed`, wrapping the last attempt's error.
    async fn translate(
        &self,
        text: &str,
        source: &LocaleCode,
        target: &LocaleCode,
    ) -> Result<String> {
        self.check_configuration()?;

        let request = TranslationRequest {
            text,
            source,
            target,
        };
        let body = self.chat_request(&request);

        with_retry_if(
            &self.retry,
            &format!("Translation {} -> {}", source, target),
            || self.send_once(&body),
            TranslateError::is_transient,
        )
        .await
        .map_err(|failure| TranslateError::TranslationFailed {
            attempts: failure.attempts,
            source: Box::new(failure.error),
        })
    }
}

/// Prefer the API's `error` member; fall back to the raw body.
fn error_detail(payload: Option<&Value>, raw: &str) -> String {
    match payload.and_then(|p| p.get("error")).filter(|e| !e.is_null()) {
        Some(error) => render_error(error),
        None if raw.trim().is_empty() => "<empty body>".to_string(),
        None => raw.trim().to_string(),
    }
}

fn render_error(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}
