//! OpenAI-compatible chat-completions backend

use infralens_core::config::NarrativeConfig;
use infralens_core::prompt::Prompt;
use infralens_core::summarize::{BackendError, NarrativeBackend};
use infralens_core_types::Sensitive;
use reqwest::header::RETRY_AFTER;
use serde_json::{json, Value};
use std::time::Duration;

const QUOTA_CODE: &str = "insufficient_quota";

/// Blocking client for `POST {url}` chat completions
pub struct OpenAiBackend {
    client: reqwest::blocking::Client,
    url: String,
    api_key: Sensitive<String>,
}

impl OpenAiBackend {
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(url: impl Into<String>, api_key: Sensitive<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }
}

impl NarrativeBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate(&self, prompt: &Prompt, config: &NarrativeConfig) -> Result<String, BackendError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose())
            .timeout(config.request_timeout())
            .json(&build_body(prompt, config))
            .send()
            .map_err(|e| BackendError::transport(e.to_string()))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let text = response
            .text()
            .map_err(|e| BackendError::transport(format!("unreadable response body: {}", e)))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), retry_after, &body));
        }
        extract_text(&body)
    }
}

fn build_body(prompt: &Prompt, config: &NarrativeConfig) -> Value {
    json!({
        "model": config.model,
        "messages": [
            { "role": "system", "content": prompt.system },
            { "role": "user", "content": prompt.user },
        ],
        "max_tokens": config.max_length,
        "temperature": config.temperature,
    })
}

/// Seconds form only; HTTP-date values are ignored
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn classify_failure(status: u16, retry_after: Option<Duration>, body: &Value) -> BackendError {
    let error = body.get("error");
    let code = error
        .and_then(|e| e.get("code").or_else(|| e.get("type")))
        .and_then(Value::as_str);
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body));

    if code == Some(QUOTA_CODE) {
        return BackendError::QuotaExceeded { message };
    }
    if status == 429 {
        return BackendError::RateLimited { retry_after };
    }
    BackendError::transport(format!("HTTP {}: {}", status, message))
}

fn extract_text(body: &Value) -> Result<String, BackendError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| BackendError::transport("response has no choices[0].message.content"))
}
