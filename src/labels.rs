//! Label providers for selected passages.
//!
//! Implements [`shortlist_core::label::Summarizer`] on top of a text
//! generation endpoint. A failed call is never fatal: the assembler turns any
//! [`LabelError`] into a fallback label.

use anyhow::Result;
use std::time::Duration;

use shortlist_core::label::Summarizer;

use crate::config::LabelConfig;

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("label generation is disabled")]
    Disabled,
    #[error("{service} request failed: {message}")]
    Http { service: &'static str, message: String },
    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse { service: &'static str, message: String },
}

/// Build the prompt sent to the text generation model.
pub fn build_prompt(text: &str, prompt_chars: usize) -> String {
    let excerpt: String = text.chars().take(prompt_chars).collect();
    format!(
        "Generate a short, descriptive title for the following text: \"{}\"",
        excerpt
    )
}

/// Strip whitespace and wrapping quotes models like to add around titles.
fn clean_title(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}

/// Summarizer used when `[labels] provider = "disabled"`.
pub struct DisabledSummarizer;

impl Summarizer for DisabledSummarizer {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn summarize(&self, _text: &str, _max_chars: usize) -> Result<String> {
        Err(LabelError::Disabled.into())
    }
}

/// Labels via a local Ollama instance (`POST /api/generate`).
pub struct OllamaSummarizer {
    model: String,
    url: String,
    max_new_tokens: u32,
    prompt_chars: usize,
    client: reqwest::blocking::Client,
}

impl OllamaSummarizer {
    pub fn new(config: &LabelConfig) -> Result<Self> {
        Ok(Self {
            model: config.model.clone().unwrap_or_else(|| "llama3.2".to_string()),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            max_new_tokens: config.max_new_tokens,
            prompt_chars: config.prompt_chars,
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
        })
    }
}

impl Summarizer for OllamaSummarizer {
    fn name(&self) -> &str {
        "ollama"
    }

    fn summarize(&self, text: &str, _max_chars: usize) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": build_prompt(text, self.prompt_chars),
            "stream": false,
            "options": { "num_predict": self.max_new_tokens }
        });
        let endpoint = format!("{}/api/generate", self.url.trim_end_matches('/'));
        let json = send_json(&self.client, "Ollama", &endpoint, None, &body)?;
        let title = json
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or(LabelError::InvalidResponse {
                service: "Ollama",
                message: "missing response field".to_string(),
            })?;
        Ok(clean_title(title))
    }
}

/// Labels via the OpenAI chat completions API. Requires `OPENAI_API_KEY`.
pub struct OpenAISummarizer {
    model: String,
    api_key: String,
    max_new_tokens: u32,
    prompt_chars: usize,
    client: reqwest::blocking::Client,
}

impl OpenAISummarizer {
    pub fn new(config: &LabelConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("labels.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self {
            model,
            api_key,
            max_new_tokens: config.max_new_tokens,
            prompt_chars: config.prompt_chars,
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
        })
    }
}

impl Summarizer for OpenAISummarizer {
    fn name(&self) -> &str {
        "openai"
    }

    fn summarize(&self, text: &str, _max_chars: usize) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": build_prompt(text, self.prompt_chars) }],
            "max_tokens": self.max_new_tokens
        });
        let json = send_json(
            &self.client,
            "OpenAI",
            "https://api.openai.com/v1/chat/completions",
            Some(&self.api_key),
            &body,
        )?;
        let title = json
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or(LabelError::InvalidResponse {
                service: "OpenAI",
                message: "missing choices[0].message.content".to_string(),
            })?;
        Ok(clean_title(title))
    }
}

/// Single attempt; labels are best-effort so there is no retry loop.
fn send_json(
    client: &reqwest::blocking::Client,
    service: &'static str,
    url: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
) -> Result<serde_json::Value, LabelError> {
    let mut request = client.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    let response = request.send().map_err(|e| LabelError::Http {
        service,
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LabelError::Http {
            service,
            message: format!("status {}: {}", status, response.text().unwrap_or_default()),
        });
    }
    response.json().map_err(|e| LabelError::InvalidResponse {
        service,
        message: e.to_string(),
    })
}

/// Create the configured label provider.
pub fn create_summarizer(config: &LabelConfig) -> Result<Box<dyn Summarizer + Send>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledSummarizer)),
        "ollama" => Ok(Box::new(OllamaSummarizer::new(config)?)),
        "openai" => Ok(Box::new(OpenAISummarizer::new(config)?)),
        other => anyhow::bail!("Unknown label provider: {}", other),
    }
}
