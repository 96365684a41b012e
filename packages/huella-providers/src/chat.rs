//! Multimodal chat-completion calls that answer with one JSON object.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

pub fn text_part(text: impl Into<String>) -> Value {
	serde_json::json!({ "type": "text", "text": text.into() })
}

pub fn image_part(url: impl Into<String>) -> Value {
	serde_json::json!({ "type": "image_url", "image_url": { "url": url.into() } })
}

pub fn user_message(parts: Vec<Value>) -> Value {
	serde_json::json!({ "role": "user", "content": parts })
}

/// Sends one completion request and parses the first choice's content as JSON.
///
/// Exactly one attempt is made. Non-success statuses surface as [`Error::Status`] with the raw
/// body attached for logging.
pub async fn complete(cfg: &huella_config::LlmProviderConfig, messages: &[Value]) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"model": cfg.model,
		"messages": messages,
	});

	if let Some(temperature) = cfg.temperature {
		body["temperature"] = serde_json::json!(temperature);
	}

	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::Status { status: status.as_u16(), body });
	}

	let json: Value = res.json().await?;

	tracing::debug!(provider_id = %cfg.provider_id, model = %cfg.model, "Chat completion received.");

	parse_content_json(&json)
}

/// Extracts `choices[0].message.content` and parses it as a JSON object.
pub fn parse_content_json(json: &Value) -> Result<Value> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})?;
	let parsed: Value = serde_json::from_str(strip_code_fence(content))?;

	if !parsed.is_object() {
		return Err(Error::InvalidResponse {
			message: "Completion content is not a JSON object.".to_string(),
		});
	}

	Ok(parsed)
}

// Some models wrap JSON in a Markdown fence even when told not to.
fn strip_code_fence(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(inner) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let inner = inner.strip_prefix("json").unwrap_or(inner);

	inner.strip_suffix("```").unwrap_or(inner).trim()
}
