//! Anthropic Messages API adapter.

use serde_json::Value;

use super::{ChatMessage, ProviderError, Role};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// System messages go into the dedicated `system` field; the rest keep
/// their order in the `messages` array.
pub(crate) fn request_body(model: &str, messages: &[ChatMessage]) -> Value {
    let system = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let turns: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            serde_json::json!({
                "role": m.role.to_string(),
                "content": m.content,
            })
        })
        .collect();

    serde_json::json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "system": system,
        "messages": turns,
    })
}

pub(crate) async fn complete(
    http: &reqwest::Client,
    api_key: &str,
    model: &str,
    messages: &[ChatMessage],
) -> Result<String, ProviderError> {
    let response = http
        .post(API_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION)
        .header("content-type", "application/json")
        .json(&request_body(model, messages))
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest("anthropic", model, e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            provider: "anthropic".to_string(),
            model: model.to_string(),
            message: format!("HTTP {}: {}", status, body),
        });
    }

    let resp_json: Value = response.json().await.map_err(|e| ProviderError::Api {
        provider: "anthropic".to_string(),
        model: model.to_string(),
        message: e.to_string(),
    })?;

    Ok(resp_json["content"][0]["text"]
        .as_str()
        .unwrap_or("")
        .to_string())
}
