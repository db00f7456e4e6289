//! Google Gemini generateContent adapter.
//!
//! Gemini has no `system` chat role: system messages become the
//! `systemInstruction` field and assistant turns map to the `model` role.

use serde_json::Value;

use super::{ChatMessage, ProviderError, Role};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub(crate) fn request_body(messages: &[ChatMessage]) -> Value {
    let contents: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = match m.role {
                Role::Assistant => "model",
                _ => "user",
            };
            serde_json::json!({
                "role": role,
                "parts": [{ "text": m.content }],
            })
        })
        .collect();

    let mut body = serde_json::json!({
        "contents": contents,
        "generationConfig": {
            "temperature": 0.3,
            "maxOutputTokens": 4096,
        },
    });

    let system = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    if !system.is_empty() {
        body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
    }

    body
}

pub(crate) async fn complete(
    http: &reqwest::Client,
    api_key: &str,
    model: &str,
    messages: &[ChatMessage],
) -> Result<String, ProviderError> {
    let url = format!("{}/{}:generateContent?key={}", API_BASE, model, api_key);

    let response = http
        .post(&url)
        .json(&request_body(messages))
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest("google", model, e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            provider: "google".to_string(),
            model: model.to_string(),
            message: format!("HTTP {}: {}", status, body),
        });
    }

    let resp_json: Value = response.json().await.map_err(|e| ProviderError::Api {
        provider: "google".to_string(),
        model: model.to_string(),
        message: e.to_string(),
    })?;

    Ok(resp_json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or("")
        .to_string())
}
