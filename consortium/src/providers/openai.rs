//! OpenAI chat-completions adapter.

use serde_json::Value;

use super::{ChatMessage, ProviderError};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.3;

pub(crate) fn request_body(model: &str, messages: &[ChatMessage]) -> Value {
    let turns: Vec<Value> = messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.to_string(),
                "content": m.content,
            })
        })
        .collect();

    serde_json::json!({
        "model": model,
        "messages": turns,
        "max_tokens": MAX_TOKENS,
        "temperature": TEMPERATURE,
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
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request_body(model, messages))
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest("openai", model, e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            provider: "openai".to_string(),
            model: model.to_string(),
            message: format!("HTTP {}: {}", status, body),
        });
    }

    let resp_json: Value = response.json().await.map_err(|e| ProviderError::Api {
        provider: "openai".to_string(),
        model: model.to_string(),
        message: e.to_string(),
    })?;

    Ok(resp_json["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string())
}
