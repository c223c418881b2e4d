use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::LlmProvider;

const CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

pub struct GroqProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String> {
        // Temperature 0 and JSON mode: classification wants the same
        // answer for the same message, not prose.
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": 0,
            "response_format": { "type": "json_object" },
        });

        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("groq request failed")?;

        let status = resp.status();
        let data: serde_json::Value = resp.json().await.context("groq response was not JSON")?;

        if !status.is_success() {
            anyhow::bail!("groq returned {status}: {data}");
        }

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("groq reply had no message content"))
    }
}
