pub mod classifier;
pub mod groq;
pub mod ollama;

use async_trait::async_trait;

/// One classification round-trip: a system prompt carrying the tenant's
/// live catalog, and the customer's message. Providers are asked for
/// strict JSON output; the classifier still tolerates fenced replies.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String>;
}
