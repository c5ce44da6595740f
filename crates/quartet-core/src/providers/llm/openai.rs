use async_trait::async_trait;
use serde_json::json;

use super::{ChatProvider, Conversation};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiProvider {
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(model: String, api_key: String) -> Self {
        Self {
            model,
            api_key,
            temperature: 1.0,
            max_tokens: 2048,
            client: reqwest::Client::new(),
        }
    }

    /// Reads the API key from `OPENAI_API_KEY`.
    pub fn from_env(model: String) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("config error: OPENAI_API_KEY is not set"))?;
        Ok(Self::new(model, api_key))
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

impl ChatProvider for OpenAiProvider {
    fn start_conversation(&self) -> Box<dyn Conversation> {
        Box::new(OpenAiConversation {
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            client: self.client.clone(),
            messages: Vec::new(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Holds the full message history so each `send` replays prior turns to the
/// (stateless) chat-completions endpoint, presenting a stateful conversation
/// to the engine.
pub struct OpenAiConversation {
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
    messages: Vec<serde_json::Value>,
}

#[async_trait]
impl Conversation for OpenAiConversation {
    async fn send(&mut self, prompt: &str) -> anyhow::Result<String> {
        self.messages.push(json!({
            "role": "user",
            "content": prompt
        }));

        let body = json!({
            "model": self.model,
            "messages": self.messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI chat API error (status {status}): {error_text}");
        }

        let json: serde_json::Value = resp.json().await?;
        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API response missing content"))?
            .to_string();

        self.messages.push(json!({
            "role": "assistant",
            "content": text
        }));

        Ok(text)
    }
}
