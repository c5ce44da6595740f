//! The LLM collaborator: an opaque, stateful conversation that receives
//! prompt text and returns reply text, retaining prior turns internally.

use async_trait::async_trait;

pub mod fake;
pub mod openai;

pub use fake::FakeProvider;
pub use openai::OpenAiProvider;

/// One session-long conversation. The engine sends only the incremental
/// prompt each turn and trusts the conversation to retain history.
#[async_trait]
pub trait Conversation: Send {
    async fn send(&mut self, prompt: &str) -> anyhow::Result<String>;
}

/// Hands out fresh conversations, one per game session.
pub trait ChatProvider: Send + Sync {
    fn start_conversation(&self) -> Box<dyn Conversation>;

    fn provider_name(&self) -> &'static str;
}
