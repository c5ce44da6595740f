use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ChatProvider, Conversation};

/// Test provider with a scripted reply sequence. Every conversation it hands
/// out replays the same script; running out of replies is an error so a
/// misbehaving test fails instead of looping forever.
#[derive(Debug, Default)]
pub struct FakeProvider {
    replies: Vec<String>,
    conversations_started: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies;
        self
    }

    /// How many conversations were started; the idempotent-skip tests assert
    /// this stays at zero.
    pub fn conversations_started(&self) -> usize {
        self.conversations_started.load(Ordering::SeqCst)
    }
}

impl ChatProvider for FakeProvider {
    fn start_conversation(&self) -> Box<dyn Conversation> {
        self.conversations_started.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeConversation::scripted(self.replies.clone()))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Debug, Default)]
pub struct FakeConversation {
    replies: VecDeque<String>,
    /// Every prompt the engine sent, for feedback-text assertions.
    pub sent: Vec<String>,
}

impl FakeConversation {
    pub fn scripted(replies: Vec<String>) -> Self {
        Self {
            replies: replies.into(),
            sent: Vec::new(),
        }
    }
}

#[async_trait]
impl Conversation for FakeConversation {
    async fn send(&mut self, prompt: &str) -> anyhow::Result<String> {
        self.sent.push(prompt.to_string());
        self.replies
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("fake conversation ran out of scripted replies"))
    }
}
