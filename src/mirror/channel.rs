use crate::components::google_calendar::EventEmbed;
use crate::error::BotResult;
use async_trait::async_trait;

/// Largest page Discord returns for a message history request
pub const MAX_HISTORY_PAGE: u8 = 100;

/// One message read back from the channel history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub message_id: u64,
    pub author_id: u64,
    /// `url` of the first embed, if the message has one
    pub embed_url: Option<String>,
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// The chat channel events are mirrored into
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Post a new message and return its id
    async fn send(&self, embed: &EventEmbed) -> BotResult<u64>;

    /// Fetch up to `limit` messages older than `before`, newest first
    async fn fetch_history(&self, before: Option<u64>, limit: u8) -> BotResult<Vec<HistoryMessage>>;

    /// Delete a message
    async fn delete(&self, message_id: u64) -> BotResult<DeleteOutcome>;
}
