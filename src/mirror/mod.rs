//! Reconciliation of calendar events with the messages already posted for them.
//!
//! There is no database. The event-id map only lives for the process run, and
//! the link map is recovered from the channel itself by [`EventMirror::rebuild`].

mod channel;
mod discord;
mod history;
mod index;
mod sync;
mod upsert;

pub use channel::{ChatChannel, DeleteOutcome, HistoryMessage, MAX_HISTORY_PAGE};
pub use discord::DiscordChannel;
pub use index::MessageIndex;
pub use sync::SyncStats;

use crate::config::DEFAULT_HISTORY_SCAN_LIMIT;
use chrono_tz::Tz;

/// Mirrors calendar events into one chat channel
pub struct EventMirror<C: ChatChannel> {
    channel: C,
    index: MessageIndex,
    bot_user_id: u64,
    history_limit: u16,
    timezone: Tz,
}

impl<C: ChatChannel> EventMirror<C> {
    /// Create a mirror posting as `bot_user_id` with an empty index
    pub fn new(channel: C, bot_user_id: u64) -> Self {
        Self {
            channel,
            index: MessageIndex::new(),
            bot_user_id,
            history_limit: DEFAULT_HISTORY_SCAN_LIMIT,
            timezone: Tz::UTC,
        }
    }

    /// Set how many recent messages a rebuild scans
    pub fn with_history_limit(mut self, limit: u16) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the timezone event times are rendered in
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn index(&self) -> &MessageIndex {
        &self.index
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}
