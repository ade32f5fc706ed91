use crate::components::google_calendar::CalendarEvent;
use std::collections::HashMap;

/// Process-local map from calendar events to the messages posted for them.
///
/// `by_event_id` only lives for the current run. `by_link` can be rebuilt
/// from the channel history at any time, see [`super::EventMirror::rebuild`].
#[derive(Debug, Default, Clone)]
pub struct MessageIndex {
    by_event_id: HashMap<String, u64>,
    by_link: HashMap<String, u64>,
}

impl MessageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_by_event_id(&self, event_id: &str) -> Option<u64> {
        self.by_event_id.get(event_id).copied()
    }

    pub fn get_by_link(&self, link: &str) -> Option<u64> {
        if link.is_empty() {
            return None;
        }
        self.by_link.get(link).copied()
    }

    /// Record a message under the event id and, when present, the link
    pub fn put(&mut self, event_id: &str, link: Option<&str>, message_id: u64) {
        if !event_id.is_empty() {
            self.by_event_id.insert(event_id.to_string(), message_id);
        }
        if let Some(link) = link.filter(|l| !l.is_empty()) {
            self.by_link.insert(link.to_string(), message_id);
        }
    }

    /// Record only the link mapping
    pub fn put_link(&mut self, link: &str, message_id: u64) {
        if !link.is_empty() {
            self.by_link.insert(link.to_string(), message_id);
        }
    }

    /// Drop the event id mapping; the link mapping is left in place
    pub fn remove(&mut self, event_id: &str) -> Option<u64> {
        self.by_event_id.remove(event_id)
    }

    /// Drop every link mapping that points at `message_id`
    pub fn remove_links_to(&mut self, message_id: u64) -> usize {
        let before = self.by_link.len();
        self.by_link.retain(|_, id| *id != message_id);
        before - self.by_link.len()
    }

    pub fn clear_links(&mut self) {
        self.by_link.clear();
    }

    /// Existing message for the event by either key, without backfilling
    pub fn lookup(&self, event: &CalendarEvent) -> Option<u64> {
        self.get_by_event_id(&event.id)
            .or_else(|| event.link().and_then(|link| self.get_by_link(link)))
    }

    pub fn event_count(&self) -> usize {
        self.by_event_id.len()
    }

    pub fn link_count(&self) -> usize {
        self.by_link.len()
    }
}
