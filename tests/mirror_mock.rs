use async_trait::async_trait;
use calendar_mirror::components::google_calendar::{CalendarEvent, EventEmbed};
use calendar_mirror::error::{discord_error, BotResult};
use calendar_mirror::mirror::{ChatChannel, DeleteOutcome, EventMirror, HistoryMessage, SyncStats};
use serde_json::json;
use std::sync::{Arc, Mutex};

const BOT_ID: u64 = 1000;
const OTHER_USER_ID: u64 = 2000;

#[derive(Default)]
struct ChannelState {
    /// Oldest first
    messages: Vec<HistoryMessage>,
    sent: Vec<EventEmbed>,
    next_id: u64,
    history_requests: usize,
    fail_send: bool,
    fail_history_after: Option<usize>,
}

/// In-memory channel. Clones share the same state, so a test can keep one
/// clone to inspect what a mirror did with the other.
#[derive(Clone, Default)]
struct MockChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl MockChannel {
    fn new() -> Self {
        let channel = Self::default();
        channel.state.lock().unwrap().next_id = 1;
        channel
    }

    fn push_message(&self, author_id: u64, embed_url: Option<&str>) -> u64 {
        let mut state = self.state.lock().unwrap();
        let message_id = state.next_id;
        state.next_id += 1;
        state.messages.push(HistoryMessage {
            message_id,
            author_id,
            embed_url: embed_url.map(str::to_string),
        });
        message_id
    }

    fn sent(&self) -> Vec<EventEmbed> {
        self.state.lock().unwrap().sent.clone()
    }

    fn message_count(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    fn history_requests(&self) -> usize {
        self.state.lock().unwrap().history_requests
    }

    fn fail_sends(&self) {
        self.state.lock().unwrap().fail_send = true;
    }

    fn fail_history_after(&self, successful_pages: usize) {
        self.state.lock().unwrap().fail_history_after = Some(successful_pages);
    }
}

#[async_trait]
impl ChatChannel for MockChannel {
    async fn send(&self, embed: &EventEmbed) -> BotResult<u64> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send {
            return Err(discord_error("send rejected"));
        }

        let message_id = state.next_id;
        state.next_id += 1;
        state.messages.push(HistoryMessage {
            message_id,
            author_id: BOT_ID,
            embed_url: embed.url.clone(),
        });
        state.sent.push(embed.clone());
        Ok(message_id)
    }

    async fn fetch_history(&self, before: Option<u64>, limit: u8) -> BotResult<Vec<HistoryMessage>> {
        let mut state = self.state.lock().unwrap();
        if let Some(pages) = state.fail_history_after {
            if state.history_requests >= pages {
                return Err(discord_error("history unavailable"));
            }
        }
        state.history_requests += 1;

        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| before.map_or(true, |b| m.message_id < b))
            .take(usize::from(limit))
            .cloned()
            .collect())
    }

    async fn delete(&self, message_id: u64) -> BotResult<DeleteOutcome> {
        let mut state = self.state.lock().unwrap();
        let before = state.messages.len();
        state.messages.retain(|m| m.message_id != message_id);

        if state.messages.len() < before {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

fn event(id: &str, link: &str) -> CalendarEvent {
    CalendarEvent::from_value(&json!({
        "id": id,
        "summary": format!("Event {}", id),
        "htmlLink": link,
        "start": { "dateTime": "2024-05-01T10:00:00+00:00" },
        "end": { "dateTime": "2024-05-01T11:00:00+00:00" }
    }))
    .unwrap()
}

fn link(id: &str) -> String {
    format!("https://calendar.google.com/event?eid={}", id)
}

#[tokio::test]
async fn test_new_event_is_posted_and_indexed() {
    let channel = MockChannel::new();
    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);
    let e = event("a", &link("a"));

    let stats = mirror.sync(&[e.clone()], true).await;

    assert_eq!(
        stats,
        SyncStats {
            total: 1,
            created: 1,
            skipped: 0,
            failed: 0
        }
    );
    let message_id = mirror.index().get_by_event_id("a").unwrap();
    assert_eq!(mirror.index().get_by_link(&link("a")), Some(message_id));
    assert_eq!(channel.sent()[0].url.as_deref(), Some(link("a").as_str()));
}

#[tokio::test]
async fn test_repeated_passes_post_once() {
    let channel = MockChannel::new();
    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);
    let events = vec![event("a", &link("a")), event("b", &link("b"))];

    let first = mirror.sync(&events, true).await;
    let second = mirror.sync(&events, true).await;
    let third = mirror.sync(&events, false).await;

    assert_eq!(first.created, 2);
    assert_eq!((second.created, second.skipped), (0, 2));
    assert_eq!((third.created, third.skipped), (0, 2));
    assert_eq!(channel.sent().len(), 2);
}

#[tokio::test]
async fn test_restart_recovers_posts_from_history() {
    let channel = MockChannel::new();
    let events = vec![event("a", &link("a")), event("b", &link("b"))];

    let mut first_run = EventMirror::new(channel.clone(), BOT_ID);
    first_run.sync(&events, true).await;
    drop(first_run);

    // A new process starts with an empty event id map
    let mut second_run = EventMirror::new(channel.clone(), BOT_ID);
    let stats = second_run.sync(&events, true).await;

    assert_eq!((stats.created, stats.skipped, stats.failed), (0, 2, 0));
    assert_eq!(channel.sent().len(), 2);
    // Link hits are copied into the event id map
    assert!(second_run.index().get_by_event_id("a").is_some());
}

#[tokio::test]
async fn test_existing_message_is_not_edited() {
    let channel = MockChannel::new();
    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);
    mirror.sync(&[event("a", &link("a"))], true).await;

    let mut renamed = event("a", &link("a"));
    renamed.summary = "Renamed".to_string();
    let stats = mirror.sync(&[renamed], true).await;

    assert_eq!(stats.skipped, 1);
    let sent = channel.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Event a");
}

#[tokio::test]
async fn test_rebuild_picks_up_bot_messages_only() {
    let channel = MockChannel::new();
    channel.push_message(BOT_ID, Some(&link("a")));
    channel.push_message(OTHER_USER_ID, Some(&link("c")));
    channel.push_message(BOT_ID, None);
    channel.push_message(BOT_ID, Some(""));
    channel.push_message(BOT_ID, Some(&link("b")));

    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);
    let found = mirror.rebuild().await;

    assert_eq!(found, 2);
    assert_eq!(mirror.index().link_count(), 2);
    assert!(mirror.index().get_by_link(&link("c")).is_none());

    let stats = mirror.sync(&[event("a", &link("a"))], false).await;
    assert_eq!((stats.created, stats.skipped, stats.failed), (0, 1, 0));

    // Another user's post for the same event does not count
    let stats = mirror.sync(&[event("c", &link("c"))], false).await;
    assert_eq!(stats.created, 1);
}

#[tokio::test]
async fn test_rebuild_prefers_newest_duplicate() {
    let channel = MockChannel::new();
    channel.push_message(BOT_ID, Some(&link("a")));
    let newest = channel.push_message(BOT_ID, Some(&link("a")));

    let mut mirror = EventMirror::new(channel, BOT_ID);
    assert_eq!(mirror.rebuild().await, 1);
    assert_eq!(mirror.index().get_by_link(&link("a")), Some(newest));
}

#[tokio::test]
async fn test_rebuild_pages_through_history() {
    let channel = MockChannel::new();
    let oldest = channel.push_message(BOT_ID, Some(&link("old")));
    for i in 0..250 {
        channel.push_message(OTHER_USER_ID, Some(&link(&i.to_string())));
    }
    let recent = channel.push_message(BOT_ID, Some(&link("new")));

    let mut mirror = EventMirror::new(channel.clone(), BOT_ID).with_history_limit(300);
    assert_eq!(mirror.rebuild().await, 2);
    assert_eq!(mirror.index().get_by_link(&link("old")), Some(oldest));
    assert_eq!(mirror.index().get_by_link(&link("new")), Some(recent));
    assert_eq!(channel.history_requests(), 3);
}

#[tokio::test]
async fn test_rebuild_respects_history_limit() {
    let channel = MockChannel::new();
    channel.push_message(BOT_ID, Some(&link("old")));
    for i in 0..200 {
        channel.push_message(OTHER_USER_ID, Some(&link(&i.to_string())));
    }

    // Default limit covers the 200 most recent messages
    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);
    assert_eq!(mirror.rebuild().await, 0);
    assert_eq!(channel.history_requests(), 2);

    let stats = mirror.sync(&[event("old", &link("old"))], false).await;
    assert_eq!(stats.created, 1);
}

#[tokio::test]
async fn test_history_failure_keeps_partial_index() {
    let channel = MockChannel::new();
    channel.push_message(BOT_ID, Some(&link("old")));
    for i in 0..99 {
        channel.push_message(OTHER_USER_ID, Some(&link(&i.to_string())));
    }
    channel.push_message(BOT_ID, Some(&link("new")));
    channel.fail_history_after(1);

    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);
    assert_eq!(mirror.rebuild().await, 1);
    assert!(mirror.index().get_by_link(&link("new")).is_some());
    assert!(mirror.index().get_by_link(&link("old")).is_none());

    // The pass still runs against what was recovered
    let stats = mirror
        .sync(&[event("new", &link("new")), event("x", &link("x"))], false)
        .await;
    assert_eq!((stats.created, stats.skipped), (1, 1));
}

#[tokio::test]
async fn test_send_failure_is_counted() {
    let channel = MockChannel::new();
    channel.fail_sends();
    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);

    let stats = mirror
        .sync(&[event("a", &link("a")), event("b", &link("b"))], true)
        .await;

    assert_eq!((stats.total, stats.failed, stats.created), (2, 2, 0));
    assert_eq!(mirror.index().event_count(), 0);
    assert_eq!(channel.message_count(), 0);
}

#[tokio::test]
async fn test_event_without_id_is_rejected() {
    let channel = MockChannel::new();
    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);

    assert_eq!(mirror.upsert(&event("", &link("a"))).await, None);
    assert!(channel.sent().is_empty());

    let stats = mirror.sync(&[event("", &link("a"))], false).await;
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_event_without_link_is_posted_once_per_run() {
    let channel = MockChannel::new();
    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);
    let e = event("a", "");

    let first = mirror.upsert(&e).await;
    let second = mirror.upsert(&e).await;

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(mirror.index().link_count(), 0);
    assert_eq!(channel.sent()[0].url, None);
}

#[tokio::test]
async fn test_delete_event_message() {
    let channel = MockChannel::new();
    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);
    let e = event("a", &link("a"));
    mirror.upsert(&e).await;

    assert!(mirror.delete_event_message("a").await);
    assert_eq!(channel.message_count(), 0);
    assert!(mirror.index().get_by_event_id("a").is_none());
    assert!(mirror.index().get_by_link(&link("a")).is_none());

    // Unknown event
    assert!(!mirror.delete_event_message("a").await);

    // Deleted events can be posted again
    let stats = mirror.sync(&[e], false).await;
    assert_eq!(stats.created, 1);
}

#[tokio::test]
async fn test_delete_of_vanished_message_succeeds() {
    let channel = MockChannel::new();
    let mut mirror = EventMirror::new(channel.clone(), BOT_ID);
    mirror.upsert(&event("a", &link("a"))).await;

    // Someone removed the message by hand
    let message_id = mirror.index().get_by_event_id("a").unwrap();
    channel
        .state
        .lock()
        .unwrap()
        .messages
        .retain(|m| m.message_id != message_id);

    assert!(mirror.delete_event_message("a").await);
    assert!(mirror.index().get_by_event_id("a").is_none());
}
