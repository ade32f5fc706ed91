use super::channel::{ChatChannel, DeleteOutcome};
use super::EventMirror;
use crate::components::google_calendar::CalendarEvent;
use tracing::{debug, error, info, warn};

impl<C: ChatChannel> EventMirror<C> {
    /// Post the event unless a message for it already exists.
    ///
    /// Existing messages are returned as-is and never edited. Returns `None`
    /// when the event has no id or the message could not be sent.
    pub async fn upsert(&mut self, event: &CalendarEvent) -> Option<u64> {
        if !event.has_id() {
            warn!(
                event_summary = %event.summary,
                event_url = %event.html_link,
                "rejected_event_without_id"
            );
            return None;
        }

        if let Some(message_id) = self.find_existing(event) {
            info!(
                event_id = %event.id,
                message_id,
                event_summary = %event.summary,
                "skipped_existing_event"
            );
            return Some(message_id);
        }

        let embed = event.to_embed(&self.timezone);

        match self.channel.send(&embed).await {
            Ok(message_id) => {
                self.index.put(&event.id, event.link(), message_id);
                info!(
                    event_id = %event.id,
                    message_id,
                    event_summary = %event.summary,
                    "created_event_message"
                );
                Some(message_id)
            }
            Err(e) => {
                error!(event_id = %event.id, error = %e, "failed_to_create_event_message");
                None
            }
        }
    }

    /// Event id lookup first, then the durable link. A link hit is copied
    /// into the event id map.
    fn find_existing(&mut self, event: &CalendarEvent) -> Option<u64> {
        if let Some(message_id) = self.index.get_by_event_id(&event.id) {
            return Some(message_id);
        }

        let link = event.link()?;
        let message_id = self.index.get_by_link(link)?;

        self.index.put(&event.id, None, message_id);
        debug!(
            event_id = %event.id,
            message_id,
            event_url = link,
            "found_existing_message_by_url"
        );

        Some(message_id)
    }

    /// Delete the message posted for an event.
    ///
    /// A message that is already gone counts as deleted. Returns `false` when
    /// the event has no known message or the request failed.
    pub async fn delete_event_message(&mut self, event_id: &str) -> bool {
        let Some(message_id) = self.index.get_by_event_id(event_id) else {
            warn!(event_id, "no_message_found_for_event");
            return false;
        };

        match self.channel.delete(message_id).await {
            Ok(outcome) => {
                self.index.remove(event_id);
                // The message is gone, so its link must not block a repost
                self.index.remove_links_to(message_id);

                match outcome {
                    DeleteOutcome::Deleted => {
                        info!(event_id, message_id, "deleted_event_message")
                    }
                    DeleteOutcome::NotFound => {
                        warn!(event_id, message_id, "message_already_deleted")
                    }
                }
                true
            }
            Err(e) => {
                error!(event_id, message_id, error = %e, "failed_to_delete_event_message");
                false
            }
        }
    }
}
