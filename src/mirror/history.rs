use super::channel::{ChatChannel, MAX_HISTORY_PAGE};
use super::EventMirror;
use tracing::{debug, error, info};

impl<C: ChatChannel> EventMirror<C> {
    /// Rebuild the link index from the most recent channel messages.
    ///
    /// Only messages posted by the bot with an embed url count. A failed
    /// history request keeps whatever was collected before it. Returns the
    /// number of mappings found.
    pub async fn rebuild(&mut self) -> usize {
        info!(limit = self.history_limit, "rebuilding_event_mapping");

        self.index.clear_links();

        let mut remaining = usize::from(self.history_limit);
        let mut before = None;
        let mut message_count = 0usize;
        let mut mapping_count = 0usize;

        while remaining > 0 {
            let page_size = remaining.min(usize::from(MAX_HISTORY_PAGE)) as u8;

            let page = match self.channel.fetch_history(before, page_size).await {
                Ok(page) => page,
                Err(e) => {
                    error!(
                        error = %e,
                        messages_scanned = message_count,
                        mappings_found = mapping_count,
                        "failed_to_rebuild_mapping"
                    );
                    return mapping_count;
                }
            };

            if page.is_empty() {
                break;
            }

            let fetched = page.len();
            before = page.last().map(|m| m.message_id);

            for message in page.into_iter().take(remaining) {
                message_count += 1;

                if message.author_id != self.bot_user_id {
                    continue;
                }

                if let Some(url) = message.embed_url.filter(|u| !u.is_empty()) {
                    // Newest message wins if an event was posted twice
                    if self.index.get_by_link(&url).is_some() {
                        continue;
                    }
                    debug!(
                        message_id = message.message_id,
                        event_url = %url,
                        "found_event_message"
                    );
                    self.index.put_link(&url, message.message_id);
                    mapping_count += 1;
                }
            }

            remaining = remaining.saturating_sub(fetched);

            // A short page means the start of the channel was reached
            if fetched < usize::from(page_size) {
                break;
            }
        }

        info!(
            messages_scanned = message_count,
            mappings_found = mapping_count,
            "event_mapping_rebuilt"
        );

        mapping_count
    }
}
