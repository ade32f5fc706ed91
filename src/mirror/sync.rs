use super::channel::ChatChannel;
use super::EventMirror;
use crate::components::google_calendar::CalendarEvent;
use serde::Serialize;
use tracing::info;

/// Outcome counts of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub total: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl<C: ChatChannel> EventMirror<C> {
    /// Run one reconciliation pass over `events`.
    ///
    /// Failures are counted, never returned.
    pub async fn sync(&mut self, events: &[CalendarEvent], rebuild_before_sync: bool) -> SyncStats {
        if rebuild_before_sync {
            self.rebuild().await;
        }

        let mut stats = SyncStats {
            total: events.len(),
            ..Default::default()
        };

        for event in events {
            // upsert returns the same id for found and fresh messages
            let existed = self.index.lookup(event).is_some();

            match self.upsert(event).await {
                Some(_) if existed => stats.skipped += 1,
                Some(_) => stats.created += 1,
                None => stats.failed += 1,
            }
        }

        info!(
            total = stats.total,
            created = stats.created,
            skipped = stats.skipped,
            failed = stats.failed,
            "sync_completed"
        );

        stats
    }
}
