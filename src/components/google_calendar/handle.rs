use super::actor::{GoogleCalendarActor, GoogleCalendarActorHandle, GOOGLE_CALENDAR_API};
use super::models::CalendarEvent;
use super::token::{TokenManager, GOOGLE_TOKEN_URL};
use crate::config::Config;
use crate::error::BotResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Handle for interacting with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarHandle {
    actor_handle: GoogleCalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleCalendarHandle {
    /// Create a new GoogleCalendarHandle and spawn the actor
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self::with_endpoints(config, GOOGLE_CALENDAR_API, GOOGLE_TOKEN_URL)
    }

    /// Same as [`GoogleCalendarHandle::new`] with explicit API endpoints
    pub fn with_endpoints(
        config: Arc<RwLock<Config>>,
        api_base: &str,
        token_url: &str,
    ) -> Self {
        let token_manager = TokenManager::new(Arc::clone(&config)).with_token_url(token_url);
        let (mut actor, handle) = GoogleCalendarActor::new(config, token_manager, api_base);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Get upcoming events from the calendar
    pub async fn get_upcoming_events(&self) -> BotResult<Vec<CalendarEvent>> {
        self.actor_handle.get_upcoming_events().await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        self.actor_handle.shutdown().await
    }
}
