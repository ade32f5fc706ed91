use super::models::CalendarEvent;
use super::token::TokenManager;
use crate::config::Config;
use crate::error::{google_calendar_error, BotResult};
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use url::Url;

pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Maximum number of events requested per fetch
pub const MAX_RESULTS: u32 = 100;

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    config: Arc<RwLock<Config>>,
    token_manager: TokenManager,
    client: Client,
    api_base: String,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    GetUpcomingEvents(mpsc::Sender<BotResult<Vec<CalendarEvent>>>),
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    /// Get upcoming events from the calendar
    pub async fn get_upcoming_events(&self) -> BotResult<Vec<CalendarEvent>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::GetUpcomingEvents(response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(
        config: Arc<RwLock<Config>>,
        token_manager: TokenManager,
        api_base: impl Into<String>,
    ) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            config,
            token_manager,
            client: Client::new(),
            api_base: api_base.into(),
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::GetUpcomingEvents(response_tx) => {
                    let result = self.get_upcoming_events().await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }

    /// Fetch events from now until `days_ahead` days in the future
    async fn get_upcoming_events(&self) -> BotResult<Vec<CalendarEvent>> {
        let (calendar_id, days_ahead) = {
            let config_read = self.config.read().await;
            (config_read.google_calendar_id.clone(), config_read.days_ahead)
        };

        let token = self.token_manager.get_token().await?;

        let now = Utc::now();
        let time_min = now.to_rfc3339();
        let time_max = (now + chrono::Duration::days(i64::from(days_ahead))).to_rfc3339();

        let url = events_url(&self.api_base, &calendar_id)?;
        let max_results = MAX_RESULTS.to_string();

        info!(
            calendar_id = %calendar_id,
            time_min = %time_min,
            time_max = %time_max,
            "fetching_events"
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(&token.access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("maxResults", max_results.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        let response_data: serde_json::Value = response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse events response: {}", e))
        })?;

        let events = parse_events(&response_data);
        info!(event_count = events.len(), "fetched_events");

        Ok(events)
    }
}

fn events_url(api_base: &str, calendar_id: &str) -> BotResult<Url> {
    let mut url = Url::parse(api_base)
        .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

    url.path_segments_mut()
        .map_err(|_| google_calendar_error("Calendar API base URL cannot have a path"))?
        .pop_if_empty()
        .extend(["calendars", calendar_id, "events"]);

    Ok(url)
}

/// Convert the `items` of an events list response, skipping malformed entries
pub fn parse_events(response: &serde_json::Value) -> Vec<CalendarEvent> {
    let Some(items) = response.get("items").and_then(|i| i.as_array()) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match CalendarEvent::from_value(item) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "skipped_malformed_event");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_events_url_escapes_calendar_id() {
        let url = events_url(GOOGLE_CALENDAR_API, "en.finnish#holiday@group.v.calendar.google.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/en.finnish%23holiday@group.v.calendar.google.com/events"
        );

        let url = events_url("http://localhost:1234/", "primary").unwrap();
        assert_eq!(url.as_str(), "http://localhost:1234/calendars/primary/events");
    }

    #[test]
    fn test_parse_events_skips_malformed_items() {
        let events = parse_events(&json!({
            "items": [
                {"id": "a", "summary": "First"},
                "not an event",
                {"id": "b"}
            ]
        }));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].summary, "First");
        assert_eq!(events[1].summary, "No Title");
    }

    #[test]
    fn test_parse_events_without_items() {
        assert!(parse_events(&json!({"kind": "calendar#events"})).is_empty());
    }
}
