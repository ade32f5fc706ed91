use super::time::{parse_event_time, EventTime};
use crate::error::BotResult;
use serde::{Deserialize, Serialize};

/// Title used when an event has no summary
pub const DEFAULT_TITLE: &str = "No Title";

/// Event record as returned by the Google Calendar API
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub html_link: Option<String>,
    pub start: Option<RawEventTime>,
    pub end: Option<RawEventTime>,
    pub attendees: Vec<RawAttendee>,
}

/// Start or end of a raw event, either `dateTime` or `date`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RawAttendee {
    pub email: Option<String>,
}

/// Calendar event normalized for mirroring
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub is_all_day: bool,
    /// Public link to the event, used as the durable key in the channel
    pub html_link: String,
    pub attendees: Vec<String>,
}

impl CalendarEvent {
    /// Build an event from a raw API record, applying per-field defaults
    pub fn from_raw(raw: RawEvent) -> Self {
        let is_all_day = raw
            .start
            .as_ref()
            .map(|start| start.date.is_some())
            .unwrap_or(false);

        Self {
            id: raw.id.unwrap_or_default(),
            summary: raw.summary.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: raw.description.filter(|d| !d.is_empty()),
            location: raw.location.filter(|l| !l.is_empty()),
            start: raw.start.as_ref().and_then(parse_raw_time),
            end: raw.end.as_ref().and_then(parse_raw_time),
            is_all_day,
            html_link: raw.html_link.unwrap_or_default(),
            attendees: raw
                .attendees
                .into_iter()
                .filter_map(|a| a.email)
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    /// Build an event from an `items[]` entry of an events list response
    pub fn from_value(value: &serde_json::Value) -> BotResult<Self> {
        let raw: RawEvent = serde_json::from_value(value.clone())?;
        Ok(Self::from_raw(raw))
    }

    /// Whether the event can be recorded in the message index
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Durable link, if the event has one
    pub fn link(&self) -> Option<&str> {
        if self.html_link.is_empty() {
            None
        } else {
            Some(&self.html_link)
        }
    }
}

// `dateTime` wins over `date` when both are present
fn parse_raw_time(raw: &RawEventTime) -> Option<EventTime> {
    raw.date_time
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(raw.date.as_deref())
        .and_then(parse_event_time)
}
