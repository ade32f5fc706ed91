use super::models::CalendarEvent;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Google Calendar blue
pub const EMBED_COLOR: u32 = 0x4285F4;

/// Discord embed field value limit
pub const MAX_FIELD_LENGTH: usize = 1024;

/// Attendees listed before the remainder is summarized
pub const MAX_LISTED_ATTENDEES: usize = 10;

pub const TIME_FIELD: &str = "⏰ Time";
pub const LOCATION_FIELD: &str = "📍 Location";
pub const DESCRIPTION_FIELD: &str = "📝 Description";
pub const ATTENDEES_FIELD: &str = "👥 Attendees";

/// Transport-neutral message payload for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEmbed {
    pub title: String,
    /// Durable link; this is what the history scan reads back
    pub url: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
            inline: false,
        }
    }
}

impl EventEmbed {
    /// Look up a field value by name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

impl CalendarEvent {
    /// Render the event as a channel message payload
    pub fn to_embed(&self, tz: &Tz) -> EventEmbed {
        let mut fields = Vec::new();

        if let Some(time) = self.time_range(tz) {
            fields.push(EmbedField::new(TIME_FIELD, time));
        }

        if let Some(location) = &self.location {
            fields.push(EmbedField::new(LOCATION_FIELD, location.clone()));
        }

        if let Some(description) = &self.description {
            fields.push(EmbedField::new(
                DESCRIPTION_FIELD,
                truncate_description(description),
            ));
        }

        if !self.attendees.is_empty() {
            fields.push(EmbedField::new(
                ATTENDEES_FIELD,
                format_attendees(&self.attendees),
            ));
        }

        EventEmbed {
            title: self.summary.clone(),
            url: self.link().map(str::to_string),
            color: EMBED_COLOR,
            fields,
        }
    }

    fn time_range(&self, tz: &Tz) -> Option<String> {
        let start = self.start?;

        if self.is_all_day {
            return Some(start.format_in(tz, "%B %d, %Y"));
        }

        let mut time = start.format_in(tz, "%B %d, %Y at %I:%M %p");
        if let Some(end) = self.end {
            time.push_str(" - ");
            time.push_str(&end.format_in(tz, "%I:%M %p"));
        }
        Some(time)
    }
}

/// Cut a description to the field limit, ending in "..." when shortened
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_FIELD_LENGTH {
        return description.to_string();
    }

    let mut truncated: String = description.chars().take(MAX_FIELD_LENGTH - 3).collect();
    truncated.push_str("...");
    truncated
}

/// List the first attendees, then "(+N more)" for the rest
pub fn format_attendees(attendees: &[String]) -> String {
    let listed = attendees
        .iter()
        .take(MAX_LISTED_ATTENDEES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    if attendees.len() > MAX_LISTED_ATTENDEES {
        format!("{} (+{} more)", listed, attendees.len() - MAX_LISTED_ATTENDEES)
    } else {
        listed
    }
}
