use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// A start or end point of a calendar event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    /// A timed event boundary
    DateTime(DateTime<FixedOffset>),
    /// An all-day event boundary
    Date(NaiveDate),
}

impl EventTime {
    /// Format for display in the given timezone
    pub fn format_in(&self, tz: &Tz, fmt: &str) -> String {
        match self {
            EventTime::DateTime(dt) => dt.with_timezone(tz).format(fmt).to_string(),
            EventTime::Date(date) => date.format(fmt).to_string(),
        }
    }
}

/// Parse a Google Calendar `dateTime` or `date` value.
///
/// Returns `None` and logs a warning when the value can't be parsed.
pub fn parse_event_time(value: &str) -> Option<EventTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = if value.contains('T') {
        parse_date_time(value).map(EventTime::DateTime)
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(EventTime::Date)
            .map_err(|e| e.to_string())
    };

    match parsed {
        Ok(time) => Some(time),
        Err(error) => {
            warn!(dt_string = value, error = %error, "failed_to_parse_datetime");
            None
        }
    }
}

fn parse_date_time(value: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }

    // Offset-less values are taken as UTC
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|e| e.to_string())?;

    Ok(Utc.from_utc_datetime(&naive).fixed_offset())
}
