mod actor;
pub mod embed;
mod handle;
pub mod models;
pub mod time;
pub mod token;

pub use actor::{parse_events, GOOGLE_CALENDAR_API, MAX_RESULTS};
pub use embed::{EmbedField, EventEmbed};
pub use handle::GoogleCalendarHandle;
pub use models::{CalendarEvent, RawEvent};
pub use time::EventTime;
