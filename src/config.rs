use crate::error::{config_error, env_error, BotResult};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Default activity text for the bot
pub const DEFAULT_ACTIVITY: &str = "Watching the calendar";

/// Default number of channel messages scanned when rebuilding the link index
pub const DEFAULT_HISTORY_SCAN_LIMIT: u16 = 200;

/// Main configuration structure for the bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Discord channel ID the events are mirrored into
    pub discord_channel_id: u64,
    /// Google Calendar API client ID
    pub google_client_id: String,
    /// Google Calendar API client secret
    pub google_client_secret: String,
    /// Google Calendar ID to mirror
    pub google_calendar_id: String,
    /// Where the OAuth token is stored between runs
    pub google_token_file: PathBuf,
    /// Minutes between reconciliation passes (5-1440)
    pub sync_interval_minutes: u32,
    /// How many days ahead to fetch events (1-365)
    pub days_ahead: u32,
    /// How many recent channel messages to scan on rebuild (1-1000)
    pub history_scan_limit: u16,
    /// Timezone used when rendering event times
    pub timezone: String,
    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    pub log_level: String,
    /// Bot activity status text
    pub activity: String,
    /// Locale for command replies
    pub bot_locale: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            discord_channel_id: 0,
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_calendar_id: "primary".to_string(),
            google_token_file: PathBuf::from("token.json"),
            sync_interval_minutes: 30,
            days_ahead: 7,
            history_scan_limit: DEFAULT_HISTORY_SCAN_LIMIT,
            timezone: "UTC".to_string(),
            log_level: "INFO".to_string(),
            activity: DEFAULT_ACTIVITY.to_string(),
            bot_locale: "en".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment, reading `env_file` (or `.env`) first
    pub fn load(env_file: Option<&Path>) -> BotResult<Self> {
        // A missing .env file is fine, the variables may come from the environment
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| {
                    config_error(&format!("Failed to read env file {}: {}", path.display(), e))
                })?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        // Required variables
        let discord_token = lookup("DISCORD_BOT_TOKEN").ok_or_else(|| env_error("DISCORD_BOT_TOKEN"))?;
        let google_client_id = lookup("GOOGLE_CLIENT_ID").ok_or_else(|| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            lookup("GOOGLE_CLIENT_SECRET").ok_or_else(|| env_error("GOOGLE_CLIENT_SECRET"))?;

        let discord_channel_id = lookup("DISCORD_CHANNEL_ID")
            .ok_or_else(|| env_error("DISCORD_CHANNEL_ID"))?
            .trim()
            .parse::<u64>()
            .map_err(|_| config_error("Invalid DISCORD_CHANNEL_ID format"))?;

        let google_calendar_id = lookup("GOOGLE_CALENDAR_ID").unwrap_or(defaults.google_calendar_id);

        let google_token_file = resolve_path(
            lookup("GOOGLE_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.google_token_file),
        )?;

        let sync_interval_minutes = parse_bounded(
            &lookup,
            "SYNC_INTERVAL_MINUTES",
            defaults.sync_interval_minutes,
            5,
            1440,
        )?;
        let days_ahead = parse_bounded(&lookup, "DAYS_AHEAD", defaults.days_ahead, 1, 365)?;
        let history_scan_limit = parse_bounded(
            &lookup,
            "HISTORY_SCAN_LIMIT",
            defaults.history_scan_limit,
            1,
            1000,
        )?;

        let timezone = lookup("TIMEZONE").unwrap_or(defaults.timezone);
        timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Invalid TIMEZONE: {}", timezone)))?;

        let log_level = validate_log_level(&lookup("LOG_LEVEL").unwrap_or(defaults.log_level))?;

        let activity = lookup("BOT_ACTIVITY").unwrap_or(defaults.activity);
        let bot_locale = lookup("BOT_LOCALE").unwrap_or(defaults.bot_locale);

        Ok(Config {
            discord_token,
            discord_channel_id,
            google_client_id,
            google_client_secret,
            google_calendar_id,
            google_token_file,
            sync_interval_minutes,
            days_ahead,
            history_scan_limit,
            timezone,
            log_level,
            activity,
            bot_locale,
        })
    }

    /// Timezone used for rendering, falling back to UTC
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    /// Tracing filter directive matching the configured log level
    pub fn tracing_directive(&self) -> &'static str {
        match self.log_level.as_str() {
            "DEBUG" => "debug",
            "WARNING" => "warn",
            "ERROR" | "CRITICAL" => "error",
            _ => "info",
        }
    }
}

fn parse_bounded<F, T>(lookup: &F, key: &str, default: T, min: T, max: T) -> BotResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + std::fmt::Display + Copy,
{
    let value = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| config_error(&format!("Invalid {} format: {}", key, raw)))?,
        None => default,
    };

    if value < min || value > max {
        return Err(config_error(&format!(
            "{} must be between {} and {} (got {})",
            key, min, max, value
        )));
    }

    Ok(value)
}

fn validate_log_level(level: &str) -> BotResult<String> {
    let upper = level.trim().to_uppercase();
    match upper.as_str() {
        "DEBUG" | "INFO" | "WARNING" | "ERROR" | "CRITICAL" => Ok(upper),
        _ => Err(config_error(&format!(
            "LOG_LEVEL must be one of DEBUG, INFO, WARNING, ERROR, CRITICAL (got {})",
            level
        ))),
    }
}

fn resolve_path(path: PathBuf) -> BotResult<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DISCORD_BOT_TOKEN", "test_token"),
            ("DISCORD_CHANNEL_ID", "12345"),
            ("GOOGLE_CLIENT_ID", "client"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&required())).unwrap();

        assert_eq!(config.discord_channel_id, 12345);
        assert_eq!(config.google_calendar_id, "primary");
        assert_eq!(config.sync_interval_minutes, 30);
        assert_eq!(config.days_ahead, 7);
        assert_eq!(config.history_scan_limit, 200);
        assert_eq!(config.log_level, "INFO");
        assert!(config.google_token_file.is_absolute());
        assert!(config.google_token_file.ends_with("token.json"));
    }

    #[test]
    fn test_missing_token_is_environment_error() {
        let pairs: Vec<_> = required()
            .into_iter()
            .filter(|(k, _)| *k != "DISCORD_BOT_TOKEN")
            .collect();

        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, crate::error::Error::Environment(_)));
    }

    #[test]
    fn test_invalid_channel_id() {
        let mut pairs = required();
        pairs[1] = ("DISCORD_CHANNEL_ID", "not-a-number");

        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn test_sync_interval_bounds() {
        let mut pairs = required();
        pairs.push(("SYNC_INTERVAL_MINUTES", "4"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = required();
        pairs.push(("SYNC_INTERVAL_MINUTES", "1440"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.sync_interval_minutes, 1440);
    }

    #[test]
    fn test_days_ahead_bounds() {
        let mut pairs = required();
        pairs.push(("DAYS_AHEAD", "0"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = required();
        pairs.push(("DAYS_AHEAD", "366"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_log_level_is_normalized() {
        let mut pairs = required();
        pairs.push(("LOG_LEVEL", "debug"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.log_level, "DEBUG");
        assert_eq!(config.tracing_directive(), "debug");

        let mut pairs = required();
        pairs.push(("LOG_LEVEL", "verbose"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_invalid_timezone() {
        let mut pairs = required();
        pairs.push(("TIMEZONE", "Mars/Olympus_Mons"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = required();
        pairs.push(("TIMEZONE", "Europe/Helsinki"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.tz(), chrono_tz::Europe::Helsinki);
    }
}
