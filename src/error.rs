use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(calendar_mirror::discord_api))]
    DiscordApi(#[from] serenity::Error),

    #[error("Poise framework error: {0}")]
    #[diagnostic(code(calendar_mirror::poise))]
    Poise(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Environment error: {0}")]
    #[diagnostic(
        code(calendar_mirror::environment),
        help("Set the variable in the environment or in the .env file")
    )]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_mirror::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(calendar_mirror::google_calendar))]
    GoogleCalendar(String),

    #[error("Discord channel error: {0}")]
    #[diagnostic(code(calendar_mirror::discord))]
    Discord(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(calendar_mirror::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(calendar_mirror::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_mirror::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_mirror::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::GoogleCalendar(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type BotResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create Discord channel errors
pub fn discord_error(message: &str) -> Error {
    Error::Discord(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
