use crate::config::Config;
use crate::error::{google_calendar_error, BotResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds before expiry at which a token is already treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth token as kept in the token file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp
    pub expires_at: i64,
}

impl StoredToken {
    /// Build from a token endpoint response, keeping `fallback_refresh` when
    /// the response has no refresh token of its own
    pub fn from_response(
        response: &serde_json::Value,
        fallback_refresh: Option<&str>,
    ) -> BotResult<Self> {
        let access_token = response
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| google_calendar_error("Token response missing 'access_token' field"))?
            .to_string();

        let refresh_token = response
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .or(fallback_refresh)
            .map(str::to_string);

        let expires_in = response
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(3600);

        Ok(Self {
            access_token,
            refresh_token,
            expires_at: Utc::now().timestamp() + expires_in,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp() + EXPIRY_MARGIN_SECS
    }
}

#[derive(Clone)]
pub struct TokenManager {
    config: Arc<RwLock<Config>>,
    token_url: String,
    client: Client,
}

impl TokenManager {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            config,
            token_url: GOOGLE_TOKEN_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Use a different token endpoint
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    async fn token_file(&self) -> PathBuf {
        self.config.read().await.google_token_file.clone()
    }

    /// Get a valid access token, refreshing it if it has expired
    pub async fn get_token(&self) -> BotResult<StoredToken> {
        let path = self.token_file().await;

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(google_calendar_error(&format!(
                    "No token found at {}. Run get_calendar_token first.",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let token: StoredToken = serde_json::from_str(&content)
            .map_err(|e| google_calendar_error(&format!("Failed to parse token file: {}", e)))?;

        if !token.is_expired() {
            return Ok(token);
        }

        info!("Access token expired, refreshing");
        self.refresh_token(&token).await
    }

    /// Refresh an expired token and store the result
    async fn refresh_token(&self, token: &StoredToken) -> BotResult<StoredToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| google_calendar_error("No refresh token in token data"))?;

        let (client_id, client_secret) = {
            let config_read = self.config.read().await;
            (
                config_read.google_client_id.clone(),
                config_read.google_client_secret.clone(),
            )
        };

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token.to_string()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse token response: {}", e)))?;

        let refreshed = StoredToken::from_response(&body, Some(refresh_token))?;

        if let Err(e) = self.set_token(&refreshed).await {
            // The refreshed token still works for this run
            warn!("Failed to save refreshed token: {}", e);
        }

        Ok(refreshed)
    }

    /// Write the token file, creating its directory if needed
    pub async fn set_token(&self, token: &StoredToken) -> BotResult<()> {
        let path = self.token_file().await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(token)?;
        tokio::fs::write(&path, json).await?;

        info!(token_file = %path.display(), "saved_credentials");
        Ok(())
    }
}
