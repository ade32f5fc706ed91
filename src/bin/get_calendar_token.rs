use calendar_mirror::components::google_calendar::token::{StoredToken, TokenManager, GOOGLE_TOKEN_URL};
use calendar_mirror::config::Config;
use calendar_mirror::error::{other_error, BotResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

const REDIRECT_URI: &str = "http://localhost:8080";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

#[tokio::main]
async fn main() -> BotResult<()> {
    // Load configuration
    let config = Config::load(None)?;
    let token_file = config.google_token_file.clone();
    let client_id = config.google_client_id.clone();
    let client_secret = config.google_client_secret.clone();

    let token_manager = TokenManager::new(Arc::new(RwLock::new(config)));

    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();

    let auth_url = Url::parse_with_params(
        "https://accounts.google.com/o/oauth2/v2/auth",
        &[
            ("client_id", client_id.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("scope", CALENDAR_SCOPE),
            ("state", state.as_str()),
        ],
    )
    .map_err(|e| other_error(&format!("Invalid authorization URL: {}", e)))?;

    // Open browser for authorization
    println!("Opening browser for Google Calendar authorization...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        println!("Could not open a browser, visit this URL instead:\n{}", auth_url);
    }

    // Start local server to receive the callback
    let server = tiny_http::Server::http("127.0.0.1:8080")?;
    println!("Waiting for authorization callback...");

    let request = server.recv()?;
    let callback = Url::parse(REDIRECT_URI)
        .and_then(|base| base.join(request.url()))
        .map_err(|e| other_error(&format!("Invalid callback URL: {}", e)))?;

    let param = |name: &str| {
        callback
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if param("state").as_deref() != Some(state.as_str()) {
        return Err(other_error("Authorization state mismatch"));
    }

    let code = param("code").ok_or_else(|| other_error("No authorization code found in callback"))?;

    // Exchange code for tokens
    let client = reqwest::Client::new();
    let response = client
        .post(GOOGLE_TOKEN_URL)
        .form(&[
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        return Err(other_error(&format!("Failed to get token: {}", error_text)));
    }

    let token_data: serde_json::Value = response.json().await?;
    let token = StoredToken::from_response(&token_data, None)?;

    token_manager.set_token(&token).await?;

    // Send success response to browser
    let response =
        tiny_http::Response::from_string("Authorization successful! You can close this window.");
    request.respond(response)?;

    println!("Token saved to {}", token_file.display());

    Ok(())
}
