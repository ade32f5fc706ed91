mod scheduler;

pub use scheduler::start_scheduler;

use super::google_calendar::GoogleCalendarHandle;
use crate::config::Config;
use crate::error::{component_error, BotResult};
use crate::mirror::{ChatChannel, DiscordChannel, EventMirror, SyncStats};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Upper bound for resolving the bot user and the target channel
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Mirror shared between the scheduler and slash commands
pub type SharedMirror = Arc<Mutex<EventMirror<DiscordChannel>>>;

/// Everything a running mirror needs
#[derive(Clone)]
pub struct MirrorService {
    pub calendar: GoogleCalendarHandle,
    pub mirror: SharedMirror,
}

impl MirrorService {
    /// Run one pass; the mutex keeps passes from overlapping
    pub async fn run_pass(&self) -> BotResult<SyncStats> {
        let mut mirror = self.mirror.lock().await;
        run_pass(&self.calendar, &mut mirror).await
    }
}

/// Fetch upcoming events and reconcile them with the channel
pub async fn run_pass<C: ChatChannel>(
    calendar: &GoogleCalendarHandle,
    mirror: &mut EventMirror<C>,
) -> BotResult<SyncStats> {
    info!("starting_sync");

    let events = calendar.get_upcoming_events().await?;

    if events.is_empty() {
        info!("no_events_to_sync");
        return Ok(SyncStats::default());
    }

    Ok(mirror.sync(&events, true).await)
}

/// Resolve the bot identity and target channel, then build the mirror
pub async fn build_mirror(
    http: Arc<serenity::Http>,
    config: &Config,
) -> BotResult<EventMirror<DiscordChannel>> {
    let setup = async {
        let bot_user = http.get_current_user().await?;
        let channel = DiscordChannel::resolve(Arc::clone(&http), config.discord_channel_id).await?;
        info!(bot_user = %bot_user.name, bot_id = bot_user.id.get(), "discord_bot_ready");
        BotResult::Ok((bot_user.id.get(), channel))
    };

    let (bot_user_id, channel) = tokio::time::timeout(SETUP_TIMEOUT, setup)
        .await
        .map_err(|_| component_error("Timed out resolving the Discord channel"))??;

    Ok(EventMirror::new(channel, bot_user_id)
        .with_history_limit(config.history_scan_limit)
        .with_timezone(config.tz()))
}

/// Component that keeps the channel in step with the calendar
#[derive(Default)]
pub struct CalendarMirror {
    service: RwLock<Option<MirrorService>>,
    cancel: CancellationToken,
}

impl CalendarMirror {
    /// Create a new mirror component
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the running service if the component has been initialized
    pub async fn service(&self) -> Option<MirrorService> {
        self.service.read().await.clone()
    }
}

#[async_trait]
impl super::Component for CalendarMirror {
    fn name(&self) -> &'static str {
        "calendar_mirror"
    }

    async fn init(&self, ctx: &serenity::Context, config: Arc<RwLock<Config>>) -> BotResult<()> {
        let mut service_lock = self.service.write().await;
        if service_lock.is_some() {
            // Ready fires again after a reconnect
            return Ok(());
        }

        let (mirror, interval_minutes) = {
            let config_read = config.read().await;
            let mirror = build_mirror(Arc::clone(&ctx.http), &config_read).await?;
            (mirror, config_read.sync_interval_minutes)
        };

        let service = MirrorService {
            calendar: GoogleCalendarHandle::new(Arc::clone(&config)),
            mirror: Arc::new(Mutex::new(mirror)),
        };

        start_scheduler(
            service.clone(),
            Duration::from_secs(u64::from(interval_minutes) * 60),
            self.cancel.clone(),
        );

        *service_lock = Some(service);
        Ok(())
    }

    async fn shutdown(&self) -> BotResult<()> {
        self.cancel.cancel();

        if let Some(service) = self.service.read().await.as_ref() {
            service.calendar.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
