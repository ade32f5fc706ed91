use crate::commands::{create_error_embed, get_all_application_commands, CommandContext};
use crate::components::calendar_mirror::{build_mirror, run_pass};
use crate::components::{CalendarMirror, ComponentManager, GoogleCalendarHandle};
use crate::config::Config;
use crate::error::Error;
use crate::shutdown;
use poise::serenity_prelude as serenity;
use rust_i18n::t;
use serenity::model::user::OnlineStatus;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging. `RUST_LOG` wins over the configured level.
pub fn init_logging(directive: &str) -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{},serenity=warn,poise=warn", directive))
        }))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub fn load_config(env_file: Option<&Path>) -> miette::Result<Arc<RwLock<Config>>> {
    let config = Config::load(env_file)?;
    rust_i18n::set_locale(&config.bot_locale);
    Ok(Arc::new(RwLock::new(config)))
}

/// Run a single reconciliation pass without connecting to the gateway
pub async fn run_once(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let mut mirror = {
        let config_read = config.read().await;
        let http = Arc::new(serenity::Http::new(&config_read.discord_token));
        build_mirror(http, &config_read).await?
    };

    let calendar = GoogleCalendarHandle::new(Arc::clone(&config));
    let result = run_pass(&calendar, &mut mirror).await;

    if let Err(e) = calendar.shutdown().await {
        error!("Error shutting down Google Calendar actor: {:?}", e);
    }

    let stats = result?;
    info!(
        total = stats.total,
        created = stats.created,
        skipped = stats.skipped,
        failed = stats.failed,
        "single_pass_finished"
    );
    Ok(())
}

/// Initialize and start the Discord bot
pub async fn start_bot(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (token, activity) = {
        let config_read = config.read().await;
        (config_read.discord_token.clone(), config_read.activity.clone())
    };

    // Set up framework options
    let options = poise::FrameworkOptions {
        commands: get_all_application_commands(),
        on_error: |error| Box::pin(on_error(error)),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some("!".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    // Set intents
    let intents = serenity::GatewayIntents::non_privileged();

    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(CalendarMirror::new());
    let component_manager = Arc::new(component_manager);

    // Create a shared data context for commands
    let command_data = CommandContext::new(Arc::clone(&config))
        .with_component_manager(Arc::clone(&component_manager));

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    // Setup failures that should stop the process
    let (fatal_send, fatal_recv) = oneshot::channel::<Error>();

    // Spawn signal handler task
    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components).await;
    });

    let setup_components = Arc::clone(&component_manager);
    let client_result = serenity::ClientBuilder::new(token, intents)
        .framework(poise::Framework::new(
            options,
            move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("{} is connected!", ready.user.name);

                    // Set the bot's status
                    ctx.set_presence(
                        Some(serenity::ActivityData::watching(&activity)),
                        OnlineStatus::Online,
                    );

                    // Initialize components
                    if let Err(e) = setup_components.init_all(ctx).await {
                        error!("Failed to initialize components: {:?}", e);
                        let message = e.to_string();
                        let _ = fatal_send.send(e);
                        return Err(Error::Component(message));
                    }

                    // Register slash commands
                    if let Err(e) =
                        poise::builtins::register_globally(ctx, &framework.options().commands).await
                    {
                        error!("Failed to register slash commands: {:?}", e);
                    } else {
                        info!("Slash commands registered successfully");
                    }

                    Ok(command_data)
                })
            },
        ))
        .await;

    // Start the bot
    info!("Starting bot...");
    let mut client = client_result.map_err(Error::from)?;

    // Create a separate task to handle the client
    let client_handle = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            Err(Error::from(e))
        } else {
            Ok(())
        }
    });

    // Wait for the client to end, a shutdown signal or a fatal setup error
    tokio::select! {
        result = client_handle => {
            info!("Bot process ended");
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => {
                    error!("Client task error: {:?}", e);
                    Err(Error::Other(format!("Client task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, shutting down bot...");
            Ok(())
        }
        Ok(e) = fatal_recv => {
            error!("Setup failed, shutting down bot...");
            if let Err(shutdown_err) = component_manager.shutdown_all().await {
                error!("Error shutting down components: {:?}", shutdown_err);
            }
            Err(e.into())
        }
    }
}

/// Handle errors from commands
async fn on_error(error: poise::FrameworkError<'_, CommandContext, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Error during setup: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {:?}", ctx.command().name, error);
            if let Err(e) = ctx
                .send(
                    poise::CreateReply::default()
                        .embed(create_error_embed(
                            &t!("error_title", context = "command"),
                            &format!("{}", error),
                        ))
                        .ephemeral(true),
                )
                .await
            {
                error!("Error while sending error message: {:?}", e);
            }
        }
        error => {
            error!("Other error: {:?}", error);
        }
    }
}
