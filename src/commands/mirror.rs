use crate::commands::{
    create_error_embed, create_info_embed, create_success_embed, CommandResult, Context,
};
use crate::components::calendar_mirror::{CalendarMirror, MirrorService};
use rust_i18n::t;
use tracing::{debug, error};

/// Find the running mirror service through the component manager
async fn mirror_service(ctx: &Context<'_>) -> Option<MirrorService> {
    let Some(manager) = ctx.data().component_manager.as_ref() else {
        debug!("ComponentManager not available");
        return None;
    };

    match manager.get::<CalendarMirror>() {
        Some(component) => component.service().await,
        None => {
            debug!("Calendar mirror component not registered");
            None
        }
    }
}

async fn reply_not_ready(ctx: Context<'_>) -> CommandResult {
    ctx.send(
        poise::CreateReply::default()
            .embed(create_error_embed(
                &t!("error_title", context = "mirror"),
                &t!("mirror_not_ready"),
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Mirror upcoming calendar events into the channel now
#[poise::command(slash_command, prefix_command)]
pub async fn sync(ctx: Context<'_>) -> CommandResult {
    let Some(service) = mirror_service(&ctx).await else {
        return reply_not_ready(ctx).await;
    };

    // Passes can take a while with many events
    ctx.defer().await?;

    match service.run_pass().await {
        Ok(stats) => {
            ctx.send(poise::CreateReply::default().embed(create_success_embed(
                &t!("sync_title"),
                &t!(
                    "sync_result",
                    total = stats.total,
                    created = stats.created,
                    skipped = stats.skipped,
                    failed = stats.failed
                ),
            )))
            .await?;
        }
        Err(e) => {
            error!(error = %e, "manual_sync_failed");
            ctx.send(
                poise::CreateReply::default()
                    .embed(create_error_embed(
                        &t!("error_title", context = "sync"),
                        &t!("sync_failed", error = e.to_string()),
                    ))
                    .ephemeral(true),
            )
            .await?;
        }
    }

    Ok(())
}

/// Show how many events and links the mirror currently tracks
#[poise::command(slash_command, prefix_command)]
pub async fn mirror_status(ctx: Context<'_>) -> CommandResult {
    let Some(service) = mirror_service(&ctx).await else {
        return reply_not_ready(ctx).await;
    };

    let (events, links, channel_id) = {
        let mirror = service.mirror.lock().await;
        (
            mirror.index().event_count(),
            mirror.index().link_count(),
            mirror.channel().channel_id(),
        )
    };

    ctx.send(
        poise::CreateReply::default()
            .embed(create_info_embed(
                &t!("status_title"),
                &t!(
                    "status_body",
                    channel = format!("<#{}>", channel_id),
                    events = events,
                    links = links
                ),
            ))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
