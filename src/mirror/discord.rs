use super::channel::{ChatChannel, DeleteOutcome, HistoryMessage};
use crate::components::google_calendar::EventEmbed;
use crate::error::{discord_error, BotResult};
use async_trait::async_trait;
use serenity::all::{ChannelId, ChannelType, CreateEmbed, CreateMessage, GetMessages, Http, MessageId};
use std::sync::Arc;
use tracing::info;

/// A Discord text channel reached over the REST API
#[derive(Clone)]
pub struct DiscordChannel {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordChannel {
    /// Resolve the configured channel, failing unless it is a guild text channel
    pub async fn resolve(http: Arc<Http>, channel_id: u64) -> BotResult<Self> {
        let channel_id = ChannelId::new(channel_id);
        let channel = channel_id.to_channel(&http).await?;

        let guild_channel = channel
            .guild()
            .ok_or_else(|| discord_error(&format!("Channel {} is not a guild channel", channel_id)))?;

        match guild_channel.kind {
            ChannelType::Text | ChannelType::News => {
                info!(
                    channel_name = %guild_channel.name,
                    channel_id = channel_id.get(),
                    "connected_to_channel"
                );
                Ok(Self { http, channel_id })
            }
            other => Err(discord_error(&format!(
                "Channel {} is not a text channel ({:?})",
                channel_id, other
            ))),
        }
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id.get()
    }
}

fn create_embed(embed: &EventEmbed) -> CreateEmbed {
    let mut builder = CreateEmbed::new()
        .title(&embed.title)
        .colour(embed.color);

    if let Some(url) = &embed.url {
        builder = builder.url(url);
    }

    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }

    builder
}

#[async_trait]
impl ChatChannel for DiscordChannel {
    async fn send(&self, embed: &EventEmbed) -> BotResult<u64> {
        let message = self
            .channel_id
            .send_message(&self.http, CreateMessage::new().embed(create_embed(embed)))
            .await?;

        Ok(message.id.get())
    }

    async fn fetch_history(&self, before: Option<u64>, limit: u8) -> BotResult<Vec<HistoryMessage>> {
        let mut request = GetMessages::new().limit(limit);
        if let Some(before) = before {
            request = request.before(MessageId::new(before));
        }

        let messages = self.channel_id.messages(&self.http, request).await?;

        Ok(messages
            .into_iter()
            .map(|message| HistoryMessage {
                message_id: message.id.get(),
                author_id: message.author.id.get(),
                embed_url: message.embeds.first().and_then(|embed| embed.url.clone()),
            })
            .collect())
    }

    async fn delete(&self, message_id: u64) -> BotResult<DeleteOutcome> {
        let result = self
            .channel_id
            .delete_message(&self.http, MessageId::new(message_id))
            .await;

        match result {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(serenity::Error::Http(e)) if e.status_code().map(|s| s.as_u16()) == Some(404) => {
                Ok(DeleteOutcome::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }
}
