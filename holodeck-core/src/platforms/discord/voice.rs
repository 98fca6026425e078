// holodeck-core/src/platforms/discord/voice.rs
//
// Songbird-backed voice adapters. The shard runner feeds every gateway
// event into the shared Songbird instance, so joins resolve while a
// banishment is parked on them.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use songbird::{Call, Songbird};
use tracing::debug;
use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

use holodeck_common::error::Error;
use holodeck_common::traits::platform_traits::{VoiceControl, VoiceGateway, VoiceSession};

use crate::playback;

/// Voice occupancy reads come from the gateway cache; moves go through
/// the HTTP API and may be rejected by the platform.
pub struct DiscordVoiceControl {
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
}

impl DiscordVoiceControl {
    pub fn new(http: Arc<HttpClient>, cache: Arc<InMemoryCache>) -> Self {
        Self { http, cache }
    }
}

#[async_trait]
impl VoiceControl for DiscordVoiceControl {
    async fn voice_channel_of(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<Option<Id<ChannelMarker>>, Error> {
        Ok(self
            .cache
            .voice_state(user_id, guild_id)
            .map(|vs| vs.channel_id()))
    }

    async fn move_member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<(), Error> {
        self.http
            .update_guild_member(guild_id, user_id)
            .channel_id(Some(channel_id))
            .await
            .map_err(|e| Error::Platform(format!("Move to {channel_id} rejected: {e}")))?;
        Ok(())
    }
}

pub struct SongbirdGateway {
    songbird: Arc<Songbird>,
}

impl SongbirdGateway {
    pub fn new(songbird: Arc<Songbird>) -> Self {
        Self { songbird }
    }
}

#[async_trait]
impl VoiceGateway for SongbirdGateway {
    async fn connect(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<Arc<dyn VoiceSession>, Error> {
        let call = self
            .songbird
            .join(guild_id, channel_id)
            .await
            .map_err(|e| Error::Platform(format!("Voice connect to {channel_id} failed: {e}")))?;

        Ok(Arc::new(SongbirdSession {
            songbird: Arc::clone(&self.songbird),
            guild_id,
            call,
        }))
    }
}

pub struct SongbirdSession {
    songbird: Arc<Songbird>,
    guild_id: Id<GuildMarker>,
    call: Arc<tokio::sync::Mutex<Call>>,
}

#[async_trait]
impl VoiceSession for SongbirdSession {
    async fn play_clip(
        &self,
        audio_path: &Path,
        start_millis: i64,
        runtime_millis: i64,
    ) -> Result<(), Error> {
        let input = playback::open_clip(audio_path, start_millis, runtime_millis)?;

        let mut call = self.call.lock().await;
        // One stream per session: whatever is still playing stops now.
        call.stop();
        let _handle = call.play_only_input(input);
        debug!("Playback started: {}", audio_path.display());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), Error> {
        self.songbird
            .remove(self.guild_id)
            .await
            .map_err(|e| Error::Platform(format!("Voice disconnect failed: {e}")))?;
        Ok(())
    }
}
