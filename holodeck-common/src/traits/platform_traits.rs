use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

use crate::error::Error;
use crate::models::Scene;

#[derive(Debug, Clone)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

#[async_trait]
pub trait PlatformIntegration {
    async fn connect(&mut self) -> Result<(), Error>;
    async fn disconnect(&mut self) -> Result<(), Error>;
    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error>;
}

/// Read and change a member's voice occupancy. Moves are platform
/// requests and may be rejected.
#[async_trait]
pub trait VoiceControl: Send + Sync {
    async fn voice_channel_of(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<Option<Id<ChannelMarker>>, Error>;

    async fn move_member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<(), Error>;
}

/// An established voice connection. One active stream per session: a new
/// clip stops whatever was playing.
#[async_trait]
pub trait VoiceSession: Send + Sync {
    /// Start playing a clip window. Returns as soon as playback is
    /// handed off; the caller is responsible for waiting out the runtime.
    async fn play_clip(
        &self,
        audio_path: &Path,
        start_millis: i64,
        runtime_millis: i64,
    ) -> Result<(), Error>;

    async fn disconnect(&self) -> Result<(), Error>;
}

#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn connect(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<Arc<dyn VoiceSession>, Error>;
}

/// Tells the room a banishment happened. Invoked as playback starts.
#[async_trait]
pub trait BanishAnnouncer: Send + Sync {
    async fn announce(&self, scene: &Scene, target_id: Id<UserMarker>) -> Result<(), Error>;
}
