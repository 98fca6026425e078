// holodeck-core/src/services/relocation.rs

use std::sync::Arc;

use tracing::{debug, warn};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

use holodeck_common::error::Error;
use holodeck_common::traits::platform_traits::VoiceControl;

/// Temporary move of a member into a destination channel with guaranteed
/// best-effort restoration.
///
/// `begin` captures the member's current channel and performs the move.
/// `restore` revalidates before moving back: it is skipped when the
/// member has left voice or is no longer in the destination channel — a
/// voluntary move is never reversed. When the owning future is dropped
/// before `restore` ran (cancellation), the same restore is spawned from
/// `Drop`.
pub struct Relocation {
    voice: Arc<dyn VoiceControl>,
    guild_id: Id<GuildMarker>,
    user_id: Id<UserMarker>,
    dest_id: Id<ChannelMarker>,
    origin_id: Id<ChannelMarker>,
    restored: bool,
}

impl Relocation {
    /// Fails with [`Error::NotInVoice`] when the member occupies no voice
    /// channel, and with a platform error when the move is rejected; in
    /// both cases nothing has to be undone.
    pub async fn begin(
        voice: Arc<dyn VoiceControl>,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        dest_id: Id<ChannelMarker>,
    ) -> Result<Self, Error> {
        let origin_id = voice
            .voice_channel_of(guild_id, user_id)
            .await?
            .ok_or_else(|| Error::NotInVoice(user_id.to_string()))?;
        voice.move_member(guild_id, user_id, dest_id).await?;

        Ok(Self {
            voice,
            guild_id,
            user_id,
            dest_id,
            origin_id,
            restored: false,
        })
    }

    /// Move the member back to where they came from, unless they moved on.
    /// Failures are logged, never surfaced.
    pub async fn restore(mut self) {
        restore_member(
            &*self.voice,
            self.guild_id,
            self.user_id,
            self.dest_id,
            self.origin_id,
        )
        .await;
        // Only disarm the drop hook once the move-back actually ran, so a
        // cancelled restore still gets re-spawned.
        self.restored = true;
    }
}

impl Drop for Relocation {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        let voice = Arc::clone(&self.voice);
        let (guild_id, user_id, dest_id, origin_id) =
            (self.guild_id, self.user_id, self.dest_id, self.origin_id);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                restore_member(&*voice, guild_id, user_id, dest_id, origin_id).await;
            });
        } else {
            warn!("Relocation of {user_id} dropped outside a runtime; cannot restore");
        }
    }
}

async fn restore_member(
    voice: &dyn VoiceControl,
    guild_id: Id<GuildMarker>,
    user_id: Id<UserMarker>,
    dest_id: Id<ChannelMarker>,
    origin_id: Id<ChannelMarker>,
) {
    match voice.voice_channel_of(guild_id, user_id).await {
        Ok(Some(current)) if current == dest_id => {
            if let Err(e) = voice.move_member(guild_id, user_id, origin_id).await {
                warn!("Failed to move {user_id} back to {origin_id}: {e}");
            }
        }
        Ok(_) => {
            // They left voice or went somewhere else on their own.
            debug!("Skipping restore for {user_id}: no longer in the destination channel");
        }
        Err(e) => {
            warn!("Could not read voice state of {user_id} during restore: {e}");
        }
    }
}
