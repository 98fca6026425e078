// holodeck-core/src/services/banish_service.rs
//
// The end-to-end banishment: move the target into the configured voice
// channel, play the scene at them for its bounded runtime, move them
// back, disconnect. At most one of these is in flight at a time.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{info, warn};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

use holodeck_common::error::Error;
use holodeck_common::models::Scene;
use holodeck_common::traits::platform_traits::{
    BanishAnnouncer, VoiceControl, VoiceGateway, VoiceSession,
};

use crate::repositories::SceneStore;
use crate::services::relocation::Relocation;

#[derive(Debug, Clone)]
pub struct BanishRequest {
    pub guild_id: Id<GuildMarker>,
    pub target_id: Id<UserMarker>,
    pub scene_name: String,
    pub dest_channel_id: Id<ChannelMarker>,
}

pub struct BanishService {
    store: Arc<SceneStore>,
    gateway: Arc<dyn VoiceGateway>,
    voice: Arc<dyn VoiceControl>,
    /// One banishment in flight, ever. Constructed here, owned here;
    /// deliberately not per guild.
    lock: Mutex<()>,
}

impl BanishService {
    pub fn new(
        store: Arc<SceneStore>,
        gateway: Arc<dyn VoiceGateway>,
        voice: Arc<dyn VoiceControl>,
    ) -> Self {
        Self {
            store,
            gateway,
            voice,
            lock: Mutex::new(()),
        }
    }

    /// Run one banishment end to end. The global lock is held for the
    /// whole voice occupancy; every error past the connect still reaches
    /// session teardown and the lock release.
    pub async fn banish(
        &self,
        req: BanishRequest,
        announcer: &dyn BanishAnnouncer,
    ) -> Result<(), Error> {
        let scene = self
            .store
            .get(&req.scene_name)
            .ok_or_else(|| Error::UnknownScene(req.scene_name.clone()))?;

        if self
            .voice
            .voice_channel_of(req.guild_id, req.target_id)
            .await?
            .is_none()
        {
            return Err(Error::NotInVoice(req.target_id.to_string()));
        }

        // Courtesy pre-check so contenders hear "busy" instead of
        // queueing. Not the mutual exclusion itself: two requests may
        // both pass this and then serialize on the lock below. Intended.
        if self.lock.try_lock().is_err() {
            return Err(Error::Busy);
        }
        let _guard = self.lock.lock().await;

        info!("Banishing {} to `{}`", req.target_id, scene.name);
        let session = self
            .gateway
            .connect(req.guild_id, req.dest_channel_id)
            .await?;

        let outcome = self
            .run_scene(&req, &scene, session.as_ref(), announcer)
            .await;

        if let Err(e) = session.disconnect().await {
            warn!("Failed to disconnect the voice session: {e}");
        }
        outcome
    }

    async fn run_scene(
        &self,
        req: &BanishRequest,
        scene: &Scene,
        session: &dyn VoiceSession,
        announcer: &dyn BanishAnnouncer,
    ) -> Result<(), Error> {
        let relocation = Relocation::begin(
            Arc::clone(&self.voice),
            req.guild_id,
            req.target_id,
            req.dest_channel_id,
        )
        .await?;

        let outcome = async {
            session
                .play_clip(
                    Path::new(&scene.audio_path),
                    scene.start_time_millis,
                    scene.runtime_millis,
                )
                .await?;
            announcer.announce(scene, req.target_id).await?;
            sleep(Duration::from_millis(scene.runtime_millis.max(0) as u64)).await;
            Ok(())
        }
        .await;

        relocation.restore().await;
        outcome
    }
}
