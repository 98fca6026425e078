// holodeck-core/src/platforms/discord/runtime.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};

use songbird::Songbird;
use songbird::shards::TwilightMap;
use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway, CloseFrame, Config, Event, EventTypeFlags, Intents, MessageSender, Shard,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::gateway::payload::incoming::Ready as ReadyPayload;
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker};

use holodeck_common::error::Error;
use holodeck_common::traits::platform_traits::{ConnectionStatus, PlatformIntegration};

use crate::platforms::discord::voice::{DiscordVoiceControl, SongbirdGateway};
use crate::repositories::SceneStore;
use crate::services::discord::slashcommands::{
    handle_interaction_create, register_global_slash_commands,
};
use crate::services::{BanishService, SceneService, Services};

/// The shard runner:
///   - calls `shard.next_event(...)`
///   - updates the in-memory cache and feeds songbird
///   - spawns interaction handling so a running banishment never stalls
///     the event loop (songbird needs the voice events flowing to finish
///     its own join handshake).
async fn shard_runner(
    mut shard: Shard,
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
    songbird: Arc<Songbird>,
    services: Arc<Services>,
    application_id: Id<ApplicationMarker>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => {
                cache.update(&event);
                songbird.process(&event).await;

                match &event {
                    Event::Ready(ready) => {
                        let data: &ReadyPayload = ready.as_ref();
                        info!(
                            "Shard {shard_id} => READY as {} (ID={})",
                            data.user.name, data.user.id
                        );
                    }
                    Event::InteractionCreate(interaction) => {
                        let http = http.clone();
                        let cache = cache.clone();
                        let services = services.clone();
                        let interaction = (**interaction).clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_interaction_create(
                                http,
                                application_id,
                                cache,
                                services,
                                &interaction,
                            )
                            .await
                            {
                                error!("Interaction handler error: {e}");
                            }
                        });
                    }
                    _ => {
                        trace!("Shard {shard_id} => unhandled event: {event:?}");
                    }
                }
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

/// Everything the interaction layer needs that exists before the gateway
/// comes up. The voice adapters are built during `connect`, once the
/// shard senders exist.
pub struct PlatformSeed {
    pub store: Arc<SceneStore>,
    pub scenes: Arc<SceneService>,
    pub banish_channel_id: Id<ChannelMarker>,
}

pub struct DiscordPlatform {
    pub token: String,
    pub connection_status: ConnectionStatus,

    seed: PlatformSeed,

    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,

    pub http: Option<Arc<HttpClient>>,
    pub cache: Option<Arc<InMemoryCache>>,
    pub songbird: Option<Arc<Songbird>>,
}

impl DiscordPlatform {
    pub fn new(token: String, seed: PlatformSeed) -> Self {
        Self {
            token,
            connection_status: ConnectionStatus::Disconnected,
            seed,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http: None,
            cache: None,
            songbird: None,
        }
    }
}

#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }

        // Prepare the Twilight client:
        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        self.http = Some(http_client.clone());

        // Prepare the in-memory cache. Voice states are what the
        // relocation protocol reads.
        let cache = InMemoryCache::builder()
            .resource_types(ResourceType::GUILD | ResourceType::CHANNEL | ResourceType::VOICE_STATE)
            .build();
        let cache = Arc::new(cache);
        self.cache = Some(cache.clone());

        let current_user = http_client
            .current_user()
            .await
            .map_err(|e| Error::Platform(format!("current_user error: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("current_user parse error: {e}")))?;
        let application_id = http_client
            .current_user_application()
            .await
            .map_err(|e| Error::Platform(format!("current_user_application error: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("application parse error: {e}")))?
            .id;

        register_global_slash_commands(&http_client, application_id).await?;

        // Gateway config:
        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS | Intents::GUILD_VOICE_STATES,
        );

        // Create recommended shards:
        let shards: Vec<Shard> = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?
            .collect();

        let senders: HashMap<u32, MessageSender> = shards
            .iter()
            .map(|s| (s.id().number(), s.sender()))
            .collect();
        let songbird = Arc::new(Songbird::twilight(
            Arc::new(TwilightMap::new(senders)),
            current_user.id,
        ));
        self.songbird = Some(songbird.clone());

        let services = Arc::new(Services {
            store: self.seed.store.clone(),
            scenes: self.seed.scenes.clone(),
            banish: Arc::new(BanishService::new(
                self.seed.store.clone(),
                Arc::new(SongbirdGateway::new(songbird.clone())),
                Arc::new(DiscordVoiceControl::new(http_client.clone(), cache.clone())),
            )),
            banish_channel_id: self.seed.banish_channel_id,
        });

        for shard in shards {
            self.shard_senders.push(shard.sender());

            let http_for_shard = http_client.clone();
            let cache_for_shard = cache.clone();
            let songbird_for_shard = songbird.clone();
            let services_for_shard = services.clone();

            // Spawn the shard runner:
            let handle = tokio::spawn(async move {
                shard_runner(
                    shard,
                    http_for_shard,
                    cache_for_shard,
                    songbird_for_shard,
                    services_for_shard,
                    application_id,
                )
                .await;
            });
            self.shard_tasks.push(handle);
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        // Gracefully close shards
        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        // Wait for them
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }

        self.shard_senders.clear();
        self.shard_tasks.clear();
        self.songbird = None;

        Ok(())
    }

    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error> {
        Ok(self.connection_status.clone())
    }
}
