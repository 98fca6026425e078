pub mod banish_service;
pub mod discord;
pub mod relocation;
pub mod scene_service;

pub use banish_service::{BanishRequest, BanishService};
pub use scene_service::{RegisterScene, SceneService};

use std::sync::Arc;

use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;

use crate::repositories::SceneStore;

/// Shared handles the slash-command layer works against.
pub struct Services {
    pub store: Arc<SceneStore>,
    pub scenes: Arc<SceneService>,
    pub banish: Arc<BanishService>,
    /// The voice channel members get banished into.
    pub banish_channel_id: Id<ChannelMarker>,
}
