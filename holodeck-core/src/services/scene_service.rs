// holodeck-core/src/services/scene_service.rs

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use holodeck_common::error::Error;
use holodeck_common::models::Scene;
use holodeck_common::traits::media_traits::MediaAcquirer;

use crate::repositories::SceneStore;

/// Hard ceiling on how long any scene may play.
pub const MAX_RUNTIME_MILLIS: i64 = 30_000;

#[derive(Debug, Clone)]
pub struct RegisterScene {
    pub name: String,
    pub creator_user_id: String,
    pub youtube_url: String,
    pub image_url: String,
    pub runtime_seconds: f64,
    pub start_time_seconds: f64,
    pub overwrite: bool,
}

pub struct SceneService {
    store: Arc<SceneStore>,
    acquirer: Arc<dyn MediaAcquirer>,
}

impl SceneService {
    pub fn new(store: Arc<SceneStore>, acquirer: Arc<dyn MediaAcquirer>) -> Self {
        Self { store, acquirer }
    }

    /// Register a scene end to end: duplicate check, audio download,
    /// window computation, durable write.
    pub async fn register(&self, req: RegisterScene) -> Result<Scene, Error> {
        // There is a window between this check and the write below where
        // a concurrent registration could claim the same name. Rare and
        // harmless: the upsert makes the last writer win.
        if self.store.contains(&req.name) && !req.overwrite {
            return Err(Error::SceneExists(req.name));
        }

        let media = self.acquirer.acquire(&req.youtube_url).await?;

        let start_time_millis = (req.start_time_seconds * 1000.0) as i64;
        let requested_millis = (req.runtime_seconds * 1000.0) as i64;
        let runtime_millis =
            bounded_runtime_millis(requested_millis, start_time_millis, media.duration_millis)?;

        let scene = Scene {
            name: req.name,
            creator_user_id: req.creator_user_id,
            audio_url: Some(req.youtube_url),
            audio_path: media.path.to_string_lossy().into_owned(),
            start_time_millis,
            runtime_millis,
            image_url: req.image_url,
            created_at: Utc::now(),
        };
        self.store.put(scene.clone()).await?;

        info!(
            "Registered scene `{}`: {}ms starting at {}ms",
            scene.name, scene.runtime_millis, scene.start_time_millis
        );
        Ok(scene)
    }
}

/// Cap a requested runtime by the hard ceiling and by what is left of the
/// clip after the start offset. A start offset at or past the end of the
/// clip is rejected outright instead of producing an empty window.
pub fn bounded_runtime_millis(
    requested_millis: i64,
    start_millis: i64,
    duration_millis: i64,
) -> Result<i64, Error> {
    if start_millis >= duration_millis {
        return Err(Error::StartBeyondClip {
            start_millis,
            duration_millis,
        });
    }
    Ok(MAX_RUNTIME_MILLIS
        .min(requested_millis)
        .min(duration_millis - start_millis))
}
