use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use holodeck_common::error::Error;
use holodeck_common::models::Scene;
use holodeck_common::traits::repository_traits::SceneRepository;

/// Read-through mirror of the durable scene table.
///
/// The repository is the source of truth; the cache is rebuilt from it at
/// startup and only ever written through [`SceneStore::put`]. Reads come
/// from many concurrent command invocations, so the mirror is a DashMap
/// rather than a bare HashMap.
pub struct SceneStore {
    repo: Arc<dyn SceneRepository>,
    cache: DashMap<String, Scene>,
}

impl SceneStore {
    pub fn new(repo: Arc<dyn SceneRepository>) -> Self {
        Self {
            repo,
            cache: DashMap::new(),
        }
    }

    /// Rebuild the cache from durable storage.
    pub async fn reload(&self) -> Result<(), Error> {
        let scenes = self.repo.list_scenes().await?;
        self.cache.clear();
        for scene in scenes {
            self.cache.insert(scene.name.clone(), scene);
        }
        info!("Scene store loaded: {} scene(s)", self.cache.len());
        Ok(())
    }

    /// Durably persist `scene`, then mirror it into the cache. The cache
    /// is untouched when the durable write fails.
    pub async fn put(&self, scene: Scene) -> Result<(), Error> {
        self.repo.upsert_scene(&scene).await?;
        self.cache.insert(scene.name.clone(), scene);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Scene> {
        self.cache.get(name).map(|s| s.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// All committed scene names, for autocomplete.
    pub fn names(&self) -> Vec<String> {
        self.cache.iter().map(|e| e.key().clone()).collect()
    }
}
