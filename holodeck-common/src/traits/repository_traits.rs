use async_trait::async_trait;

use crate::error::Error;
use crate::models::Scene;

/// Durable scene storage. The repository owns the source of truth; the
/// read-through cache in front of it is rebuilt from `list_scenes` at
/// process start. No delete is exposed.
#[async_trait]
pub trait SceneRepository: Send + Sync {
    /// Persist `scene` keyed by its name. Last writer wins.
    async fn upsert_scene(&self, scene: &Scene) -> Result<(), Error>;

    async fn get_scene(&self, name: &str) -> Result<Option<Scene>, Error>;

    async fn list_scenes(&self) -> Result<Vec<Scene>, Error>;
}
