pub mod scene_store;
pub mod sqlite;

pub use scene_store::SceneStore;
pub use sqlite::SqliteSceneRepository;
