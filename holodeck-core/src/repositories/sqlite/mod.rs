pub mod scene;

pub use scene::SqliteSceneRepository;
