// ================================================================
// File: holodeck-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    // Domain errors with user-visible mappings:
    #[error("No media could be extracted from `{0}`")]
    MediaNotFound(String),

    #[error("A scene named `{0}` already exists")]
    SceneExists(String),

    #[error("No scene named `{0}` is on record")]
    UnknownScene(String),

    #[error("User {0} is not connected to voice")]
    NotInVoice(String),

    #[error("Start time {start_millis}ms is beyond the clip length {duration_millis}ms")]
    StartBeyondClip { start_millis: i64, duration_millis: i64 },

    #[error("Another banishment is already in flight")]
    Busy,
}
