use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, bounded audio+image playback unit. Written once at
/// registration; a later registration with the same name and the
/// overwrite flag replaces the whole record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub creator_user_id: String, // Discord user ID as a string
    pub audio_url: Option<String>, // original source locator, if any
    pub audio_path: String, // locally materialized audio
    pub start_time_millis: i64,
    pub runtime_millis: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}
