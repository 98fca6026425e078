use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct AcquiredMedia {
    /// Locally materialized audio file.
    pub path: PathBuf,
    /// Duration the extractor declared for the whole clip.
    pub duration_millis: i64,
}

/// Boundary to whatever fetches remote audio. A source that resolves to a
/// collection yields its first element.
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    /// Fetch `source_url`, write it under the media directory and report
    /// its duration. "Nothing extractable here" must surface as
    /// [`Error::MediaNotFound`] so callers can tell a bad URL apart from
    /// a transient failure; it is never retried.
    async fn acquire(&self, source_url: &str) -> Result<AcquiredMedia, Error>;
}
