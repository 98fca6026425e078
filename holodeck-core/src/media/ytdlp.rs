// holodeck-core/src/media/ytdlp.rs

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use holodeck_common::error::Error;
use holodeck_common::traits::media_traits::{AcquiredMedia, MediaAcquirer};

/// Downloads scene audio with the `yt-dlp` CLI.
///
/// Output files are named `extractor-id-title.ext` with a restricted
/// charset under the media directory, so repeated registrations of the
/// same source land on the same file. Nothing here evicts old downloads.
pub struct YtDlpAcquirer {
    media_dir: PathBuf,
}

impl YtDlpAcquirer {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }
}

#[async_trait]
impl MediaAcquirer for YtDlpAcquirer {
    async fn acquire(&self, source_url: &str) -> Result<AcquiredMedia, Error> {
        tokio::fs::create_dir_all(&self.media_dir).await?;

        let template = self.media_dir.join("%(extractor)s-%(id)s-%(title)s.%(ext)s");

        info!("Downloading scene audio: {source_url}");
        let output = Command::new("yt-dlp")
            .arg("--format")
            .arg("bestaudio/best")
            .arg("--no-playlist")
            .arg("--restrict-filenames")
            .arg("--no-warnings")
            .arg("--print-json")
            .arg("--output")
            .arg(&template)
            .arg("--")
            .arg(source_url)
            .output()
            .await?;

        if !output.status.success() {
            // yt-dlp reporting on a URL it was handed means the source had
            // nothing extractable; spawn/IO failures surfaced above.
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp failed for {source_url}: {}", stderr.trim());
            return Err(Error::MediaNotFound(source_url.to_string()));
        }

        // One JSON object per line, one line per downloaded entry. A
        // collection that slipped past --no-playlist resolves to its
        // first entry.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let first = stdout
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| Error::MediaNotFound(source_url.to_string()))?;
        let data: serde_json::Value = serde_json::from_str(first)?;

        let path = data
            .get("_filename")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::MediaNotFound(source_url.to_string()))?;
        let duration_secs = data
            .get("duration")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| Error::MediaNotFound(source_url.to_string()))?;

        Ok(AcquiredMedia {
            path: PathBuf::from(path),
            duration_millis: (duration_secs * 1000.0) as i64,
        })
    }
}
