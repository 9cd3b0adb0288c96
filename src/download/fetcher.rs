//! Leaf download primitives.
//!
//! Images are fetched directly; videos arrive as streaming playlists and are
//! stream-copied into a single mp4 by an external ffmpeg invocation whose
//! exit code is the sole success signal.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::fs::naming::{allocate_unique, reserve_unique};

/// Extension written for image assets. Fixed regardless of the actual encoded
/// format, matching the upstream convention for original-resolution pins.
const IMAGE_EXT: &str = "png";

const VIDEO_EXT: &str = "mp4";

/// The per-asset download seam used by the orchestrator.
///
/// Both methods name their output inside `dir` from `base_name` via the
/// collision-free allocator and return the number of bytes written.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str, dir: &Path, base_name: &str) -> Result<u64>;
    async fn fetch_video(&self, url: &str, dir: &Path, base_name: &str) -> Result<u64>;
}

/// Production fetcher: HTTP for images, ffmpeg remux for videos.
pub struct HttpMediaFetcher {
    client: Arc<ApiClient>,
}

impl HttpMediaFetcher {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch_image(&self, url: &str, dir: &Path, base_name: &str) -> Result<u64> {
        let response = self.client.download_file(url).await?;

        let (path, mut file) = allocate_unique(dir, base_name, IMAGE_EXT).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    // Don't leave a truncated file claiming the name.
                    drop(file);
                    let _ = fs::remove_file(&path).await;
                    return Err(Error::Download(format!("stream error: {}", e)));
                }
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), written);
        Ok(written)
    }

    async fn fetch_video(&self, url: &str, dir: &Path, base_name: &str) -> Result<u64> {
        // Remux into a randomized temp name; only a fully successful copy is
        // renamed onto its final, collision-free name.
        let temp = dir.join(format!(".remux-{}.{}", Uuid::new_v4(), VIDEO_EXT));

        if let Err(e) = remux_stream(url, &temp).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e);
        }

        let final_path = match reserve_unique(dir, base_name, VIDEO_EXT).await {
            Ok(path) => path,
            Err(e) => {
                let _ = fs::remove_file(&temp).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp, &final_path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(Error::Io(e));
        }

        let size = fs::metadata(&final_path).await?.len();
        tracing::debug!("Remuxed {} ({} bytes)", final_path.display(), size);
        Ok(size)
    }
}

/// Stream-copy a playlist URL into a single mp4. No re-encoding.
async fn remux_stream(url: &str, output_path: &Path) -> Result<()> {
    let output = Command::new("ffmpeg")
        .args(["-i", url, "-codec", "copy"])
        .args(["-hide_banner", "-y", "-loglevel", "warning"])
        .args(["-f", VIDEO_EXT])
        .arg(output_path)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::RemuxNotFound
            } else {
                Error::Remux(format!("failed to run ffmpeg: {}", e))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Remux(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}
