use crate::error::{AppError, AppResult};
use crate::pipeline::{PublishRequest, Publisher};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

/// Records each publication as a receipt in the job's published directory.
///
/// Stands in for a platform upload; the access token is never written out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchivePublisher;

/// `clip_NNN.txt`, numbered from 1
pub fn receipt_path(published_dir: &Path, clip_number: usize) -> PathBuf {
    published_dir.join(format!("clip_{:03}.txt", clip_number))
}

impl Publisher for ArchivePublisher {
    fn publish(&self, request: &PublishRequest) -> AppResult<()> {
        std::fs::create_dir_all(&request.published_dir)
            .map_err(|e| AppError::Publish(format!("Failed to create published dir: {}", e)))?;

        let clip_name = request
            .clip_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let receipt = format!(
            "clip: {}\nstart_seconds: {:.3}\nend_seconds: {:.3}\ndelay_seconds: {}\npublished_at: {}\n",
            clip_name,
            request.clip.start,
            request.clip.end,
            request.delay_seconds,
            Utc::now().to_rfc3339()
        );

        let path = receipt_path(&request.published_dir, request.clip.number());
        std::fs::write(&path, receipt)
            .map_err(|e| AppError::Publish(format!("Failed to write receipt: {}", e)))?;
        info!("Published {} ({})", clip_name, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ClipTiming;

    #[test]
    fn test_receipt_written_without_token() {
        let tmp = tempfile::tempdir().unwrap();
        let published = tmp.path().join("published");
        let request = PublishRequest {
            clip_file: tmp.path().join("clip_002.mp4"),
            clip: ClipTiming::new(2, 240.0, 360.0),
            published_dir: published.clone(),
            access_token: "secret-token".to_string(),
            delay_seconds: 75,
        };

        ArchivePublisher.publish(&request).unwrap();

        let receipt = std::fs::read_to_string(receipt_path(&published, 3)).unwrap();
        assert!(receipt.starts_with("clip: clip_002.mp4\n"));
        assert!(receipt.contains("delay_seconds: 75\n"));
        assert!(!receipt.contains("secret-token"));
    }
}
