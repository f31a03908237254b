use crate::queue::{JobStage, VideoJob};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What a cleanup pass removed and what it could not
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub kept: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn remove(&mut self, dir: &Path) {
        if !dir.exists() {
            return;
        }
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {
                debug!("Removed {}", dir.display());
                self.removed.push(dir.to_path_buf());
            }
            Err(e) => {
                warn!("Failed to remove {}: {}", dir.display(), e);
                self.failures.push((dir.to_path_buf(), e.to_string()));
            }
        }
    }
}

/// Release the scratch space of a finished job.
///
/// Download and processing directories always go. Clips are removed only
/// once the job is `Completed`; a failed job keeps its partial output.
/// Failures are recorded, never raised.
pub fn cleanup_job(job: &VideoJob) -> CleanupReport {
    let mut report = CleanupReport::default();
    report.remove(&job.directories.download);
    report.remove(&job.directories.processing);

    if job.stage() == JobStage::Completed {
        report.remove(&job.directories.clips);
    } else if job.directories.clips.exists() {
        report.kept.push(job.directories.clips.clone());
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::test_job;

    fn populate(job: &VideoJob) {
        job.directories.create_all().unwrap();
        std::fs::write(job.directories.download.join("source.mp4"), b"v").unwrap();
        std::fs::write(job.directories.processing.join("tmp"), b"p").unwrap();
        std::fs::write(job.directories.clips.join("clip_000.mp4"), b"c").unwrap();
    }

    #[test]
    fn test_failed_job_keeps_clips() {
        let tmp = tempfile::tempdir().unwrap();
        let mut job = test_job(tmp.path());
        populate(&job);
        job.fail("render crashed").unwrap();

        let report = cleanup_job(&job);
        assert!(report.is_clean());
        assert!(!job.directories.download.exists());
        assert!(!job.directories.processing.exists());
        assert!(job.directories.clips.join("clip_000.mp4").exists());
        assert_eq!(report.kept, vec![job.directories.clips.clone()]);
    }

    #[test]
    fn test_completed_job_removes_clips() {
        let tmp = tempfile::tempdir().unwrap();
        let mut job = test_job(tmp.path());
        populate(&job);
        for stage in [
            JobStage::Downloading,
            JobStage::Processing,
            JobStage::Publishing,
            JobStage::Completed,
        ] {
            job.update_status(stage, None).unwrap();
        }

        let report = cleanup_job(&job);
        assert_eq!(report.removed.len(), 3);
        assert!(!job.directories.clips.exists());
        assert!(job.directories.published.exists());
    }

    #[test]
    fn test_missing_directories_are_not_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let job = test_job(tmp.path());
        let report = cleanup_job(&job);
        assert!(report.is_clean());
        assert!(report.removed.is_empty());
    }
}
