use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Stage of a job in a workspace queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStage {
    Queued,
    Downloading,
    Processing,
    Publishing,
    Completed,
    Failed,
}

impl JobStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Failed)
    }

    /// The forward successor on the happy path
    pub fn next(self) -> Option<JobStage> {
        match self {
            JobStage::Queued => Some(JobStage::Downloading),
            JobStage::Downloading => Some(JobStage::Processing),
            JobStage::Processing => Some(JobStage::Publishing),
            JobStage::Publishing => Some(JobStage::Completed),
            JobStage::Completed | JobStage::Failed => None,
        }
    }

    pub fn can_transition_to(self, target: JobStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == JobStage::Failed || self.next() == Some(target)
    }
}

/// One planned segment of the source video
#[derive(Debug, Clone, PartialEq)]
pub struct ClipTiming {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    /// Filled in right before the clip is handed to the publisher
    pub publish_after_seconds: Option<u64>,
}

impl ClipTiming {
    pub fn new(index: usize, start: f64, end: f64) -> Self {
        Self {
            index,
            start,
            end,
            duration: end - start,
            publish_after_seconds: None,
        }
    }

    /// 1-based number shown on labels and receipts
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Directories owned exclusively by one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDirectories {
    pub download: PathBuf,
    pub processing: PathBuf,
    pub clips: PathBuf,
    pub published: PathBuf,
    pub logs: PathBuf,
}

impl JobDirectories {
    pub fn all(&self) -> [&PathBuf; 5] {
        [
            &self.download,
            &self.processing,
            &self.clips,
            &self.published,
            &self.logs,
        ]
    }

    pub fn create_all(&self) -> AppResult<()> {
        for dir in self.all() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// A submitted URL within one workspace
#[derive(Debug, Clone)]
pub struct VideoJob {
    pub workspace_id: u32,
    pub identifier: String,
    pub url: String,
    pub directories: JobDirectories,
    pub created_at: DateTime<Utc>,
    pub estimated_duration: Option<f64>,
    pub clip_plan: Vec<ClipTiming>,
    stage: JobStage,
    error: Option<String>,
}

impl VideoJob {
    pub fn new(
        workspace_id: u32,
        identifier: String,
        url: String,
        directories: JobDirectories,
    ) -> Self {
        Self {
            workspace_id,
            identifier,
            url,
            directories,
            created_at: Utc::now(),
            estimated_duration: None,
            clip_plan: Vec::new(),
            stage: JobStage::Queued,
            error: None,
        }
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The only place stage and error change.
    ///
    /// `error` is kept only when moving to `Failed` and is cleared on every
    /// other transition. A failure without a usable message still records one.
    pub fn update_status(&mut self, stage: JobStage, error: Option<String>) -> AppResult<()> {
        if !self.stage.can_transition_to(stage) {
            return Err(AppError::InvalidTransition {
                from: self.stage,
                to: stage,
            });
        }

        self.error = if stage == JobStage::Failed {
            Some(
                error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "Unknown failure".to_string()),
            )
        } else {
            None
        };
        self.stage = stage;
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> AppResult<()> {
        self.update_status(JobStage::Failed, Some(message.into()))
    }
}

#[cfg(test)]
pub(crate) fn test_job(root: &std::path::Path) -> VideoJob {
    let dirs = JobDirectories {
        download: root.join("downloads/job_t"),
        processing: root.join("processing/job_t"),
        clips: root.join("clips/job_t"),
        published: root.join("published/job_t"),
        logs: root.join("logs/job_t"),
    };
    VideoJob::new(1, "t".to_string(), "https://example.com/v".to_string(), dirs)
}
