//! The per-job processing pipeline run by a workspace worker.

pub mod cleanup;
pub mod collaborators;

pub use cleanup::{CleanupReport, cleanup_job};
pub use collaborators::{
    Collaborators, Downloader, DurationProbe, EncodeParams, LayoutStore, PublishRequest,
    PublishWait, Publisher, RenderEngine, RenderRequest, SettingsStore, ThreadSleep, Transcriber,
};

use crate::config::{LayoutState, WorkspaceSettings};
use crate::error::{AppError, AppResult};
use crate::layout::compose_clip;
use crate::queue::{EventEmitter, JobStage, VideoJob};
use crate::schedule::{IntervalPolicy, PlanPolicy, PublishScheduler, plan_clips};
use crate::utils::{LOW_SPACE_BYTES, format_file_size, low_space};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// One step of the pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Probe,
    Plan,
    Render,
    Transcribe,
    Publish,
}

impl Stage {
    pub const ORDER: [Stage; 6] = [
        Stage::Download,
        Stage::Probe,
        Stage::Plan,
        Stage::Render,
        Stage::Transcribe,
        Stage::Publish,
    ];

    /// Job stage entered when this step begins, with its message
    pub fn entry(self) -> Option<(JobStage, &'static str)> {
        match self {
            Stage::Download => Some((JobStage::Downloading, "Downloading video")),
            Stage::Probe => Some((JobStage::Processing, "Processing video")),
            Stage::Publish => Some((JobStage::Publishing, "Publishing clips")),
            Stage::Plan | Stage::Render | Stage::Transcribe => None,
        }
    }
}

/// Steps to run for a job with these settings
pub fn stages_for(settings: &WorkspaceSettings) -> Vec<Stage> {
    Stage::ORDER
        .into_iter()
        .filter(|stage| *stage != Stage::Transcribe || settings.rendering.transcribe)
        .collect()
}

/// Settings of `workspace_id`, or the defaults when they cannot be read
pub fn settings_or_default(store: &dyn SettingsStore, workspace_id: u32) -> WorkspaceSettings {
    match store.load_settings(workspace_id) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(
                "Settings for workspace {} unreadable: {}. Using defaults.",
                workspace_id, e
            );
            WorkspaceSettings::default()
        }
    }
}

/// Outputs carried from one step to the next
#[derive(Debug, Default)]
struct Artifacts {
    source: Option<PathBuf>,
    clips: Vec<PathBuf>,
}

impl Artifacts {
    fn source(&self) -> AppResult<&PathBuf> {
        self.source
            .as_ref()
            .ok_or_else(|| AppError::Probe("No downloaded source file".to_string()))
    }
}

/// Drives one job through every step
pub struct Pipeline<'a> {
    collaborators: &'a Collaborators,
    settings: &'a dyn SettingsStore,
    emitter: &'a EventEmitter,
    scheduler: &'a mut PublishScheduler,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        collaborators: &'a Collaborators,
        settings: &'a dyn SettingsStore,
        emitter: &'a EventEmitter,
        scheduler: &'a mut PublishScheduler,
    ) -> Self {
        Self {
            collaborators,
            settings,
            emitter,
            scheduler,
        }
    }

    /// Run the job to `Completed`, or return the error that stopped it
    pub fn run(&mut self, job: &mut VideoJob) -> AppResult<()> {
        let settings = self.current_settings(job.workspace_id);
        let mut artifacts = Artifacts::default();

        for stage in stages_for(&settings) {
            if let Some((job_stage, message)) = stage.entry() {
                self.transition(job, job_stage, message)?;
            }
            self.run_stage(stage, job, &settings, &mut artifacts)?;
        }

        self.transition(job, JobStage::Completed, "All clips published")
    }

    fn transition(&self, job: &mut VideoJob, stage: JobStage, message: &str) -> AppResult<()> {
        job.update_status(stage, None)?;
        info!("Job {} -> {:?}", job.identifier, stage);
        self.emitter.emit(job, stage, message);
        Ok(())
    }

    fn current_settings(&self, workspace_id: u32) -> WorkspaceSettings {
        settings_or_default(self.settings, workspace_id)
    }

    fn current_layout(&self, workspace_id: u32) -> LayoutState {
        match self.collaborators.layouts.load_layout(workspace_id) {
            Ok(layout) => layout,
            Err(e) => {
                warn!(
                    "Layout for workspace {} unreadable: {}. Using defaults.",
                    workspace_id, e
                );
                LayoutState::default()
            }
        }
    }

    fn run_stage(
        &mut self,
        stage: Stage,
        job: &mut VideoJob,
        settings: &WorkspaceSettings,
        artifacts: &mut Artifacts,
    ) -> AppResult<()> {
        match stage {
            Stage::Download => self.download(job, artifacts),
            Stage::Probe => self.probe(job, artifacts),
            Stage::Plan => self.plan(job, settings),
            Stage::Render => self.render(job, settings, artifacts),
            Stage::Transcribe => self.transcribe(job, artifacts),
            Stage::Publish => self.publish(job, settings, artifacts),
        }
    }

    fn download(&self, job: &mut VideoJob, artifacts: &mut Artifacts) -> AppResult<()> {
        job.directories.create_all()?;
        if let Some(free) = low_space(&job.directories.download, LOW_SPACE_BYTES) {
            self.emitter.notice(
                job,
                &format!("Low disk space: {} available", format_file_size(free)),
            );
        }

        let source = self
            .collaborators
            .downloader
            .fetch(&job.url, &job.directories.download)?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.emitter.notice(job, &format!("Downloaded {}", name));
        artifacts.source = Some(source);
        Ok(())
    }

    fn probe(&self, job: &mut VideoJob, artifacts: &Artifacts) -> AppResult<()> {
        let duration = self.collaborators.probe.probe(artifacts.source()?)?;
        job.estimated_duration = Some(duration);
        Ok(())
    }

    fn plan(&self, job: &mut VideoJob, settings: &WorkspaceSettings) -> AppResult<()> {
        let duration = job.estimated_duration.unwrap_or(0.0);
        job.clip_plan = plan_clips(duration, PlanPolicy::from(&settings.rendering));
        if job.clip_plan.is_empty() {
            return Err(AppError::Probe(format!(
                "Source duration ({}) yields no clips",
                duration
            )));
        }
        self.emitter
            .notice(job, &format!("Planned {} clips", job.clip_plan.len()));
        Ok(())
    }

    fn render(
        &self,
        job: &mut VideoJob,
        settings: &WorkspaceSettings,
        artifacts: &mut Artifacts,
    ) -> AppResult<()> {
        // Snapshot so edits made while rendering apply to the next job
        let layout = self.current_layout(job.workspace_id);
        let source = artifacts.source()?.clone();
        let encode = EncodeParams {
            crf: settings.rendering.crf,
            preset: settings.rendering.x264_preset.clone(),
        };
        let total = job.clip_plan.len();

        for clip in &job.clip_plan {
            let request = RenderRequest {
                source: source.clone(),
                start: clip.start,
                end: clip.end,
                composition: compose_clip(
                    &layout,
                    &settings.rendering,
                    &settings.publication,
                    &job.url,
                    clip,
                    total,
                ),
                encode: encode.clone(),
                output: job
                    .directories
                    .clips
                    .join(format!("clip_{:03}.mp4", clip.index)),
            };
            let output = self.collaborators.renderer.render(&request)?;
            let size = std::fs::metadata(&output)
                .map(|m| format_file_size(m.len()))
                .unwrap_or_else(|_| "unknown size".to_string());
            self.emitter.notice(
                job,
                &format!("Rendered clip {}/{} ({})", clip.number(), total, size),
            );
            artifacts.clips.push(output);
        }
        Ok(())
    }

    fn transcribe(&self, job: &mut VideoJob, artifacts: &Artifacts) -> AppResult<()> {
        let source = artifacts.source()?;
        match self
            .collaborators
            .transcriber
            .transcribe(source, &job.directories.clips)?
        {
            Some(subtitles) => {
                let name = subtitles
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.emitter
                    .notice(job, &format!("Subtitles written to {}", name));
            }
            None => {
                self.emitter
                    .notice(job, "Transcription unavailable: subtitles disabled");
            }
        }
        Ok(())
    }

    fn publish(
        &mut self,
        job: &mut VideoJob,
        settings: &WorkspaceSettings,
        artifacts: &Artifacts,
    ) -> AppResult<()> {
        let policy = IntervalPolicy::from(&settings.publication);
        let publication = &settings.publication;

        for (position, clip_file) in artifacts.clips.iter().enumerate() {
            let delay = self.scheduler.delay_for_clip(policy);
            let clip = &mut job.clip_plan[position];
            clip.publish_after_seconds = Some(delay);
            let clip = clip.clone();

            self.emitter.notice(
                job,
                &format!(
                    "Clip {}: waiting {} seconds before publishing",
                    clip.number(),
                    delay
                ),
            );
            self.collaborators.wait.wait(Duration::from_secs(delay));
            self.collaborators.publisher.publish(&PublishRequest {
                clip_file: clip_file.clone(),
                clip,
                published_dir: job.directories.published.clone(),
                access_token: publication.access_token.clone(),
                delay_seconds: delay,
            })?;
        }
        Ok(())
    }
}
