//! Seams between the job pipeline and the outside world.
//!
//! Every long-running or tool-backed step sits behind one of these traits so
//! a workspace can be driven by the real media tools or by test fakes.

use crate::config::{AppPaths, FileStore, LayoutState, WorkspaceSettings};
use crate::error::AppResult;
use crate::layout::Composition;
use crate::media::{
    ArchivePublisher, FfmpegRenderer, FfprobeProbe, WhisperTranscriber, YtDlpDownloader,
};
use crate::queue::ClipTiming;
use crate::utils::ToolLocator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Obtains a local media file for a URL
pub trait Downloader: Send + Sync {
    fn fetch(&self, url: &str, destination: &Path) -> AppResult<PathBuf>;
}

/// Returns the length of a media file in seconds
pub trait DurationProbe: Send + Sync {
    fn probe(&self, file: &Path) -> AppResult<f64>;
}

/// x264 quality knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParams {
    pub crf: u8,
    pub preset: String,
}

/// One clip to cut, composite and encode
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub source: PathBuf,
    pub start: f64,
    pub end: f64,
    pub composition: Composition,
    pub encode: EncodeParams,
    pub output: PathBuf,
}

pub trait RenderEngine: Send + Sync {
    fn render(&self, request: &RenderRequest) -> AppResult<PathBuf>;
}

/// Produces subtitle timing data.
///
/// `Ok(None)` means the capability is not installed, which only disables subtitles.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, file: &Path, output_dir: &Path) -> AppResult<Option<PathBuf>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub clip_file: PathBuf,
    pub clip: ClipTiming,
    pub published_dir: PathBuf,
    pub access_token: String,
    pub delay_seconds: u64,
}

pub trait Publisher: Send + Sync {
    fn publish(&self, request: &PublishRequest) -> AppResult<()>;
}

/// Blocks the worker until a clip may be published
pub trait PublishWait: Send + Sync {
    fn wait(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl PublishWait for ThreadSleep {
    fn wait(&self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Current settings of a workspace, read once per job
pub trait SettingsStore: Send + Sync {
    fn load_settings(&self, workspace_id: u32) -> AppResult<WorkspaceSettings>;
}

/// Current layout of a workspace, read once per render pass
pub trait LayoutStore: Send + Sync {
    fn load_layout(&self, workspace_id: u32) -> AppResult<LayoutState>;
}

/// Fixed settings shared by every workspace
impl SettingsStore for WorkspaceSettings {
    fn load_settings(&self, _workspace_id: u32) -> AppResult<WorkspaceSettings> {
        Ok(self.clone())
    }
}

impl LayoutStore for LayoutState {
    fn load_layout(&self, _workspace_id: u32) -> AppResult<LayoutState> {
        Ok(*self)
    }
}

/// The external services a workspace worker talks to
#[derive(Clone)]
pub struct Collaborators {
    pub downloader: Arc<dyn Downloader>,
    pub probe: Arc<dyn DurationProbe>,
    pub renderer: Arc<dyn RenderEngine>,
    pub transcriber: Arc<dyn Transcriber>,
    pub publisher: Arc<dyn Publisher>,
    pub layouts: Arc<dyn LayoutStore>,
    pub wait: Arc<dyn PublishWait>,
}

impl Collaborators {
    /// Real tools resolved from `PATH` or the tools directory
    pub fn system(paths: &AppPaths) -> Self {
        let tools = Arc::new(ToolLocator::new(paths.tools_dir()));
        Self {
            downloader: Arc::new(YtDlpDownloader::new(tools.clone())),
            probe: Arc::new(FfprobeProbe::new(tools.clone())),
            renderer: Arc::new(FfmpegRenderer::new(tools.clone())),
            transcriber: Arc::new(WhisperTranscriber::new(tools)),
            publisher: Arc::new(ArchivePublisher),
            layouts: Arc::new(FileStore::new(paths.clone())),
            wait: Arc::new(ThreadSleep),
        }
    }
}
