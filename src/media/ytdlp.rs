use super::run_tool;
use crate::error::{AppError, AppResult};
use crate::pipeline::Downloader;
use crate::utils::ToolLocator;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::info;
use walkdir::WalkDir;

/// Downloads with yt-dlp into the job's download directory
pub struct YtDlpDownloader {
    tools: Arc<ToolLocator>,
}

impl YtDlpDownloader {
    pub fn new(tools: Arc<ToolLocator>) -> Self {
        Self { tools }
    }
}

impl Downloader for YtDlpDownloader {
    fn fetch(&self, url: &str, destination: &Path) -> AppResult<PathBuf> {
        let yt_dlp = self.tools.resolve("yt-dlp")?;
        std::fs::create_dir_all(destination)?;

        info!("Downloading {} into {}", url, destination.display());
        let template = destination.join("%(title)s.%(ext)s");
        run_tool(
            Command::new(&yt_dlp)
                .arg(url)
                .arg("-o")
                .arg(&template)
                .arg("--restrict-filenames")
                .arg("--no-playlist"),
            "yt-dlp",
            self.tools.tools_dir(),
            AppError::Download,
        )?;

        newest_file(destination)
            .ok_or_else(|| AppError::Download("No file was created".to_string()))
    }
}

/// Most recently modified finished file directly inside `dir`
pub fn newest_file(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_none_or(|ext| ext != "part" && ext != "ytdl")
        })
        .max_by_key(|entry| {
            entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        })
        .map(|entry| entry.into_path())
}
