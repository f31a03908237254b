use crate::error::{AppError, AppResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Tools the pipeline cannot run without
pub const REQUIRED_TOOLS: [&str; 3] = ["yt-dlp", "ffprobe", "ffmpeg"];
/// Tools that only enable extra features
pub const OPTIONAL_TOOLS: [&str; 1] = ["whisper"];

/// Search `PATH`, then the bundled tools directory
pub fn locate_dependency(name: &str, tools_dir: &Path) -> Option<PathBuf> {
    if let Ok(found) = which::which(name) {
        return Some(found);
    }

    let hint_dir = match name {
        "ffmpeg" | "ffprobe" => tools_dir.join("ffmpeg").join("bin"),
        other => tools_dir.join(other),
    };
    [
        hint_dir.join(name),
        hint_dir.join(format!("{}.exe", name)),
        tools_dir.join(name),
        tools_dir.join(format!("{}.exe", name)),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

/// Resolves executables once and remembers the result
#[derive(Debug)]
pub struct ToolLocator {
    tools_dir: PathBuf,
    resolved: Mutex<HashMap<String, PathBuf>>,
}

impl ToolLocator {
    pub fn new(tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            tools_dir: tools_dir.into(),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    pub fn resolve(&self, name: &str) -> AppResult<PathBuf> {
        let mut resolved = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(path) = resolved.get(name) {
            return Ok(path.clone());
        }

        let path = locate_dependency(name, &self.tools_dir)
            .ok_or_else(|| AppError::dependency(name, &self.tools_dir))?;
        info!("Using {} at {}", name, path.display());
        resolved.insert(name.to_string(), path.clone());
        Ok(path)
    }

    pub fn is_available(&self, name: &str) -> bool {
        let available = self.resolve(name).is_ok();
        debug!("{} available: {}", name, available);
        available
    }
}

/// Status of required and optional dependencies
#[derive(Debug, Clone)]
pub struct DependencyStatus {
    pub found: Vec<(String, Option<PathBuf>)>,
}

impl DependencyStatus {
    /// Check all dependencies
    pub fn check(tools_dir: &Path) -> Self {
        let found = REQUIRED_TOOLS
            .iter()
            .chain(OPTIONAL_TOOLS.iter())
            .map(|name| (name.to_string(), locate_dependency(name, tools_dir)))
            .collect();
        Self { found }
    }

    /// Whether every required tool was found
    pub fn ready(&self) -> bool {
        self.found
            .iter()
            .filter(|(name, _)| REQUIRED_TOOLS.contains(&name.as_str()))
            .all(|(_, path)| path.is_some())
    }
}
