pub mod layout;
pub mod types;
pub mod workspace;

pub use layout::{
    Anchor, AxisAlign, Canvas, FitMode, LayerName, LayerPlacement, LayerSet, LayoutState,
    VideoLayer,
};
pub use types::*;
pub use workspace::{
    WorkspaceDirectories, create_workspace_directories, list_workspace_ids, next_workspace_id,
};

use crate::error::{AppError, AppResult};
use crate::pipeline::{LayoutStore, SettingsStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the data root
pub const HOME_ENV: &str = "CLIPPER_HOME";

/// Rendering and publication parameters of one workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub rendering: RenderingSettings,
    pub publication: PublicationSettings,
}

impl WorkspaceSettings {
    /// Load from a TOML file, creating it with defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match Self::load_from_file(path) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => {
                    warn!("Failed to load settings: {}. Using defaults.", e);
                    return Self::default();
                }
            }
        }

        let settings = Self::default();
        // Save default settings for future editing
        if let Err(e) = settings.save(path) {
            warn!("Failed to save default settings: {}", e);
        }
        settings
    }

    pub fn load_from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read settings file: {}", e)))?;
        let settings: WorkspaceSettings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)
            .map_err(|e| AppError::Config(format!("Failed to write settings file: {}", e)))?;

        info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        let r = &self.rendering;
        if r.crf > 51 {
            return Err(AppError::Config("CRF must be between 0 and 51".to_string()));
        }
        if r.clip_duration <= 0 {
            return Err(AppError::Config(
                "Clip duration must be at least one second".to_string(),
            ));
        }
        if r.final_clip_max < r.final_clip_min {
            return Err(AppError::Config(
                "Final clip maximum must not be below the minimum".to_string(),
            ));
        }
        if r.x264_preset.trim().is_empty() {
            return Err(AppError::Config("x264 preset must not be empty".to_string()));
        }
        Ok(())
    }
}

/// On-disk layout of the application data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$CLIPPER_HOME`, else the platform data dir
    pub fn from_env() -> Self {
        let root = std::env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::data_local_dir().map(|d| d.join("clipper-studio")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir().join("settings.toml")
    }

    pub fn workspace_settings_file(&self, workspace_id: u32) -> PathBuf {
        self.config_dir()
            .join(format!("{}.toml", workspace::workspace_dir_name(workspace_id)))
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.config_dir().join("layouts")
    }

    pub fn layout_file(&self, workspace_id: u32) -> PathBuf {
        self.layouts_dir()
            .join(format!("{}.json", workspace::workspace_dir_name(workspace_id)))
    }

    pub fn workspaces_dir(&self) -> PathBuf {
        self.root.join("workspaces")
    }

    pub fn workspace_dirs(&self, workspace_id: u32) -> WorkspaceDirectories {
        WorkspaceDirectories::under(
            self.workspaces_dir()
                .join(workspace::workspace_dir_name(workspace_id)),
        )
    }

    /// Fallback location for external tools not on `PATH`
    pub fn tools_dir(&self) -> PathBuf {
        self.root.join("tools")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn workspace_ids(&self) -> AppResult<Vec<u32>> {
        list_workspace_ids(&self.workspaces_dir(), &self.layouts_dir())
    }
}

/// Settings and layouts read from the data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: AppPaths,
}

impl FileStore {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn save_layout(&self, workspace_id: u32, layout: &LayoutState) -> AppResult<()> {
        layout.save(&self.paths.layout_file(workspace_id))
    }

    pub fn reset_layout(&self, workspace_id: u32) -> AppResult<LayoutState> {
        let layout = LayoutState::default();
        self.save_layout(workspace_id, &layout)?;
        Ok(layout)
    }

    /// Copy the layout of `source` over the layout of `target`
    pub fn duplicate_layout(&self, source: u32, target: u32) -> AppResult<LayoutState> {
        let layout = LayoutState::load_or_default(&self.paths.layout_file(source));
        self.save_layout(target, &layout)?;
        Ok(layout)
    }
}

impl SettingsStore for FileStore {
    /// Per-workspace file first, then the shared settings file
    fn load_settings(&self, workspace_id: u32) -> AppResult<WorkspaceSettings> {
        let own = self.paths.workspace_settings_file(workspace_id);
        if own.exists() {
            return WorkspaceSettings::load_from_file(&own);
        }
        Ok(WorkspaceSettings::load_or_default(&self.paths.settings_file()))
    }
}

impl LayoutStore for FileStore {
    fn load_layout(&self, workspace_id: u32) -> AppResult<LayoutState> {
        Ok(LayoutState::load_or_default(
            &self.paths.layout_file(workspace_id),
        ))
    }
}
