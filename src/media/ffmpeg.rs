use super::command_builder::build_render_args;
use super::run_tool;
use crate::error::{AppError, AppResult};
use crate::pipeline::{RenderEngine, RenderRequest};
use crate::utils::ToolLocator;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use tracing::info;

/// Cuts, composites and encodes clips with ffmpeg
pub struct FfmpegRenderer {
    tools: Arc<ToolLocator>,
}

impl FfmpegRenderer {
    pub fn new(tools: Arc<ToolLocator>) -> Self {
        Self { tools }
    }
}

impl RenderEngine for FfmpegRenderer {
    fn render(&self, request: &RenderRequest) -> AppResult<PathBuf> {
        let ffmpeg = self.tools.resolve("ffmpeg")?;
        if let Some(parent) = request.output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(
            "Rendering {} [{:.1}s - {:.1}s] -> {}",
            request.source.display(),
            request.start,
            request.end,
            request.output.display()
        );
        let result = run_tool(
            Command::new(&ffmpeg).args(build_render_args(request)),
            "ffmpeg",
            self.tools.tools_dir(),
            AppError::Render,
        );
        if let Err(e) = result {
            let _ = std::fs::remove_file(&request.output);
            return Err(e);
        }

        if !request.output.is_file() {
            return Err(AppError::Render(format!(
                "ffmpeg produced no output at {}",
                request.output.display()
            )));
        }
        Ok(request.output.clone())
    }
}
