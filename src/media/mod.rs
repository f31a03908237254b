pub mod command_builder;
pub mod ffmpeg;
pub mod ffprobe;
pub mod publisher;
pub mod whisper;
pub mod ytdlp;

pub use command_builder::{build_filter_graph, build_render_args, escape_text};
pub use ffmpeg::FfmpegRenderer;
pub use ffprobe::{FfprobeProbe, parse_duration};
pub use publisher::{ArchivePublisher, receipt_path};
pub use whisper::WhisperTranscriber;
pub use ytdlp::{YtDlpDownloader, newest_file};

use crate::error::{AppError, AppResult};
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Keep only the last `count` lines of tool output
fn tail(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().rev().take(count).collect();
    lines.into_iter().rev().collect::<Vec<_>>().join("\n")
}

/// Run an external tool to completion.
///
/// A binary that cannot be spawned because it does not exist is reported as
/// `DependencyUnavailable`; everything else goes through `fail`.
pub(crate) fn run_tool(
    command: &mut Command,
    tool: &str,
    tools_dir: &Path,
    fail: fn(String) -> AppError,
) -> AppResult<Output> {
    let output = command
        .stdin(Stdio::null())
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::dependency(tool, tools_dir),
            _ => fail(format!("Failed to start {}: {}", tool, e)),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            format!("{} exited with status: {}", tool, output.status)
        } else {
            format!("{} failed: {}", tool, tail(&stderr, 5))
        };
        return Err(fail(message));
    }
    Ok(output)
}
