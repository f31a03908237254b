use super::run_tool;
use crate::error::{AppError, AppResult};
use crate::pipeline::Transcriber;
use crate::utils::ToolLocator;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info};

pub const WHISPER_MODEL: &str = "small";

/// Writes SRT subtitles with the whisper CLI when it is installed
pub struct WhisperTranscriber {
    tools: Arc<ToolLocator>,
}

impl WhisperTranscriber {
    pub fn new(tools: Arc<ToolLocator>) -> Self {
        Self { tools }
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, file: &Path, output_dir: &Path) -> AppResult<Option<PathBuf>> {
        let whisper = match self.tools.resolve("whisper") {
            Ok(path) => path,
            Err(e) if e.is_dependency_unavailable() => {
                debug!("Skipping transcription: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        std::fs::create_dir_all(output_dir)?;

        info!("Transcribing {}", file.display());
        run_tool(
            Command::new(&whisper)
                .arg(file)
                .args(["--model", WHISPER_MODEL, "--output_format", "srt"])
                .arg("--output_dir")
                .arg(output_dir),
            "whisper",
            self.tools.tools_dir(),
            AppError::Transcription,
        )?;

        let srt = subtitle_path(file, output_dir);
        if !srt.is_file() {
            return Err(AppError::Transcription(format!(
                "whisper wrote no subtitles for {}",
                file.display()
            )));
        }
        Ok(Some(srt))
    }
}

/// `<output_dir>/<source stem>.srt`
pub fn subtitle_path(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "subtitles".to_string());
    output_dir.join(format!("{}.srt", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtitle_path_uses_source_stem() {
        assert_eq!(
            subtitle_path(Path::new("/dl/My_Talk.webm"), Path::new("/clips")),
            PathBuf::from("/clips/My_Talk.srt")
        );
    }

    #[test]
    fn test_missing_whisper_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        // Only meaningful where whisper is not installed
        if which::which("whisper").is_ok() {
            return;
        }
        let transcriber = WhisperTranscriber::new(Arc::new(ToolLocator::new(tmp.path())));
        let result = transcriber
            .transcribe(&tmp.path().join("a.mp4"), tmp.path())
            .unwrap();
        assert!(result.is_none());
    }
}
