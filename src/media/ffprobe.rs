use super::run_tool;
use crate::error::{AppError, AppResult};
use crate::pipeline::DurationProbe;
use crate::utils::ToolLocator;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

/// Reads the container duration with ffprobe
pub struct FfprobeProbe {
    tools: Arc<ToolLocator>,
}

impl FfprobeProbe {
    pub fn new(tools: Arc<ToolLocator>) -> Self {
        Self { tools }
    }
}

impl DurationProbe for FfprobeProbe {
    fn probe(&self, file: &Path) -> AppResult<f64> {
        let ffprobe = self.tools.resolve("ffprobe")?;
        let output = run_tool(
            Command::new(&ffprobe)
                .args([
                    "-v",
                    "error",
                    "-select_streams",
                    "v:0",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "json",
                ])
                .arg(file),
            "ffprobe",
            self.tools.tools_dir(),
            AppError::Probe,
        )?;
        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract `format.duration` from ffprobe's JSON output
pub fn parse_duration(json: &str) -> AppResult<f64> {
    let data: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| AppError::Probe(format!("Failed to parse ffprobe output: {}", e)))?;

    data.format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .ok_or_else(|| AppError::Probe("ffprobe reported no duration".to_string()))
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        let json = r#"{"programs": [], "format": {"duration": "263.480000"}}"#;
        assert_eq!(parse_duration(json).unwrap(), 263.48);
    }

    #[test]
    fn test_missing_or_bad_duration() {
        assert!(matches!(parse_duration("{}"), Err(AppError::Probe(_))));
        assert!(parse_duration(r#"{"format": {"duration": "N/A"}}"#).is_err());
        assert!(parse_duration("not json").is_err());
    }
}
