use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingSettings {
    /// Title burned into every clip (empty = none)
    pub title: String,
    /// Font file for text layers
    pub font_path: Option<String>,
    /// Target clip length in seconds
    pub clip_duration: i64,
    /// Seconds shared between consecutive clips
    pub clip_overlap: i64,
    pub final_clip_min: i64,
    pub final_clip_max: i64,
    /// x264 CRF (0-51, lower = better)
    pub crf: u8,
    pub x264_preset: String,
    pub show_part_label: bool,
    /// Run the transcription stage when a transcriber is available
    pub transcribe: bool,
}

impl Default for RenderingSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            font_path: None,
            clip_duration: 120,
            clip_overlap: 0,
            final_clip_min: 120,
            final_clip_max: 240,
            crf: 18,
            x264_preset: "medium".to_string(),
            show_part_label: true,
            transcribe: true,
        }
    }
}

/// Base interval between two publications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishInterval {
    pub seconds: i64,
}

impl PublishInterval {
    pub fn from_minutes(minutes: f64) -> Self {
        Self {
            seconds: (minutes * 60.0).max(0.0) as i64,
        }
    }

    pub fn as_minutes(&self) -> f64 {
        self.seconds as f64 / 60.0
    }
}

impl Default for PublishInterval {
    fn default() -> Self {
        Self::from_minutes(20.0)
    }
}

impl fmt::Display for PublishInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.as_minutes();
        if minutes.fract() == 0.0 {
            write!(f, "{} min", minutes as i64)
        } else {
            write!(f, "{:.1} min", minutes)
        }
    }
}

/// Publication configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationSettings {
    /// Base interval, stored in seconds
    pub publish_interval: PublishInterval,
    pub randomize_interval: bool,
    pub randomization_range_seconds: i64,
    pub part_label_prefix: String,
    /// Token handed to the publisher
    pub access_token: String,
}

impl Default for PublicationSettings {
    fn default() -> Self {
        Self {
            publish_interval: PublishInterval::default(),
            randomize_interval: false,
            randomization_range_seconds: 120,
            part_label_prefix: "Part".to_string(),
            access_token: String::new(),
        }
    }
}
