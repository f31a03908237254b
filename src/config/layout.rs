//! Per-workspace visual layout and its JSON persistence.

use crate::error::AppResult;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_CANVAS_WIDTH: u32 = 1080;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1920;
pub const DEFAULT_VIDEO_SCALE: f64 = 1.12;
/// Zoom range accepted by the layout editor
pub const VIDEO_SCALE_RANGE: (f64, f64) = (0.8, 1.6);

/// Reference point a layer's stored coordinate refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Horizontal or vertical share of an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisAlign {
    Start,
    Middle,
    End,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::Center,
        Anchor::Top,
        Anchor::Bottom,
        Anchor::Left,
        Anchor::Right,
        Anchor::TopLeft,
        Anchor::TopRight,
        Anchor::BottomLeft,
        Anchor::BottomRight,
    ];

    /// Parse a stored anchor name; anything unknown falls back to centre
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "top" => Anchor::Top,
            "bottom" => Anchor::Bottom,
            "left" => Anchor::Left,
            "right" => Anchor::Right,
            "topleft" => Anchor::TopLeft,
            "topright" => Anchor::TopRight,
            "bottomleft" => Anchor::BottomLeft,
            "bottomright" => Anchor::BottomRight,
            _ => Anchor::Center,
        }
    }

    pub fn horizontal(self) -> AxisAlign {
        match self {
            Anchor::Left | Anchor::TopLeft | Anchor::BottomLeft => AxisAlign::Start,
            Anchor::Right | Anchor::TopRight | Anchor::BottomRight => AxisAlign::End,
            Anchor::Center | Anchor::Top | Anchor::Bottom => AxisAlign::Middle,
        }
    }

    pub fn vertical(self) -> AxisAlign {
        match self {
            Anchor::Top | Anchor::TopLeft | Anchor::TopRight => AxisAlign::Start,
            Anchor::Bottom | Anchor::BottomLeft | Anchor::BottomRight => AxisAlign::End,
            Anchor::Center | Anchor::Left | Anchor::Right => AxisAlign::Middle,
        }
    }
}

impl<'de> Deserialize<'de> for Anchor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Anchor::parse(&name))
    }
}

/// How the main video is sized against the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    #[default]
    Width,
    Height,
}

impl<'de> Deserialize<'de> for FitMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(match name.trim().to_lowercase().as_str() {
            "height" => FitMode::Height,
            _ => FitMode::Width,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerName {
    VideoMain,
    Title,
    Subtitles,
    PartLabel,
    LinkLabel,
    QueueLabel,
}

impl LayerName {
    pub const ALL: [LayerName; 6] = [
        LayerName::VideoMain,
        LayerName::Title,
        LayerName::Subtitles,
        LayerName::PartLabel,
        LayerName::LinkLabel,
        LayerName::QueueLabel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerName::VideoMain => "video_main",
            LayerName::Title => "title",
            LayerName::Subtitles => "subtitles",
            LayerName::PartLabel => "part_label",
            LayerName::LinkLabel => "link_label",
            LayerName::QueueLabel => "queue_label",
        }
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub safe_zones: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            safe_zones: false,
        }
    }
}

/// Placement of one layer in canvas pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerPlacement {
    pub x: f64,
    pub y: f64,
    pub anchor: Anchor,
    pub visible: bool,
    pub locked: bool,
}

impl LayerPlacement {
    fn at(x: f64, y: f64, anchor: Anchor) -> Self {
        Self {
            x,
            y,
            anchor,
            visible: true,
            locked: false,
        }
    }
}

/// The main video layer also carries zoom and fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoLayer {
    #[serde(flatten)]
    pub placement: LayerPlacement,
    pub scale: f64,
    pub fit: FitMode,
}

/// One entry for every known layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerSet {
    pub video_main: VideoLayer,
    pub title: LayerPlacement,
    pub subtitles: LayerPlacement,
    pub part_label: LayerPlacement,
    pub link_label: LayerPlacement,
    pub queue_label: LayerPlacement,
}

impl LayerSet {
    pub fn defaults_for(canvas: Canvas) -> Self {
        let w = canvas.width as f64;
        let h = canvas.height as f64;
        Self {
            video_main: VideoLayer {
                placement: LayerPlacement::at(w / 2.0, h / 2.0, Anchor::Center),
                scale: DEFAULT_VIDEO_SCALE,
                fit: FitMode::Width,
            },
            title: LayerPlacement::at(w / 2.0, 140.0, Anchor::Center),
            subtitles: LayerPlacement::at(w / 2.0, h - 740.0, Anchor::Center),
            part_label: LayerPlacement::at(w / 2.0, h - 100.0, Anchor::Center),
            link_label: LayerPlacement::at(60.0, h - 180.0, Anchor::TopLeft),
            queue_label: LayerPlacement::at(60.0, h - 140.0, Anchor::TopLeft),
        }
    }

    pub fn get(&self, name: LayerName) -> &LayerPlacement {
        match name {
            LayerName::VideoMain => &self.video_main.placement,
            LayerName::Title => &self.title,
            LayerName::Subtitles => &self.subtitles,
            LayerName::PartLabel => &self.part_label,
            LayerName::LinkLabel => &self.link_label,
            LayerName::QueueLabel => &self.queue_label,
        }
    }

    pub fn get_mut(&mut self, name: LayerName) -> &mut LayerPlacement {
        match name {
            LayerName::VideoMain => &mut self.video_main.placement,
            LayerName::Title => &mut self.title,
            LayerName::Subtitles => &mut self.subtitles,
            LayerName::PartLabel => &mut self.part_label,
            LayerName::LinkLabel => &mut self.link_label,
            LayerName::QueueLabel => &mut self.queue_label,
        }
    }
}

/// Visual configuration of one workspace.
///
/// Render passes work on an owned copy so edits made while a job runs only
/// affect the next job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutState {
    pub canvas: Canvas,
    pub layers: LayerSet,
}

impl Default for LayoutState {
    fn default() -> Self {
        let canvas = Canvas::default();
        Self {
            canvas,
            layers: LayerSet::defaults_for(canvas),
        }
    }
}

impl LayoutState {
    /// Parse a stored layout, filling every missing field from the defaults
    pub fn from_json(json: &str) -> AppResult<Self> {
        let raw: RawLayout = serde_json::from_str(json)?;
        Ok(raw.into_layout())
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from `path`, writing the defaults when the file is missing or unreadable
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path)
                .map_err(Into::into)
                .and_then(|content| Self::from_json(&content))
            {
                Ok(layout) => return layout,
                Err(e) => warn!("Invalid layout {}: {}. Using defaults.", path.display(), e),
            }
        }

        let layout = Self::default();
        if let Err(e) = layout.save(path) {
            warn!("Failed to save default layout: {}", e);
        }
        layout
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        info!("Saved layout to {}", path.display());
        Ok(())
    }

    /// Set the video zoom, clamped to the editor range
    pub fn set_video_scale(&mut self, scale: f64) {
        let (min, max) = VIDEO_SCALE_RANGE;
        self.layers.video_main.scale = if scale.is_finite() {
            scale.clamp(min, max)
        } else {
            DEFAULT_VIDEO_SCALE
        };
    }

    /// Move a layer unless it is locked. Returns whether it moved.
    pub fn move_layer(&mut self, name: LayerName, x: f64, y: f64) -> bool {
        let layer = self.layers.get_mut(name);
        if layer.locked {
            return false;
        }
        layer.x = x;
        layer.y = y;
        true
    }
}

// On-disk shape, every field optional

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLayout {
    canvas: RawCanvas,
    layers: HashMap<String, RawLayer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCanvas {
    width: Option<u32>,
    height: Option<u32>,
    safe_zones: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLayer {
    x: Option<f64>,
    y: Option<f64>,
    anchor: Option<Anchor>,
    visible: Option<bool>,
    locked: Option<bool>,
    scale: Option<f64>,
    fit: Option<FitMode>,
}

impl RawLayer {
    fn merge_into(&self, placement: &mut LayerPlacement) {
        placement.x = self.x.unwrap_or(placement.x);
        placement.y = self.y.unwrap_or(placement.y);
        placement.anchor = self.anchor.unwrap_or(placement.anchor);
        placement.visible = self.visible.unwrap_or(placement.visible);
        placement.locked = self.locked.unwrap_or(placement.locked);
    }
}

impl RawLayout {
    fn into_layout(self) -> LayoutState {
        let defaults = Canvas::default();
        let canvas = Canvas {
            width: self.canvas.width.filter(|w| *w > 0).unwrap_or(defaults.width),
            height: self.canvas.height.filter(|h| *h > 0).unwrap_or(defaults.height),
            safe_zones: self.canvas.safe_zones.unwrap_or(defaults.safe_zones),
        };

        let mut layers = LayerSet::defaults_for(canvas);
        for name in LayerName::ALL {
            let Some(raw) = self.layers.get(name.as_str()) else {
                continue;
            };
            raw.merge_into(layers.get_mut(name));
            if name == LayerName::VideoMain {
                if let Some(scale) = raw.scale.filter(|s| s.is_finite() && *s > 0.0) {
                    layers.video_main.scale = scale;
                }
                layers.video_main.fit = raw.fit.unwrap_or(layers.video_main.fit);
            }
        }

        LayoutState { canvas, layers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_layout() {
        let layout = LayoutState::default();
        assert_eq!(layout.canvas.width, 1080);
        assert_eq!(layout.layers.video_main.placement.x, 540.0);
        assert_eq!(layout.layers.video_main.placement.y, 960.0);
        assert_eq!(layout.layers.subtitles.y, 1180.0);
        assert_eq!(layout.layers.part_label.y, 1820.0);
        assert_eq!(layout.layers.link_label.y, 1740.0);
        assert_eq!(layout.layers.queue_label.y, 1780.0);
        assert_eq!(layout.layers.queue_label.anchor, Anchor::TopLeft);
    }

    #[test]
    fn test_partial_layout_merges_onto_defaults() {
        let json = r#"{
            "canvas": {"width": 720},
            "layers": {
                "title": {"y": 300, "anchor": "bottomright"},
                "video_main": {"scale": 1.4, "fit": "height", "w": 999},
                "sticker": {"x": 1, "y": 2}
            }
        }"#;
        let layout = LayoutState::from_json(json).unwrap();
        assert_eq!(layout.canvas.width, 720);
        assert_eq!(layout.canvas.height, 1920);
        assert_eq!(layout.layers.title.x, 360.0);
        assert_eq!(layout.layers.title.y, 300.0);
        assert_eq!(layout.layers.title.anchor, Anchor::BottomRight);
        assert_eq!(layout.layers.video_main.scale, 1.4);
        assert_eq!(layout.layers.video_main.fit, FitMode::Height);
        assert!(layout.layers.link_label.visible);
    }

    #[test]
    fn test_unknown_anchor_and_fit_fall_back() {
        let json = r#"{"layers": {"video_main": {"anchor": "middle", "fit": "cover"}}}"#;
        let layout = LayoutState::from_json(json).unwrap();
        assert_eq!(layout.layers.video_main.placement.anchor, Anchor::Center);
        assert_eq!(layout.layers.video_main.fit, FitMode::Width);
    }

    #[test]
    fn test_json_round_trip_keeps_keys() {
        let layout = LayoutState::default();
        let json = layout.to_json().unwrap();
        assert!(json.contains("\"video_main\""));
        assert!(json.contains("\"topleft\""));
        assert_eq!(LayoutState::from_json(&json).unwrap(), layout);
    }

    #[test]
    fn test_malformed_file_falls_back_and_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layouts/workspace_3.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let layout = LayoutState::load_or_default(&path);
        assert_eq!(layout, LayoutState::default());
        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(LayoutState::from_json(&rewritten).is_ok());
    }

    #[test]
    fn test_scale_clamped_at_editing_boundary() {
        let mut layout = LayoutState::default();
        layout.set_video_scale(3.0);
        assert_eq!(layout.layers.video_main.scale, 1.6);
        layout.set_video_scale(0.1);
        assert_eq!(layout.layers.video_main.scale, 0.8);
    }

    #[test]
    fn test_locked_layer_does_not_move() {
        let mut layout = LayoutState::default();
        layout.layers.title.locked = true;
        assert!(!layout.move_layer(LayerName::Title, 10.0, 10.0));
        assert_eq!(layout.layers.title.y, 140.0);
        assert!(layout.move_layer(LayerName::PartLabel, 10.0, 20.0));
        assert_eq!(layout.layers.part_label.x, 10.0);
    }

    #[test]
    fn test_anchor_axis_components() {
        assert_eq!(Anchor::TopRight.horizontal(), AxisAlign::End);
        assert_eq!(Anchor::TopRight.vertical(), AxisAlign::Start);
        assert_eq!(Anchor::Left.vertical(), AxisAlign::Middle);
        assert_eq!(Anchor::parse("BottomLeft"), Anchor::BottomLeft);
    }
}
