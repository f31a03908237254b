//! Pixel placement of layers on the output canvas.

use crate::config::{Anchor, AxisAlign, Canvas, FitMode, LayerPlacement, VideoLayer};
use std::fmt;

/// Axis-aligned box in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Size and top-left corner of the main video overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayGeometry {
    pub target_width: i64,
    pub target_height: i64,
    pub x: i64,
    pub y: i64,
}

fn round(value: f64) -> i64 {
    value.round_ties_even() as i64
}

fn align_offset(align: AxisAlign, extent: i64) -> i64 {
    match align {
        AxisAlign::Start => 0,
        AxisAlign::Middle => (-extent).div_euclid(2),
        AxisAlign::End => -extent,
    }
}

/// Offset from the stored coordinate to the box's top-left corner
pub fn anchor_offset(anchor: Anchor, width: i64, height: i64) -> (i64, i64) {
    (
        align_offset(anchor.horizontal(), width),
        align_offset(anchor.vertical(), height),
    )
}

/// Box of a `width` x `height` element placed by `layer`
pub fn place_layer(layer: &LayerPlacement, width: i64, height: i64) -> Rect {
    let (ox, oy) = anchor_offset(layer.anchor, width, height);
    Rect {
        x: round(layer.x + ox as f64),
        y: round(layer.y + oy as f64),
        width,
        height,
    }
}

/// Size of the main video for its zoom and fit mode, keeping 16:9
pub fn video_target_size(video: &VideoLayer, canvas: Canvas) -> (i64, i64) {
    match video.fit {
        FitMode::Height => {
            let height = round(canvas.height as f64 * video.scale).max(1);
            let width = round(height as f64 * 16.0 / 9.0).max(1);
            (width, height)
        }
        FitMode::Width => {
            let width = round(canvas.width as f64 * video.scale).max(1);
            let height = round(width as f64 * 9.0 / 16.0).max(1);
            (width, height)
        }
    }
}

/// Keep an overlay edge inside the range that leaves no gap.
///
/// The range is `[min(0, canvas - target), max(0, canvas - target)]`, which
/// works for overlays both smaller and larger than the canvas.
pub fn clamp_overlay(value: i64, canvas_extent: i64, target_extent: i64) -> i64 {
    let slack = canvas_extent - target_extent;
    value.clamp(slack.min(0), slack.max(0))
}

pub fn compute_overlay(video: &VideoLayer, canvas: Canvas) -> OverlayGeometry {
    let (target_width, target_height) = video_target_size(video, canvas);
    let placed = place_layer(&video.placement, target_width, target_height);
    OverlayGeometry {
        target_width,
        target_height,
        x: clamp_overlay(placed.x, canvas.width as i64, target_width),
        y: clamp_overlay(placed.y, canvas.height as i64, target_height),
    }
}

/// How much of the rendered text extent is subtracted on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextShift {
    None,
    Half,
    Full,
}

impl From<AxisAlign> for TextShift {
    fn from(align: AxisAlign) -> Self {
        match align {
            AxisAlign::Start => TextShift::None,
            AxisAlign::Middle => TextShift::Half,
            AxisAlign::End => TextShift::Full,
        }
    }
}

/// A stored coordinate plus the share of text size to subtract.
///
/// Text size is only known to the renderer, so position stays symbolic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPosition {
    pub value: i64,
    pub shift: TextShift,
}

impl AxisPosition {
    pub fn resolve(&self, extent: i64) -> i64 {
        match self.shift {
            TextShift::None => self.value,
            TextShift::Half => self.value - extent / 2,
            TextShift::Full => self.value - extent,
        }
    }

    /// Render as an expression over `extent_var` (e.g. `text_w`)
    pub fn expression(&self, extent_var: &str) -> String {
        match self.shift {
            TextShift::None => self.value.to_string(),
            TextShift::Half => format!("{} - {}/2", self.value, extent_var),
            TextShift::Full => format!("{} - {}", self.value, extent_var),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub x: AxisPosition,
    pub y: AxisPosition,
}

impl TextPosition {
    pub fn resolve(&self, text_width: i64, text_height: i64) -> (i64, i64) {
        (self.x.resolve(text_width), self.y.resolve(text_height))
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={}:y={}",
            self.x.expression("text_w"),
            self.y.expression("text_h")
        )
    }
}

/// Position of a text layer; x follows the horizontal anchor, y the vertical one
pub fn text_position(layer: &LayerPlacement) -> TextPosition {
    TextPosition {
        x: AxisPosition {
            value: round(layer.x),
            shift: layer.anchor.horizontal().into(),
        },
        y: AxisPosition {
            value: round(layer.y),
            shift: layer.anchor.vertical().into(),
        },
    }
}
