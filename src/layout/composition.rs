//! Per-clip composition parameters handed to the render engine.

use super::geometry::{OverlayGeometry, TextPosition, compute_overlay, text_position};
use crate::config::{Canvas, LayerName, LayoutState, PublicationSettings, RenderingSettings};
use crate::queue::ClipTiming;

/// Box drawn behind a text layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBox {
    pub color: &'static str,
    pub border: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    pub font_size: u32,
    pub color: &'static str,
    pub line_spacing: Option<u32>,
    pub background: Option<TextBox>,
}

impl TextStyle {
    fn for_layer(layer: LayerName) -> Self {
        match layer {
            LayerName::Title => Self {
                font_size: 56,
                color: "white",
                line_spacing: Some(6),
                background: None,
            },
            LayerName::PartLabel => Self {
                font_size: 44,
                color: "white",
                line_spacing: None,
                background: Some(TextBox {
                    color: "#00000066",
                    border: 18,
                }),
            },
            LayerName::LinkLabel => Self {
                font_size: 32,
                color: "#e2e8f0",
                line_spacing: None,
                background: Some(TextBox {
                    color: "#020617aa",
                    border: 12,
                }),
            },
            LayerName::QueueLabel => Self {
                font_size: 26,
                color: "#94a3b8",
                line_spacing: None,
                background: Some(TextBox {
                    color: "#020617aa",
                    border: 10,
                }),
            },
            LayerName::Subtitles | LayerName::VideoMain => Self {
                font_size: 48,
                color: "white",
                line_spacing: None,
                background: None,
            },
        }
    }
}

/// One text element drawn over the video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLayer {
    pub layer: LayerName,
    pub text: String,
    pub position: TextPosition,
    pub style: TextStyle,
}

/// Everything the render engine needs to lay out one clip
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub canvas: Canvas,
    pub overlay: OverlayGeometry,
    pub font_path: Option<String>,
    /// In drawing order
    pub texts: Vec<TextLayer>,
}

/// Build the composition for `clip`, one of `total_clips` cut from `source_url`
pub fn compose_clip(
    layout: &LayoutState,
    rendering: &RenderingSettings,
    publication: &PublicationSettings,
    source_url: &str,
    clip: &ClipTiming,
    total_clips: usize,
) -> Composition {
    let layers = &layout.layers;
    let mut texts = Vec::new();
    let mut push = |layer: LayerName, text: String| {
        texts.push(TextLayer {
            layer,
            text,
            position: text_position(layers.get(layer)),
            style: TextStyle::for_layer(layer),
        });
    };

    if !rendering.title.is_empty() && layers.title.visible {
        push(LayerName::Title, rendering.title.clone());
    }
    if rendering.show_part_label && layers.part_label.visible {
        push(
            LayerName::PartLabel,
            format!("{} {}", publication.part_label_prefix, clip.number()),
        );
    }
    if layers.link_label.visible {
        push(LayerName::LinkLabel, source_url.to_string());
    }
    if layers.queue_label.visible && total_clips > 0 {
        push(
            LayerName::QueueLabel,
            format!("Clip {}/{}", clip.number(), total_clips),
        );
    }

    Composition {
        canvas: layout.canvas,
        overlay: compute_overlay(&layers.video_main, layout.canvas),
        font_path: rendering.font_path.clone(),
        texts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(composition: &Composition) -> Vec<LayerName> {
        composition.texts.iter().map(|t| t.layer).collect()
    }

    #[test]
    fn test_default_layers_without_title() {
        let layout = LayoutState::default();
        let clip = ClipTiming::new(1, 120.0, 240.0);
        let composition = compose_clip(
            &layout,
            &RenderingSettings::default(),
            &PublicationSettings::default(),
            "https://example.com/watch?v=1",
            &clip,
            3,
        );

        assert_eq!(
            names(&composition),
            vec![LayerName::PartLabel, LayerName::LinkLabel, LayerName::QueueLabel]
        );
        assert_eq!(composition.texts[0].text, "Part 2");
        assert_eq!(composition.texts[2].text, "Clip 2/3");
        assert_eq!(composition.overlay.target_width, 1210);
    }

    #[test]
    fn test_hidden_layers_and_title() {
        let mut layout = LayoutState::default();
        layout.layers.link_label.visible = false;
        layout.layers.queue_label.visible = false;
        let rendering = RenderingSettings {
            title: "Keynote".to_string(),
            show_part_label: false,
            font_path: Some("/fonts/Inter.ttf".to_string()),
            ..RenderingSettings::default()
        };

        let composition = compose_clip(
            &layout,
            &rendering,
            &PublicationSettings::default(),
            "u",
            &ClipTiming::new(0, 0.0, 10.0),
            1,
        );
        assert_eq!(names(&composition), vec![LayerName::Title]);
        assert_eq!(composition.texts[0].style.font_size, 56);
        assert_eq!(composition.font_path.as_deref(), Some("/fonts/Inter.ttf"));
    }
}
