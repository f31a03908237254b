use crate::layout::{Composition, TextLayer};
use crate::pipeline::RenderRequest;

/// Quote-escape text for a drawtext value
pub fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

fn drawtext(input: &str, output: &str, layer: &TextLayer, font_path: Option<&str>) -> String {
    let style = &layer.style;
    let mut filter = format!(
        "[{}]drawtext=text='{}':fontcolor={}:fontsize={}:{}",
        input,
        escape_text(&layer.text),
        style.color,
        style.font_size,
        layer.position
    );
    if let Some(spacing) = style.line_spacing {
        filter.push_str(&format!(":line_spacing={}", spacing));
    }
    if let Some(background) = &style.background {
        filter.push_str(&format!(
            ":box=1:boxcolor={}:boxborderw={}",
            background.color, background.border
        ));
    }
    if let Some(font) = font_path {
        filter.push_str(&format!(":fontfile='{}'", escape_text(font)));
    }
    filter.push_str(&format!("[{}]", output));
    filter
}

/// Build the filter graph for one clip and return it with its output label.
///
/// Blurred full-canvas background, the scaled source on top at the overlay
/// position, then one drawtext per text layer in drawing order.
pub fn build_filter_graph(composition: &Composition) -> (String, String) {
    let canvas = composition.canvas;
    let overlay = composition.overlay;
    let mut statements = vec![
        format!(
            "[0:v]scale={}:{},gblur=sigma=30[bg]",
            canvas.width, canvas.height
        ),
        format!(
            "[0:v]scale={}:{}[fg]",
            overlay.target_width, overlay.target_height
        ),
        format!("[bg][fg]overlay={}:{}[base]", overlay.x, overlay.y),
    ];

    let mut label = "base".to_string();
    for text in &composition.texts {
        let next = format!("v_{}", text.layer);
        statements.push(drawtext(
            &label,
            &next,
            text,
            composition.font_path.as_deref(),
        ));
        label = next;
    }
    (statements.join(";"), label)
}

/// Build FFmpeg arguments for cutting and encoding one clip
pub fn build_render_args(request: &RenderRequest) -> Vec<String> {
    let (graph, label) = build_filter_graph(&request.composition);
    vec![
        "-y".to_string(),
        "-nostdin".to_string(),
        "-ss".to_string(),
        request.start.to_string(),
        "-to".to_string(),
        request.end.to_string(),
        "-i".to_string(),
        request.source.to_string_lossy().to_string(),
        "-filter_complex".to_string(),
        graph,
        "-map".to_string(),
        format!("[{}]", label),
        "-map".to_string(),
        "0:a?".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        request.encode.preset.clone(),
        "-crf".to_string(),
        request.encode.crf.to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "128k".to_string(),
        request.output.to_string_lossy().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutState, PublicationSettings, RenderingSettings};
    use crate::layout::compose_clip;
    use crate::pipeline::EncodeParams;
    use crate::queue::ClipTiming;
    use std::path::PathBuf;

    fn request(rendering: &RenderingSettings) -> RenderRequest {
        let clip = ClipTiming::new(0, 0.0, 120.5);
        RenderRequest {
            source: PathBuf::from("/w/downloads/job_a/talk.mp4"),
            start: clip.start,
            end: clip.end,
            composition: compose_clip(
                &LayoutState::default(),
                rendering,
                &PublicationSettings::default(),
                "https://example.com/watch?v=1",
                &clip,
                2,
            ),
            encode: EncodeParams {
                crf: 18,
                preset: "medium".to_string(),
            },
            output: PathBuf::from("/w/clips/job_a/clip_000.mp4"),
        }
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("it's"), "it\\'s");
        assert_eq!(escape_text("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_filter_graph_chains_labels() {
        let rendering = RenderingSettings::default();
        let (graph, label) = build_filter_graph(&request(&rendering).composition);
        let statements: Vec<&str> = graph.split(';').collect();

        assert_eq!(statements[0], "[0:v]scale=1080:1920,gblur=sigma=30[bg]");
        assert_eq!(statements[1], "[0:v]scale=1210:681[fg]");
        assert_eq!(statements[2], "[bg][fg]overlay=-65:619[base]");
        assert!(statements[3].starts_with("[base]drawtext=text='Part 1'"));
        assert!(statements[3].ends_with("[v_part_label]"));
        assert!(statements[4].starts_with("[v_part_label]drawtext="));
        assert!(statements[5].contains("text='Clip 1/2'"));
        assert_eq!(label, "v_queue_label");
    }

    #[test]
    fn test_title_uses_font_and_spacing() {
        let rendering = RenderingSettings {
            title: "Rust's day".to_string(),
            font_path: Some("/fonts/Inter.ttf".to_string()),
            ..RenderingSettings::default()
        };
        let (graph, _) = build_filter_graph(&request(&rendering).composition);
        let title = graph.split(';').nth(3).unwrap();
        assert_eq!(
            title,
            "[base]drawtext=text='Rust\\'s day':fontcolor=white:fontsize=56:\
             x=540 - text_w/2:y=140 - text_h/2:line_spacing=6:\
             fontfile='/fonts/Inter.ttf'[v_title]"
        );
    }

    #[test]
    fn test_render_args() {
        let args = build_render_args(&request(&RenderingSettings::default()));
        let position = |flag: &str| args.iter().position(|a| a == flag).unwrap();

        assert_eq!(args[position("-ss") + 1], "0");
        assert_eq!(args[position("-to") + 1], "120.5");
        assert_eq!(args[position("-c:v") + 1], "libx264");
        assert_eq!(args[position("-crf") + 1], "18");
        assert_eq!(args[position("-b:a") + 1], "128k");
        assert!(args.contains(&"[v_queue_label]".to_string()));
        assert_eq!(args.last().unwrap(), "/w/clips/job_a/clip_000.mp4");
    }
}
