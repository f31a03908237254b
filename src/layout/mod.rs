pub mod composition;
pub mod geometry;

pub use composition::{Composition, TextBox, TextLayer, TextStyle, compose_clip};
pub use geometry::{
    AxisPosition, OverlayGeometry, Rect, TextPosition, TextShift, anchor_offset, clamp_overlay,
    compute_overlay, place_layer, text_position, video_target_size,
};
