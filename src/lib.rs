//! Turns long videos into scheduled vertical clips, one serial queue per workspace.

pub mod config;
pub mod error;
pub mod layout;
pub mod media;
pub mod pipeline;
pub mod queue;
pub mod schedule;
pub mod utils;

pub use error::{AppError, AppResult};
