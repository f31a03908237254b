pub mod deps;
pub mod disk_space;
pub mod humanize;
pub mod logger;

pub use deps::{DependencyStatus, ToolLocator, locate_dependency};
pub use disk_space::{LOW_SPACE_BYTES, low_space};
pub use humanize::{format_duration, format_file_size};
pub use logger::init_logging;
