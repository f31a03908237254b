pub mod events;
pub mod job;
pub mod registry;
pub mod worker;

pub use events::{ChannelObserver, EventEmitter, ProgressEvent, ProgressObserver};
pub use job::{ClipTiming, JobDirectories, JobStage, VideoJob};
pub use registry::WorkspaceRegistry;
pub use worker::{ControllerOptions, STOPPED_BEFORE_START, WorkspaceController};

#[cfg(test)]
pub(crate) use job::test_job;
