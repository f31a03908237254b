use super::job::{JobStage, VideoJob};
use chrono::{DateTime, Utc};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Receives every job transition and progress notice
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, job: &VideoJob, stage: JobStage, message: &str);
}

impl<F> ProgressObserver for F
where
    F: Fn(&VideoJob, JobStage, &str) + Send + Sync,
{
    fn on_event(&self, job: &VideoJob, stage: JobStage, message: &str) {
        self(job, stage, message)
    }
}

/// Owned copy of one emitted event
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub job: VideoJob,
    pub stage: JobStage,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Forwards events over a channel so a UI thread can drain them in batches
pub struct ChannelObserver {
    tx: Mutex<Sender<ProgressEvent>>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self { tx: Mutex::new(tx) }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_event(&self, job: &VideoJob, stage: JobStage, message: &str) {
        let event = ProgressEvent {
            job: job.clone(),
            stage,
            message: message.to_string(),
            at: Utc::now(),
        };
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(event);
        }
    }
}

/// Serialises observer calls across every workspace worker sharing `lock`.
#[derive(Clone)]
pub struct EventEmitter {
    observer: Arc<dyn ProgressObserver>,
    lock: Arc<Mutex<()>>,
}

impl EventEmitter {
    pub fn new(observer: Arc<dyn ProgressObserver>) -> Self {
        Self::with_lock(observer, Arc::new(Mutex::new(())))
    }

    pub fn with_lock(observer: Arc<dyn ProgressObserver>, lock: Arc<Mutex<()>>) -> Self {
        Self { observer, lock }
    }

    pub fn emit(&self, job: &VideoJob, stage: JobStage, message: &str) {
        // A poisoned lock only means another observer call panicked
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let result = catch_unwind(AssertUnwindSafe(|| {
            self.observer.on_event(job, stage, message)
        }));
        if result.is_err() {
            warn!(
                "Progress observer panicked on job {} ({:?})",
                job.identifier, stage
            );
        }
    }

    /// Notice within the job's current stage; not a transition
    pub fn notice(&self, job: &VideoJob, message: &str) {
        self.emit(job, job.stage(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::job::test_job;
    use std::path::Path;
    use std::sync::mpsc;

    #[test]
    fn test_channel_observer_preserves_order() {
        let (tx, rx) = mpsc::channel();
        let emitter = EventEmitter::new(Arc::new(ChannelObserver::new(tx)));
        let job = test_job(Path::new("/tmp/clipper"));

        emitter.emit(&job, JobStage::Queued, "queued");
        emitter.emit(&job, JobStage::Downloading, "downloading");
        emitter.notice(&job, "still queued");

        let messages: Vec<String> = rx.try_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["queued", "downloading", "still queued"]);
    }

    struct PanickingObserver;

    impl ProgressObserver for PanickingObserver {
        fn on_event(&self, _job: &VideoJob, _stage: JobStage, _message: &str) {
            panic!("observer bug");
        }
    }

    #[test]
    fn test_panicking_observer_is_contained() {
        let emitter = EventEmitter::new(Arc::new(PanickingObserver));
        let job = test_job(Path::new("/tmp/clipper"));

        emitter.emit(&job, JobStage::Queued, "queued");
        emitter.emit(&job, JobStage::Queued, "again");
    }
}
