use super::events::EventEmitter;
use super::job::{JobDirectories, JobStage, VideoJob};
use crate::config::WorkspaceDirectories;
use crate::error::{AppError, AppResult};
use crate::pipeline::{Collaborators, Pipeline, SettingsStore, cleanup_job};
use crate::schedule::{PublishScheduler, estimate_completion};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Failure message of jobs still queued when the workspace stops
pub const STOPPED_BEFORE_START: &str = "Workspace stopped before the job started";

/// Tuning for a workspace worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Longest the worker blocks on an empty queue before checking the stop flag
    pub poll_interval: Duration,
    /// How long `stop()` waits for the worker to exit
    pub stop_timeout: Duration,
    /// Fixed seed for publication delays; OS entropy when `None`
    pub rng_seed: Option<u64>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            stop_timeout: Duration::from_secs(2),
            rng_seed: None,
        }
    }
}

/// The queue and worker thread of one workspace.
///
/// Submissions may come from any thread; a single worker processes them one
/// at a time in submission order.
pub struct WorkspaceController {
    workspace_id: u32,
    directories: WorkspaceDirectories,
    queue: Sender<VideoJob>,
    stop_flag: Arc<AtomicBool>,
    active_job: Arc<Mutex<Option<String>>>,
    settings: Arc<dyn SettingsStore>,
    emitter: EventEmitter,
    options: ControllerOptions,
    handle: Mutex<Option<JoinHandle<()>>>,
    exited: Mutex<Option<Receiver<()>>>,
}

/// State owned by the worker thread
struct Worker {
    collaborators: Collaborators,
    settings: Arc<dyn SettingsStore>,
    emitter: EventEmitter,
    scheduler: PublishScheduler,
    stop_flag: Arc<AtomicBool>,
    active_job: Arc<Mutex<Option<String>>>,
    poll_interval: Duration,
}

impl WorkspaceController {
    /// Create the workspace directories and start its worker
    pub fn start(
        workspace_id: u32,
        directories: WorkspaceDirectories,
        collaborators: Collaborators,
        settings: Arc<dyn SettingsStore>,
        emitter: EventEmitter,
        options: ControllerOptions,
    ) -> AppResult<Self> {
        directories.ensure()?;

        let (queue, jobs) = mpsc::channel();
        let (exit_tx, exited) = mpsc::channel();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let active_job = Arc::new(Mutex::new(None));

        let worker = Worker {
            collaborators,
            settings: settings.clone(),
            emitter: emitter.clone(),
            scheduler: match options.rng_seed {
                Some(seed) => PublishScheduler::seeded(seed),
                None => PublishScheduler::from_os_rng(),
            },
            stop_flag: stop_flag.clone(),
            active_job: active_job.clone(),
            poll_interval: options.poll_interval,
        };
        let handle = thread::Builder::new()
            .name(format!("workspace-{}", workspace_id))
            .spawn(move || {
                worker.run(jobs);
                let _ = exit_tx.send(());
            })?;
        info!("Workspace {} worker started", workspace_id);

        Ok(Self {
            workspace_id,
            directories,
            queue,
            stop_flag,
            active_job,
            settings,
            emitter,
            options,
            handle: Mutex::new(Some(handle)),
            exited: Mutex::new(Some(exited)),
        })
    }

    pub fn workspace_id(&self) -> u32 {
        self.workspace_id
    }

    pub fn directories(&self) -> &WorkspaceDirectories {
        &self.directories
    }

    /// Queue `url` and return the new job without waiting for it
    pub fn submit(&self, url: &str) -> AppResult<VideoJob> {
        if self.stop_flag.load(Ordering::Relaxed) {
            return Err(AppError::WorkspaceStopped(self.workspace_id));
        }

        let identifier = Uuid::new_v4().simple().to_string();
        let job = VideoJob::new(
            self.workspace_id,
            identifier.clone(),
            url.trim().to_string(),
            self.job_directories(&identifier),
        );
        self.emitter.emit(&job, JobStage::Queued, "Queued");
        self.queue
            .send(job.clone())
            .map_err(|_| AppError::WorkspaceStopped(self.workspace_id))?;
        info!("Workspace {}: queued job {}", self.workspace_id, identifier);
        Ok(job)
    }

    fn job_directories(&self, identifier: &str) -> JobDirectories {
        let name = format!("job_{}", identifier);
        let dirs = &self.directories;
        JobDirectories {
            download: dirs.downloads.join(&name),
            processing: dirs.processing.join(&name),
            clips: dirs.clips.join(&name),
            published: dirs.published.join(&name),
            logs: dirs.logs.join(&name),
        }
    }

    /// Identifier of the job the worker is processing right now
    pub fn active_job_id(&self) -> Option<String> {
        self.active_job
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Time until every clip of `job` is published, with current settings
    pub fn estimate_completion(&self, job: &VideoJob) -> Option<String> {
        let base = self
            .settings
            .load_settings(self.workspace_id)
            .map(|s| s.publication.publish_interval.seconds)
            .unwrap_or_default();
        estimate_completion(&job.clip_plan, base)
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Ask the worker to exit after its current step and wait for it.
    ///
    /// Jobs still waiting in the queue are failed without running.
    ///
    /// If it is still inside a collaborator call when the timeout expires the
    /// thread is left to finish on its own.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        let Some(exited) = self
            .exited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        else {
            return;
        };

        match exited.recv_timeout(self.options.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
                if let Some(handle) = handle
                    && handle.join().is_err()
                {
                    error!("Workspace {} worker panicked", self.workspace_id);
                }
                info!("Workspace {} stopped", self.workspace_id);
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Workspace {} worker still busy after {:?}; detaching",
                    self.workspace_id, self.options.stop_timeout
                );
            }
        }
    }
}

impl Worker {
    fn run(mut self, jobs: Receiver<VideoJob>) {
        while !self.stop_flag.load(Ordering::Relaxed) {
            match jobs.recv_timeout(self.poll_interval) {
                Ok(job) => self.process(job),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        for mut job in jobs.try_iter() {
            self.fail(&mut job, STOPPED_BEFORE_START);
        }
    }

    fn set_active(&self, identifier: Option<String>) {
        *self.active_job.lock().unwrap_or_else(|e| e.into_inner()) = identifier;
    }

    /// Run one job to a terminal state. Nothing raised here reaches the loop.
    fn process(&mut self, mut job: VideoJob) {
        self.set_active(Some(job.identifier.clone()));

        let outcome = {
            let mut pipeline = Pipeline::new(
                &self.collaborators,
                self.settings.as_ref(),
                &self.emitter,
                &mut self.scheduler,
            );
            catch_unwind(AssertUnwindSafe(|| pipeline.run(&mut job)))
        };

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) if e.is_dependency_unavailable() => Some(e.to_string()),
            Ok(Err(e)) => Some(format!("Unexpected error: {}", e)),
            Err(panic) => Some(format!("Unexpected error: {}", panic_message(panic.as_ref()))),
        };
        if let Some(message) = failure {
            self.fail(&mut job, &message);
        }

        let report = cleanup_job(&job);
        if !report.is_clean() {
            warn!(
                "Cleanup of job {} left {} paths behind",
                job.identifier,
                report.failures.len()
            );
        }
        self.set_active(None);
    }

    fn fail(&self, job: &mut VideoJob, message: &str) {
        error!("Job {} failed: {}", job.identifier, message);
        match job.fail(message) {
            Ok(()) => self.emitter.emit(job, JobStage::Failed, message),
            Err(e) => warn!("Job {} could not be marked failed: {}", job.identifier, e),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
