use super::events::{EventEmitter, ProgressObserver};
use super::worker::{ControllerOptions, WorkspaceController};
use crate::config::WorkspaceDirectories;
use crate::config::workspace::workspace_dir_name;
use crate::error::AppResult;
use crate::pipeline::{Collaborators, SettingsStore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Creates, finds and stops workspace controllers by id
pub struct WorkspaceRegistry {
    controllers: Mutex<HashMap<u32, Arc<WorkspaceController>>>,
    collaborators: Collaborators,
    workspaces_root: PathBuf,
    /// Shared by every controller so observer calls never overlap
    emit_lock: Arc<Mutex<()>>,
    options: ControllerOptions,
}

impl WorkspaceRegistry {
    pub fn new(collaborators: Collaborators, workspaces_root: impl Into<PathBuf>) -> Self {
        Self::with_options(collaborators, workspaces_root, ControllerOptions::default())
    }

    pub fn with_options(
        collaborators: Collaborators,
        workspaces_root: impl Into<PathBuf>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            controllers: Mutex::new(HashMap::new()),
            collaborators,
            workspaces_root: workspaces_root.into(),
            emit_lock: Arc::new(Mutex::new(())),
            options,
        }
    }

    pub fn workspaces_root(&self) -> &Path {
        &self.workspaces_root
    }

    fn controllers(&self) -> MutexGuard<'_, HashMap<u32, Arc<WorkspaceController>>> {
        self.controllers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The controller for `workspace_id`, started on first use.
    ///
    /// Later calls return the running controller and ignore `settings` and
    /// `observer`.
    pub fn get_or_create(
        &self,
        workspace_id: u32,
        settings: Arc<dyn SettingsStore>,
        observer: Arc<dyn ProgressObserver>,
    ) -> AppResult<Arc<WorkspaceController>> {
        let mut controllers = self.controllers();
        if let Some(existing) = controllers.get(&workspace_id) {
            return Ok(existing.clone());
        }

        let controller = Arc::new(WorkspaceController::start(
            workspace_id,
            WorkspaceDirectories::under(self.workspaces_root.join(workspace_dir_name(workspace_id))),
            self.collaborators.clone(),
            settings,
            EventEmitter::with_lock(observer, self.emit_lock.clone()),
            self.options,
        )?);
        controllers.insert(workspace_id, controller.clone());
        Ok(controller)
    }

    pub fn get(&self, workspace_id: u32) -> Option<Arc<WorkspaceController>> {
        self.controllers().get(&workspace_id).cloned()
    }

    /// Sorted ids of running workspaces
    pub fn workspace_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.controllers().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Stop and forget a workspace. Returns whether it existed.
    pub fn remove(&self, workspace_id: u32) -> bool {
        // Stop outside the map lock; stopping can take a while
        let removed = self.controllers().remove(&workspace_id);
        match removed {
            Some(controller) => {
                controller.stop();
                info!("Workspace {} removed", workspace_id);
                true
            }
            None => false,
        }
    }

    /// Stop every workspace, used at shutdown
    pub fn stop_all(&self) {
        let controllers: Vec<_> = self.controllers().drain().map(|(_, c)| c).collect();
        for controller in controllers {
            controller.stop();
        }
    }
}

impl Drop for WorkspaceRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}
