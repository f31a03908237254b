use crate::error::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Directories that belong to one workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceDirectories {
    pub root: PathBuf,
    pub downloads: PathBuf,
    pub processing: PathBuf,
    pub clips: PathBuf,
    pub published: PathBuf,
    pub logs: PathBuf,
}

impl WorkspaceDirectories {
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            downloads: root.join("downloads"),
            processing: root.join("processing"),
            clips: root.join("clips"),
            published: root.join("published"),
            logs: root.join("logs"),
            root,
        }
    }

    pub fn ensure(&self) -> AppResult<()> {
        for dir in [
            &self.root,
            &self.downloads,
            &self.processing,
            &self.clips,
            &self.published,
            &self.logs,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

pub fn workspace_dir_name(workspace_id: u32) -> String {
    format!("workspace_{}", workspace_id)
}

/// Create the directory tree of `workspace_id` under `workspaces_root`
pub fn create_workspace_directories(
    workspaces_root: &Path,
    workspace_id: u32,
) -> AppResult<WorkspaceDirectories> {
    let dirs = WorkspaceDirectories::under(workspaces_root.join(workspace_dir_name(workspace_id)));
    dirs.ensure()?;
    Ok(dirs)
}

/// Workspace ids found as directories or layout files
pub fn list_workspace_ids(workspaces_root: &Path, layouts_dir: &Path) -> AppResult<Vec<u32>> {
    let pattern =
        Regex::new(r"^workspace_(\d+)").map_err(|e| AppError::Config(e.to_string()))?;
    let mut ids = BTreeSet::new();

    for (dir, want_dir) in [(workspaces_root, true), (layouts_dir, false)] {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() != want_dir {
                continue;
            }
            let name = if want_dir {
                path.file_name()
            } else {
                path.file_stem()
            };
            if let Some(id) = name
                .and_then(|n| n.to_str())
                .and_then(|n| pattern.captures(n))
                .and_then(|c| c[1].parse::<u32>().ok())
            {
                ids.insert(id);
            }
        }
    }

    Ok(ids.into_iter().collect())
}

/// Smallest id >= 1 not in `existing`
pub fn next_workspace_id(existing: &[u32]) -> u32 {
    let mut candidate = 1;
    while existing.contains(&candidate) {
        candidate += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_list_workspaces() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("workspaces");
        let layouts = tmp.path().join("layouts");
        std::fs::create_dir_all(&layouts).unwrap();

        let dirs = create_workspace_directories(&root, 2).unwrap();
        assert!(dirs.clips.is_dir());
        std::fs::write(layouts.join("workspace_5.json"), "{}").unwrap();
        std::fs::write(layouts.join("notes.json"), "{}").unwrap();
        std::fs::create_dir_all(root.join("scratch")).unwrap();

        assert_eq!(list_workspace_ids(&root, &layouts).unwrap(), vec![2, 5]);
    }

    #[test]
    fn test_missing_roots_list_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let ids = list_workspace_ids(&tmp.path().join("a"), &tmp.path().join("b")).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_next_workspace_id_fills_gaps() {
        assert_eq!(next_workspace_id(&[]), 1);
        assert_eq!(next_workspace_id(&[1, 2, 4]), 3);
        assert_eq!(next_workspace_id(&[2]), 1);
    }
}
