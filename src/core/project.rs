//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the workspace marker directory
pub const WORKSPACE_DIR: &str = ".mtrack";

/// Represents an mtrack workspace
#[derive(Debug)]
pub struct Project {
    /// Root directory of the workspace (parent of .mtrack/)
    root: PathBuf,
}

impl Project {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Use `--project` when given, otherwise discover from the current directory
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ProjectError> {
        match explicit {
            Some(path) => Self::discover_from(path),
            None => Self::discover(),
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        if root.join(WORKSPACE_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }
        Self::write_skeleton(root)
    }

    /// Re-create the workspace config even if .mtrack/ exists.
    /// Pending overrides in state.db are left alone.
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        Self::write_skeleton(root)
    }

    fn write_skeleton(root: PathBuf) -> Result<Self, ProjectError> {
        let dir = root.join(WORKSPACE_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(dir.join(".gitignore"), "state.db*\n")
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# mtrack workspace configuration

# Base URL of the project-management backend (without /api)
# api_url: "http://localhost:8000"

# Bearer token for the backend (prefer MTRACK_TOKEN for secrets)
# token: ""

# Request timeout in seconds
# timeout_secs: 15

# Default output format (auto, tsv, json, yaml, csv, md, id)
# default_format: auto
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .mtrack directory
    pub fn mtrack_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Project-level config file
    pub fn config_path(&self) -> PathBuf {
        self.mtrack_dir().join("config.yaml")
    }

    /// SQLite file holding the override cache
    pub fn state_path(&self) -> PathBuf {
        self.mtrack_dir().join("state.db")
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an mtrack workspace (searched from {searched_from:?}). Run 'mtrack init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("mtrack workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.mtrack_dir().is_dir());
        assert!(project.config_path().exists());
        assert!(!project.state_path().exists());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
        assert!(Project::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_discover_from_nested_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("exports/2024");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_discover_fails_without_workspace() {
        let tmp = tempdir().unwrap();
        let err = Project::resolve(Some(tmp.path())).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }
}
