//! Per-compile working directory.
//!
//! Each compile gets `<root>/<prefix><16 hex digits>`. The directory is made
//! with a non-recursive create, so an existing directory of the same name is
//! a [`BuildError::WorkspaceConflict`] rather than silent reuse. A workspace
//! that is dropped without [`Workspace::finish`] is removed unless kept.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    keep: bool,
    finished: bool,
}

/// `<prefix><16 lower-case hex digits>` from the thread RNG.
pub fn random_name(prefix: &str) -> String {
    format!("{prefix}{:016x}", rand::random::<u64>())
}

impl Workspace {
    /// Create a freshly named workspace under `root`. `root` itself is
    /// created if needed.
    pub fn create(root: &Path, prefix: &str) -> Result<Self, BuildError> {
        Self::create_named(root, &random_name(prefix))
    }

    /// Create `root/name`. Fails if it already exists. The workspace path is
    /// always absolute, so it stays valid when a child runs inside it.
    pub fn create_named(root: &Path, name: &str) -> Result<Self, BuildError> {
        let root_err = |source| BuildError::CreateWorkspace {
            path: root.to_path_buf(),
            source,
        };
        fs::create_dir_all(root).map_err(root_err)?;
        let root = fs::canonicalize(root).map_err(root_err)?;
        let path = root.join(name);
        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BuildError::WorkspaceConflict { path });
            }
            Err(source) => return Err(BuildError::CreateWorkspace { path, source }),
        }
        log::info!("workspace {}", path.display());
        Ok(Self {
            path,
            keep: false,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the directory on disk when the workspace is finished or dropped.
    pub fn set_keep(&mut self, keep: bool) {
        self.keep = keep;
    }

    pub fn keeps(&self) -> bool {
        self.keep
    }

    /// Write `contents` to `name` inside the workspace.
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf, BuildError> {
        let path = self.path.join(name);
        fs::write(&path, contents).map_err(|source| BuildError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Remove the directory unless kept. Returns the path when it was kept.
    pub fn finish(mut self) -> Result<Option<PathBuf>, BuildError> {
        self.finished = true;
        if self.keep {
            log::info!("keeping workspace {}", self.path.display());
            return Ok(Some(self.path.clone()));
        }
        fs::remove_dir_all(&self.path).map_err(|source| BuildError::Cleanup {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("removed workspace {}", self.path.display());
        Ok(None)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.finished || self.keep {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            log::warn!("could not remove workspace {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_names_have_sixteen_hex_digits() {
        let name = random_name("ws-");
        let suffix = name.strip_prefix("ws-").unwrap();
        assert_eq!(suffix.len(), 16);
        assert!(suffix.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn two_workspaces_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let a = Workspace::create(root.path(), "ws-").unwrap();
        let b = Workspace::create(root.path(), "ws-").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir() && b.path().is_dir());
    }

    #[test]
    fn existing_name_is_a_conflict() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("taken")).unwrap();
        let err = Workspace::create_named(root.path(), "taken").unwrap_err();
        let taken = fs::canonicalize(root.path()).unwrap().join("taken");
        assert!(matches!(
            err,
            BuildError::WorkspaceConflict { path } if path == taken
        ));
        // The pre-existing directory is left alone.
        assert!(root.path().join("taken").is_dir());
    }

    #[test]
    fn finish_removes_unless_kept() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(root.path(), "ws-").unwrap();
        let path = ws.path().to_path_buf();
        ws.write_file("compiled.spwn", "//libs\n").unwrap();
        assert_eq!(ws.finish().unwrap(), None);
        assert!(!path.exists());

        let mut ws = Workspace::create(root.path(), "ws-").unwrap();
        ws.set_keep(true);
        let kept = ws.finish().unwrap().unwrap();
        assert!(kept.is_dir());
    }

    #[test]
    fn dropped_workspace_is_cleaned_up() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let ws = Workspace::create(root.path(), "ws-").unwrap();
            ws.write_file("a.txt", "a").unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn missing_root_is_created() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("deep").join("er");
        let ws = Workspace::create(&nested, "ws-").unwrap();
        assert!(ws.path().starts_with(fs::canonicalize(&nested).unwrap()));
    }

    #[test]
    fn relative_root_yields_absolute_workspace() {
        let root = tempfile::tempdir_in(".").unwrap();
        assert!(root.path().is_relative());
        let ws = Workspace::create(root.path(), "ws-").unwrap();
        assert!(ws.path().is_absolute());
        assert!(ws.path().is_dir());
        let path = ws.write_file("compiled.spwn", "//libs\n").unwrap();
        assert!(path.is_absolute());
    }
}
