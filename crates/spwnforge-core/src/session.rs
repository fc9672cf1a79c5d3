use std::path::{Path, PathBuf};

use crate::document::{DocumentError, load_project, save_project};
use crate::model::Project;

/// The project currently open in an editor, plus where it lives on disk.
///
/// Opening a file only replaces the active project once the file has loaded
/// and validated; a failed open leaves the session exactly as it was.
#[derive(Debug, Default)]
pub struct ProjectSession {
    project: Project,
    path: Option<PathBuf>,
    dirty: bool,
}

impl ProjectSession {
    /// A session holding an empty, unsaved project.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Mutable access for edits. Marks the session dirty.
    pub fn project_mut(&mut self) -> &mut Project {
        self.dirty = true;
        &mut self.project
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Load `path` and make it the active project.
    pub fn open(&mut self, path: &Path) -> Result<(), DocumentError> {
        let project = load_project(path)?;
        self.project = project;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        log::info!("opened project {}", path.display());
        Ok(())
    }

    /// Save to the current path.
    pub fn save(&mut self) -> Result<(), DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::NoPath)?;
        save_project(&self.project, &path)?;
        self.dirty = false;
        Ok(())
    }

    /// Save to `path` and make it the current path.
    pub fn save_as(&mut self, path: &Path) -> Result<(), DocumentError> {
        save_project(&self.project, path)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }
}
