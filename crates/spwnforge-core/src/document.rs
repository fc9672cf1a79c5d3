//! Persisted project documents.
//!
//! A [`ProjectDocument`] is the plain serde shape written to disk; it is
//! converted to and from the keyed [`Project`] model. JSON and RON are
//! supported, plus the legacy `.proj` text format (see [`crate::legacy`]).
//! The format is detected from the file extension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::alloc::AllocationError;
use crate::color::Palette;
use crate::id::{ObjectTypeId, SceneId};
use crate::legacy;
use crate::model::{GameObject, Project};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors from reading or writing project documents.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The file has an extension we don't support.
    #[error("unsupported project format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Document text could not be decoded (no file context).
    #[error("malformed {format} project document: {detail}")]
    Malformed { format: Format, detail: String },

    /// A file could not be decoded.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The document decoded but its scene ids are inconsistent with its
    /// scene counter.
    #[error("invalid project document: {0}")]
    Invalid(#[from] AllocationError),

    #[error("failed to encode project as {format}: {detail}")]
    Encode { format: Format, detail: String },

    /// The session has no file to save to.
    #[error("project has no file path")]
    NoPath,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Attach a file path to a decode error.
    fn in_file(self, file: &Path) -> Self {
        match self {
            DocumentError::Malformed { detail, .. } => DocumentError::Parse {
                file: file.to_path_buf(),
                detail,
            },
            DocumentError::Invalid(e) => DocumentError::Parse {
                file: file.to_path_buf(),
                detail: e.to_string(),
            },
            other => other,
        }
    }
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported project document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Ron,
    /// The original editor's line-based `.proj` format. Lossy.
    Legacy,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "JSON",
            Format::Ron => "RON",
            Format::Legacy => "legacy .proj",
        })
    }
}

/// Detect the format of a project file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DocumentError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("ron") => Ok(Format::Ron),
        Some("proj") => Ok(Format::Legacy),
        _ => Err(DocumentError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Document shape
// ===========================================================================

/// Top-level persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    #[serde(rename = "sceneCounter")]
    pub scene_counter: u32,
    #[serde(default, skip_serializing_if = "Palette::is_empty")]
    pub palette: Palette,
    #[serde(default)]
    pub scenes: Vec<SceneRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub name: String,
    pub id: SceneId,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub obj_id: ObjectTypeId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub script: String,
}

impl From<&GameObject> for ObjectRecord {
    fn from(obj: &GameObject) -> Self {
        Self {
            obj_id: obj.obj_id,
            x: obj.x,
            y: obj.y,
            rotation: obj.rotation,
            color_id: obj.color_id.clone(),
            groups: obj.groups.clone(),
            name: obj.name.clone(),
            script: obj.script.clone(),
        }
    }
}

impl From<ObjectRecord> for GameObject {
    fn from(rec: ObjectRecord) -> Self {
        Self {
            obj_id: rec.obj_id,
            x: rec.x,
            y: rec.y,
            rotation: rec.rotation,
            color_id: rec.color_id,
            groups: rec.groups,
            name: rec.name,
            script: rec.script,
        }
    }
}

impl ProjectDocument {
    /// Snapshot a project into its persisted shape.
    pub fn from_project(project: &Project) -> Self {
        let scenes = project
            .scenes()
            .map(|(key, scene)| SceneRecord {
                name: scene.name.clone(),
                id: scene.id(),
                objects: project
                    .objects_in(key)
                    .map(|(_, obj)| ObjectRecord::from(obj))
                    .collect(),
            })
            .collect();
        Self {
            scene_counter: project.scene_counter(),
            palette: project.palette.clone(),
            scenes,
        }
    }

    /// Build a project, restoring the scene counter verbatim and confirming
    /// that every scene id was issued by it.
    pub fn into_project(self) -> Result<Project, DocumentError> {
        let mut project = Project::with_scene_counter(self.scene_counter, self.palette);
        project
            .allocator()
            .confirm(self.scenes.iter().map(|s| s.id))?;

        for scene in self.scenes {
            project.restore_scene(
                scene.id,
                scene.name,
                scene.objects.into_iter().map(GameObject::from),
            );
        }
        Ok(project)
    }
}

// ===========================================================================
// String codecs
// ===========================================================================

/// Reject values no document format can carry back. JSON would write a
/// non-finite `f64` as `null` and fail to read it again.
fn ensure_finite(project: &Project, format: Format) -> Result<(), DocumentError> {
    for (key, scene) in project.scenes() {
        for (_, obj) in project.objects_in(key) {
            let fields = [("x", obj.x), ("y", obj.y), ("rotation", obj.rotation)];
            if let Some((field, value)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
                return Err(DocumentError::Encode {
                    format,
                    detail: format!(
                        "object '{}' in scene '{}' has non-finite {field} ({value})",
                        obj.name, scene.name
                    ),
                });
            }
        }
    }
    Ok(())
}

pub fn to_json(project: &Project) -> Result<String, DocumentError> {
    ensure_finite(project, Format::Json)?;
    serde_json::to_string_pretty(&ProjectDocument::from_project(project)).map_err(|e| {
        DocumentError::Encode {
            format: Format::Json,
            detail: e.to_string(),
        }
    })
}

pub fn from_json(text: &str) -> Result<Project, DocumentError> {
    let doc: ProjectDocument = serde_json::from_str(text).map_err(|e| DocumentError::Malformed {
        format: Format::Json,
        detail: e.to_string(),
    })?;
    doc.into_project()
}

pub fn to_ron(project: &Project) -> Result<String, DocumentError> {
    ensure_finite(project, Format::Ron)?;
    ron::ser::to_string_pretty(
        &ProjectDocument::from_project(project),
        ron::ser::PrettyConfig::default(),
    )
    .map_err(|e| DocumentError::Encode {
        format: Format::Ron,
        detail: e.to_string(),
    })
}

pub fn from_ron(text: &str) -> Result<Project, DocumentError> {
    let doc: ProjectDocument = ron::from_str(text).map_err(|e| DocumentError::Malformed {
        format: Format::Ron,
        detail: e.to_string(),
    })?;
    doc.into_project()
}

/// Encode in the given format.
pub fn encode(project: &Project, format: Format) -> Result<String, DocumentError> {
    match format {
        Format::Json => to_json(project),
        Format::Ron => to_ron(project),
        Format::Legacy => {
            ensure_finite(project, format)?;
            Ok(legacy::export(project))
        }
    }
}

/// Decode from the given format.
pub fn decode(text: &str, format: Format) -> Result<Project, DocumentError> {
    match format {
        Format::Json => from_json(text),
        Format::Ron => from_ron(text),
        Format::Legacy => legacy::import(text),
    }
}

// ===========================================================================
// Files
// ===========================================================================

/// Read a project file, detecting the format from its extension.
pub fn load_project(path: &Path) -> Result<Project, DocumentError> {
    let format = detect_format(path)?;
    let text = std::fs::read_to_string(path)?;
    let project = decode(&text, format).map_err(|e| e.in_file(path))?;
    log::debug!(
        "loaded {} scene(s) from {} (scene counter {})",
        project.scene_count(),
        path.display(),
        project.scene_counter()
    );
    Ok(project)
}

/// Write a project file, choosing the format from its extension.
pub fn save_project(project: &Project, path: &Path) -> Result<(), DocumentError> {
    let format = detect_format(path)?;
    if format == Format::Legacy {
        log::warn!(
            "{} uses the legacy format; rotation, colors, tags and names are not saved",
            path.display()
        );
    }
    let text = encode(project, format)?;
    std::fs::write(path, text)?;
    Ok(())
}
