//! SpwnForge Core -- the project model behind the SPWN level compiler.
//!
//! A project is an ordered list of scenes, each an ordered list of placed
//! objects, plus a color palette and the scene counter that seeds scene ids.
//! This crate owns the model, identifier allocation and the on-disk project
//! documents; emission and building live in `spwnforge-emit` and
//! `spwnforge-build`.
//!
//! # Identifiers
//!
//! - [`id::SceneKey`] / [`id::ObjectKey`] -- stable in-memory handles that
//!   never shift when siblings are deleted or reordered.
//! - [`id::SceneId`] -- the permanent, persisted scene id
//!   (`SCENE_ID_BASE + counter`), never reused.
//! - [`id::GroupId`] -- per-compile group number (1-based emission position).
//!
//! ```rust,ignore
//! let mut project = Project::new();
//! let intro = project.add_scene("Intro")?;
//! let block = project.add_object(intro, None)?;
//! project.object_mut(block).unwrap().set_position(10.0, 20.0);
//! document::save_project(&project, Path::new("level.json"))?;
//! ```

pub mod alloc;
pub mod color;
pub mod document;
pub mod id;
pub mod legacy;
pub mod model;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use alloc::{AllocationError, GroupPlan, SCENE_ID_BASE, SceneIdAllocator};
pub use color::{Color, FALLBACK_COLOR, Palette};
pub use document::{DocumentError, Format, ProjectDocument};
pub use model::{GameObject, ModelError, Project, Scene};
pub use session::ProjectSession;
