//! Code emitter: turns a [`Project`] into SPWN program text.
//!
//! Emission runs in two passes. [`lower`] confirms scene ids, assigns group
//! numbers and builds a typed [`Statement`] list; [`render`] formats that
//! list as text. Neither touches the filesystem.

pub mod ir;
pub mod lower;
pub mod options;
pub mod render;
pub mod token;

pub use ir::{CreateObject, EngineFragment, Statement};
pub use lower::{EmitError, EmitWarning, Lowered, lower, lower_preamble};
pub use options::{COORDINATE_OFFSET, EmitOptions, Import, ScriptMode, default_imports};
pub use render::render;
pub use token::{BlockToken, Decoration, TokenRng};

use spwnforge_core::Project;

/// Rendered program plus the warnings raised while lowering it.
#[derive(Debug, Clone)]
pub struct Emitted {
    pub text: String,
    pub warnings: Vec<EmitWarning>,
    /// Number of scene blocks in `text`.
    pub scene_count: usize,
}

/// Lower and render in one step.
pub fn emit(
    project: &Project,
    options: &EmitOptions,
    engine: &[EngineFragment],
    decoration: &mut Decoration,
) -> Result<Emitted, EmitError> {
    let lowered = lower(project, options, engine, decoration)?;
    let scene_count = lowered
        .statements
        .iter()
        .filter(|s| s.is_scene_header())
        .count();
    Ok(Emitted {
        text: render(&lowered.statements),
        warnings: lowered.warnings,
        scene_count,
    })
}
