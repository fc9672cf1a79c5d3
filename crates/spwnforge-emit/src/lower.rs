//! Lowering: project → ordered statements.
//!
//! Scene ids are confirmed and group numbers assigned first, so a project
//! whose ids are inconsistent never produces output. Unknown color keys are
//! recoverable: the object gets the fallback color and a warning is recorded.

use spwnforge_core::alloc::{self, AllocationError};
use spwnforge_core::color::ColorResolution;
use spwnforge_core::id::SceneId;
use spwnforge_core::Project;

use crate::ir::{CreateObject, EngineFragment, Statement};
use crate::options::EmitOptions;
use crate::token::Decoration;

/// Errors that stop emission.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("scene identifiers are inconsistent: {0}")]
    Allocation(#[from] AllocationError),
}

/// Recoverable conditions found while lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitWarning {
    /// An object's color key is not in the palette; the fallback was used.
    UnknownColor {
        scene: SceneId,
        object: String,
        key: String,
    },
}

impl std::fmt::Display for EmitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitWarning::UnknownColor { scene, object, key } => write!(
                f,
                "object '{object}' in scene {scene} uses unknown color '{key}'; using fallback"
            ),
        }
    }
}

/// Statements plus the warnings raised while building them.
#[derive(Debug, Clone, Default)]
pub struct Lowered {
    pub statements: Vec<Statement>,
    pub warnings: Vec<EmitWarning>,
}

/// Build the preamble: libs header, imports, then engine fragments.
pub fn lower_preamble(options: &EmitOptions, engine: &[EngineFragment]) -> Vec<Statement> {
    let mut out = Vec::with_capacity(1 + options.imports.len() + engine.len());
    out.push(Statement::LibsHeader);
    out.extend(options.imports.iter().cloned().map(Statement::Import));
    out.extend(engine.iter().cloned().map(Statement::Engine));
    out
}

/// Lower a whole project.
pub fn lower(
    project: &Project,
    options: &EmitOptions,
    engine: &[EngineFragment],
    decoration: &mut Decoration,
) -> Result<Lowered, EmitError> {
    let plan = alloc::prepare(project)?;
    let mut lowered = Lowered {
        statements: lower_preamble(options, engine),
        warnings: Vec::new(),
    };

    for ((key, scene), (planned, group)) in project.scenes().zip(plan.iter()) {
        debug_assert_eq!(key, planned);
        lowered.statements.push(Statement::SceneHeader {
            scene: scene.id(),
            name: scene.name.clone(),
        });

        for (_, obj) in project.objects_in(key) {
            let resolution = project.resolve_color(obj);
            if let ColorResolution::Unknown { key: color_key } = resolution {
                let warning = EmitWarning::UnknownColor {
                    scene: scene.id(),
                    object: obj.name.clone(),
                    key: color_key.to_string(),
                };
                log::warn!("{warning}");
                lowered.warnings.push(warning);
            }

            lowered.statements.push(Statement::CreateObject(CreateObject {
                token: decoration.next_token(),
                obj_id: obj.obj_id,
                x: obj.x + options.coordinate_offset,
                y: obj.y + options.coordinate_offset,
                rotation: obj.rotation,
                color: resolution.color(),
                group,
                tags: obj.groups.clone(),
            }));

            if obj.has_script() {
                lowered.statements.push(Statement::Script {
                    text: obj.script.clone(),
                    mode: options.script_mode,
                });
            }
        }

        lowered
            .statements
            .push(Statement::SceneAdvance { scene: scene.id() });
    }

    log::debug!(
        "lowered {} scene(s) into {} statement(s)",
        project.scene_count(),
        lowered.statements.len()
    );
    Ok(lowered)
}
