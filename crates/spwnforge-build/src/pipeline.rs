//! Compile pipeline: emit, assemble the workspace, run the builder.
//!
//! Emission happens before any directory is created, so a project with
//! inconsistent scene ids leaves nothing on disk. Once the workspace exists
//! any failure drops it, which removes it unless `keep` is set. With
//! `strict`, any warning stops the compile before the program is written or
//! the builder started.

use std::path::PathBuf;

use spwnforge_core::Project;
use spwnforge_emit::{Decoration, emit};

use crate::config::BuildConfig;
use crate::error::{BuildError, BuildWarning};
use crate::invoke::{BuildCommand, BuildOutcome};
use crate::library::{copy_libraries, load_engine_fragments};
use crate::workspace::Workspace;

/// Everything a compile produced.
#[derive(Debug, Clone)]
pub struct CompileReport {
    /// Generated program text.
    pub text: String,
    /// Where the program was written. Gone after the run unless kept.
    pub program_path: PathBuf,
    /// The workspace directory, if it was kept.
    pub kept_workspace: Option<PathBuf>,
    /// Library files copied into the workspace.
    pub libraries: Vec<PathBuf>,
    /// `None` for a dry run.
    pub outcome: Option<BuildOutcome>,
    pub warnings: Vec<BuildWarning>,
    pub scene_count: usize,
}

impl CompileReport {
    /// Fail if the builder ran and did not succeed.
    pub fn check(mut self) -> Result<Self, BuildError> {
        if let Some(outcome) = self.outcome.take() {
            self.outcome = Some(outcome.check()?);
        }
        Ok(self)
    }
}

/// Compile with the decoration described by `config.emit`.
pub fn compile(
    project: &Project,
    config: &BuildConfig,
    level_name: &str,
) -> Result<CompileReport, BuildError> {
    compile_with(project, config, level_name, &mut config.emit.decoration())
}

/// Compile with an explicit token source.
pub fn compile_with(
    project: &Project,
    config: &BuildConfig,
    level_name: &str,
    decoration: &mut Decoration,
) -> Result<CompileReport, BuildError> {
    let mut warnings = Vec::new();

    let engine = match &config.engine_dir {
        Some(dir) => load_engine_fragments(dir, &mut warnings)?,
        None => Vec::new(),
    };
    let emitted = emit(project, &config.emit.options(), &engine, decoration)?;
    warnings.extend(emitted.warnings.into_iter().map(BuildWarning::from));

    let mut workspace = Workspace::create(&config.workspace.root, &config.workspace.prefix)?;
    workspace.set_keep(config.workspace.keep);

    let libraries = copy_libraries(&config.library_dirs, workspace.path(), &mut warnings)?;
    if let Some(library) = libraries
        .iter()
        .find(|p| p.file_name().is_some_and(|n| n == config.workspace.output_file.as_str()))
    {
        let warning = BuildWarning::ShadowedByProgram {
            library: library.clone(),
        };
        log::warn!("{warning}");
        warnings.push(warning);
    }
    if config.strict && !warnings.is_empty() {
        workspace.set_keep(false);
        return Err(BuildError::WarningsDenied { warnings });
    }

    let program_path = workspace.write_file(&config.workspace.output_file, &emitted.text)?;
    log::info!(
        "wrote {} scene(s) to {}",
        emitted.scene_count,
        program_path.display()
    );

    let outcome = if config.builder.skip {
        log::info!("dry run; builder not started");
        None
    } else {
        let command = BuildCommand::from_config(&config.builder, &program_path, level_name)
            .current_dir(workspace.path());
        Some(command.run(config.builder.timeout())?)
    };

    let kept_workspace = workspace.finish()?;
    Ok(CompileReport {
        text: emitted.text,
        program_path,
        kept_workspace,
        libraries,
        outcome,
        warnings,
        scene_count: emitted.scene_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spwnforge_core::test_utils::sample_project;
    use std::fs;
    use tempfile::TempDir;

    fn dry_config(root: &TempDir) -> BuildConfig {
        let mut config = BuildConfig::default();
        config.resolve_paths(root.path());
        config.workspace.root = root.path().join("work");
        config.builder.skip = true;
        config.emit.decorate = false;
        config
    }

    #[test]
    fn dry_run_writes_program_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let config = dry_config(&root);
        let report = compile(&sample_project(), &config, "Level").unwrap();

        assert!(report.outcome.is_none());
        assert_eq!(report.scene_count, 2);
        assert!(report.text.contains("// Scene: Intro"));
        assert!(report.kept_workspace.is_none());
        assert!(!report.program_path.exists());
        assert_eq!(fs::read_dir(root.path().join("work")).unwrap().count(), 0);
    }

    #[test]
    fn missing_directories_become_warnings() {
        let root = tempfile::tempdir().unwrap();
        let config = dry_config(&root);
        let report = compile(&sample_project(), &config, "Level").unwrap();

        let missing: Vec<_> = report
            .warnings
            .iter()
            .filter(|w| {
                matches!(
                    w,
                    BuildWarning::MissingLibraryDir { .. } | BuildWarning::MissingEngineDir { .. }
                )
            })
            .collect();
        assert_eq!(missing.len(), 3);
        assert!(
            report
                .warnings
                .iter()
                .any(|w| matches!(w, BuildWarning::Emit(_)))
        );
    }

    #[test]
    fn kept_workspace_holds_program_and_libraries() {
        let root = tempfile::tempdir().unwrap();
        let mut config = dry_config(&root);
        config.workspace.keep = true;
        fs::create_dir(root.path().join("utils")).unwrap();
        fs::write(root.path().join("utils").join("helpers.spwn"), "// helpers").unwrap();
        fs::create_dir(root.path().join("engine")).unwrap();
        fs::write(root.path().join("engine").join("core.spwn"), "// core engine\n").unwrap();

        let report = compile(&sample_project(), &config, "Level").unwrap();
        let kept = report.kept_workspace.clone().unwrap();
        assert_eq!(report.program_path, kept.join("compiled.spwn"));
        assert_eq!(fs::read_to_string(&report.program_path).unwrap(), report.text);
        assert!(kept.join("helpers.spwn").is_file());
        assert!(report.text.contains("// core engine\n"));
        assert!(!report.text.contains("helpers"));
    }

    #[test]
    fn strict_stops_before_the_builder() {
        let root = tempfile::tempdir().unwrap();
        let mut config = dry_config(&root);
        config.strict = true;
        config.workspace.keep = true;
        config.builder.skip = false;
        config.builder.program = "spwnforge-never-started-5e1d".into();

        match compile(&sample_project(), &config, "Level") {
            Err(BuildError::WarningsDenied { warnings }) => {
                assert!(warnings.iter().any(|w| matches!(w, BuildWarning::Emit(_))));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(fs::read_dir(root.path().join("work")).unwrap().count(), 0);
    }

    #[test]
    fn library_named_like_the_program_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let mut config = dry_config(&root);
        config.workspace.keep = true;
        fs::create_dir(root.path().join("libs")).unwrap();
        fs::write(root.path().join("libs").join("compiled.spwn"), "// old").unwrap();

        let report = compile(&sample_project(), &config, "Level").unwrap();
        let kept = report.kept_workspace.clone().unwrap();
        assert!(report.warnings.contains(&BuildWarning::ShadowedByProgram {
            library: kept.join("compiled.spwn"),
        }));
        assert_eq!(fs::read_to_string(&report.program_path).unwrap(), report.text);
    }

    #[test]
    fn empty_project_is_preamble_only() {
        let root = tempfile::tempdir().unwrap();
        let config = dry_config(&root);
        let report = compile(&Project::new(), &config, "Level").unwrap();
        assert_eq!(report.scene_count, 0);
        assert!(report.text.starts_with("//libs\n"));
        assert!(!report.text.contains("next_scene();"));
    }
}
