//! Headless driver for the SPWN level compiler.
//!
//! Usage:
//!   spwnforge compile level.json              # build with the `spwn` tool
//!   spwnforge compile level.json --dry-run    # write the program only
//!   spwnforge emit level.json -o out.spwn     # print or save the program
//!   spwnforge convert old.proj level.json     # between project formats
//!   spwnforge info level.json                 # scenes, ids and counts
//!   spwnforge new level.json --scenes 3       # fresh project
//!   spwnforge add-scene level.json "Boss"     # append a scene

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};

use spwnforge_build::library::load_engine_fragments;
use spwnforge_build::{
    BuildConfig, BuildError, BuildWarning, compile, discover_config, load_config,
};
use spwnforge_core::document::{load_project, save_project};
use spwnforge_core::{Project, ProjectSession};
use spwnforge_emit::{ScriptMode, emit};

#[derive(Parser)]
#[command(name = "spwnforge")]
#[command(about = "Compile scene projects into SPWN programs")]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the program, assemble a workspace and run the builder
    Compile {
        project: PathBuf,
        #[command(flatten)]
        emit: EmitArgs,
        /// Level to write (defaults to the project file name)
        #[arg(long)]
        level_name: Option<String>,
        /// Keep the workspace directory after the build
        #[arg(long)]
        keep: bool,
        /// Write the program but do not run the builder (implies --keep)
        #[arg(long)]
        dry_run: bool,
        /// Kill the builder after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Print the generated program without building
    Emit {
        project: PathBuf,
        #[command(flatten)]
        emit: EmitArgs,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a project between .json, .ron and legacy .proj
    Convert { input: PathBuf, output: PathBuf },
    /// Show scenes, ids and object counts
    Info { project: PathBuf },
    /// Create a new project file
    New {
        path: PathBuf,
        /// Number of empty scenes to start with
        #[arg(long, default_value_t = 1)]
        scenes: usize,
    },
    /// Append a scene to a project file
    AddScene {
        project: PathBuf,
        /// Scene name (defaults to "Scene <n>")
        name: Option<String>,
    },
}

#[derive(Args)]
struct EmitArgs {
    /// Build config (default: ./spwnforge.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Fixed seed for block tokens
    #[arg(long)]
    seed: Option<u64>,
    /// Plain `let block` bindings without tokens
    #[arg(long)]
    no_decorate: bool,
    /// Comment scripts out instead of running them
    #[arg(long)]
    disable_scripts: bool,
}

impl EmitArgs {
    fn load_config(&self) -> Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => {
                let cwd = std::env::current_dir().context("No working directory")?;
                discover_config(&cwd)?
            }
        };
        if self.seed.is_some() {
            config.emit.seed = self.seed;
        }
        if self.no_decorate {
            config.emit.decorate = false;
        }
        if self.disable_scripts {
            config.emit.script_mode = ScriptMode::Disabled;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            project,
            emit,
            level_name,
            keep,
            dry_run,
            timeout,
            strict,
        } => {
            let mut config = emit.load_config()?;
            config.workspace.keep |= keep || dry_run;
            config.builder.skip |= dry_run;
            config.strict |= strict;
            if timeout.is_some() {
                config.builder.timeout_secs = timeout;
            }
            let level_name = level_name.unwrap_or_else(|| default_level_name(&project));
            compile_project(&project, &config, &level_name)
        }
        Commands::Emit {
            project,
            emit,
            output,
        } => emit_project(&project, &emit.load_config()?, output.as_deref()),
        Commands::Convert { input, output } => convert(&input, &output),
        Commands::Info { project } => info(&project),
        Commands::New { path, scenes } => new_project(&path, scenes),
        Commands::AddScene { project, name } => add_scene(&project, name),
    }
}

fn init_logging(verbose: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

/// File stem of the project path, or "Level".
fn default_level_name(project: &Path) -> String {
    project
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Level".to_string())
}

fn open(path: &Path) -> Result<Project> {
    load_project(path).with_context(|| format!("Failed to load project {}", path.display()))
}

fn compile_project(path: &Path, config: &BuildConfig, level_name: &str) -> Result<()> {
    let project = open(path)?;
    if project.is_empty() {
        log::warn!("{} has no scenes; only the preamble is emitted", path.display());
    }

    let report = compile(&project, config, level_name)?;
    if let Some(outcome) = &report.outcome {
        print!("{}", outcome.stdout);
        eprint!("{}", outcome.stderr);
    }
    let report = report.check()?;

    match &report.kept_workspace {
        Some(dir) => println!("Program: {}", dir.join(&config.workspace.output_file).display()),
        None => println!("Built level '{level_name}' ({} scene(s))", report.scene_count),
    }
    Ok(())
}

fn emit_project(path: &Path, config: &BuildConfig, output: Option<&Path>) -> Result<()> {
    let project = open(path)?;
    let mut warnings: Vec<BuildWarning> = Vec::new();
    let engine = match &config.engine_dir {
        Some(dir) => load_engine_fragments(dir, &mut warnings)?,
        None => Vec::new(),
    };
    let emitted = emit(
        &project,
        &config.emit.options(),
        &engine,
        &mut config.emit.decoration(),
    )?;
    match output {
        Some(out) => std::fs::write(out, &emitted.text)
            .with_context(|| format!("Failed to write {}", out.display()))?,
        None => print!("{}", emitted.text),
    }
    Ok(())
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    let project = open(input)?;
    save_project(&project, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Converted {} scene(s): {} -> {}",
        project.scene_count(),
        input.display(),
        output.display()
    );
    Ok(())
}

fn info(path: &Path) -> Result<()> {
    let project = open(path)?;
    println!("Scene counter: {}", project.scene_counter());
    println!("Palette: {} color(s)", project.palette.len());
    for (position, (key, scene)) in project.scenes().enumerate() {
        let scripted = project.objects_in(key).filter(|(_, o)| o.has_script()).count();
        println!(
            "{:>3}. [{}] {}: {} object(s), {} scripted, group {}g",
            position + 1,
            scene.id(),
            scene.name,
            scene.len(),
            scripted,
            position + 1
        );
    }
    Ok(())
}

fn new_project(path: &Path, scenes: usize) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    let mut session = ProjectSession::new();
    for _ in 0..scenes {
        session.project_mut().add_default_scene()?;
    }
    session
        .save_as(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {} with {scenes} scene(s)", path.display());
    Ok(())
}

fn add_scene(path: &Path, name: Option<String>) -> Result<()> {
    let mut session = ProjectSession::new();
    session
        .open(path)
        .with_context(|| format!("Failed to load project {}", path.display()))?;
    let project = session.project_mut();
    let key = match name {
        Some(name) => project.add_scene(name)?,
        None => project.add_default_scene()?,
    };
    let id = project.scene(key).map(|s| s.id());
    session.save()?;
    if let Some(id) = id {
        println!("Added scene {id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn level_name_defaults_to_file_stem() {
        assert_eq!(
            default_level_name(Path::new("levels/boss fight.json")),
            "boss fight"
        );
        assert_eq!(default_level_name(Path::new("/")), "Level");
    }

    #[test]
    fn dry_run_flags_parse() {
        let cli = Cli::try_parse_from([
            "spwnforge",
            "compile",
            "level.json",
            "--dry-run",
            "--seed",
            "7",
            "--level-name",
            "My Level",
        ])
        .unwrap();
        match cli.command {
            Commands::Compile {
                dry_run,
                emit,
                level_name,
                ..
            } => {
                assert!(dry_run);
                assert_eq!(emit.seed, Some(7));
                assert_eq!(level_name.as_deref(), Some("My Level"));
            }
            _ => panic!("expected compile"),
        }
    }

    #[test]
    fn new_then_add_scene_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.json");
        new_project(&path, 2).unwrap();
        add_scene(&path, Some("Boss".into())).unwrap();

        let project = load_project(&path).unwrap();
        let names: Vec<_> = project.scenes().map(|(_, s)| s.name.clone()).collect();
        assert_eq!(names, ["Scene 1", "Scene 2", "Boss"]);
        assert_eq!(project.scene_counter(), 3);
        assert!(new_project(&path, 1).is_err());
    }

    #[test]
    fn strict_compile_fails_without_running_the_builder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.json");
        new_project(&path, 1).unwrap();

        let mut config = BuildConfig::default();
        config.resolve_paths(dir.path());
        config.workspace.root = dir.path().join("work");
        config.builder.program = "spwnforge-never-started-0b7e".into();
        config.strict = true;

        let err = compile_project(&path, &config, "Level").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::WarningsDenied { .. })
        ));
    }
}
