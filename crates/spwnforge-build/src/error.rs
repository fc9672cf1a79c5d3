use std::fmt;
use std::path::PathBuf;

use spwnforge_emit::{EmitError, EmitWarning};

use crate::config::ConfigError;

/// Errors that abort a compile.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The freshly generated workspace name already exists. Never retried.
    #[error("workspace directory already exists: {path}")]
    WorkspaceConflict { path: PathBuf },

    #[error("failed to create workspace {path}: {source}")]
    CreateWorkspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove workspace {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The builder executable could not be started (usually: not on PATH).
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("lost track of `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The builder ran but reported failure.
    #[error("`{command}` {reason}")]
    ExternalBuildFailed {
        command: String,
        reason: String,
        stderr: String,
    },

    /// Warnings were raised and the config treats them as fatal. The
    /// builder was not started.
    #[error("{} warning(s) treated as errors", .warnings.len())]
    WarningsDenied { warnings: Vec<BuildWarning> },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Recoverable conditions met while assembling a build. Each one is logged
/// when it happens and also returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// A configured library directory does not exist; nothing was copied
    /// from it.
    MissingLibraryDir { path: PathBuf },
    /// The engine directory does not exist; the engine section is empty.
    MissingEngineDir { path: PathBuf },
    /// A library file has the program's name and was overwritten by it.
    ShadowedByProgram { library: PathBuf },
    Emit(EmitWarning),
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::MissingLibraryDir { path } => {
                write!(f, "library directory {} not found; skipped", path.display())
            }
            BuildWarning::MissingEngineDir { path } => write!(
                f,
                "engine directory {} not found; engine section left empty",
                path.display()
            ),
            BuildWarning::ShadowedByProgram { library } => write!(
                f,
                "library file {} has the program's name and is overwritten",
                library.display()
            ),
            BuildWarning::Emit(w) => w.fmt(f),
        }
    }
}

impl From<EmitWarning> for BuildWarning {
    fn from(w: EmitWarning) -> Self {
        BuildWarning::Emit(w)
    }
}
