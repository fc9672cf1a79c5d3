//! Build orchestration: configuration, workspace assembly and the external
//! `spwn` builder.
//!
//! [`compile`] is the entry point. It emits the program, creates a fresh
//! workspace, copies support libraries into it, writes the program and runs
//! the builder (or stops there for a dry run).

pub mod config;
pub mod error;
pub mod invoke;
pub mod library;
pub mod pipeline;
pub mod workspace;

pub use config::{
    BuildConfig, BuilderConfig, CONFIG_FILE_NAME, ConfigError, EmitConfig, WorkspaceConfig,
    discover_config, load_config,
};
pub use error::{BuildError, BuildWarning};
pub use invoke::{BuildCommand, BuildOutcome};
pub use pipeline::{CompileReport, compile, compile_with};
pub use workspace::Workspace;
