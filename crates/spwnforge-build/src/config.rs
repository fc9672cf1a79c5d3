//! Build configuration (`spwnforge.toml`).
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. RON and JSON are accepted too, detected by extension.
//! Relative paths in a loaded file are resolved against the file's directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use spwnforge_emit::{
    COORDINATE_OFFSET, Decoration, EmitOptions, Import, ScriptMode, default_imports,
};

/// Conventional config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "spwnforge.toml";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported config format: {file}")]
    UnsupportedFormat { file: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Sections
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory the per-compile workspace is created in.
    pub root: PathBuf,
    pub prefix: String,
    /// Name of the generated program inside the workspace.
    pub output_file: String,
    /// Leave the workspace on disk after the build.
    pub keep: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir(),
            prefix: "spwnforge-".to_string(),
            output_file: "compiled.spwn".to_string(),
            keep: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    pub offset: f64,
    pub script_mode: ScriptMode,
    /// Random `block_<hex>` binding names.
    pub decorate: bool,
    /// Fixed token seed. Unset means a fresh seed per compile.
    pub seed: Option<u64>,
    pub imports: Vec<Import>,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            offset: COORDINATE_OFFSET,
            script_mode: ScriptMode::default(),
            decorate: true,
            seed: None,
            imports: default_imports(),
        }
    }
}

impl EmitConfig {
    pub fn options(&self) -> EmitOptions {
        EmitOptions {
            coordinate_offset: self.offset,
            script_mode: self.script_mode,
            imports: self.imports.clone(),
        }
    }

    pub fn decoration(&self) -> Decoration {
        match (self.decorate, self.seed) {
            (false, _) => Decoration::Off,
            (true, Some(seed)) => Decoration::seeded(seed),
            (true, None) => Decoration::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub program: String,
    /// Arguments placed before the generated file path.
    pub args: Vec<String>,
    /// Flag that precedes the level name.
    pub level_flag: String,
    /// Kill the builder after this many seconds. Unset waits forever.
    pub timeout_secs: Option<u64>,
    /// Stop after writing the program (dry run).
    pub skip: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            program: "spwn".to_string(),
            args: vec!["build".to_string()],
            level_flag: "--level-name".to_string(),
            timeout_secs: None,
            skip: false,
        }
    }
}

impl BuilderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

// ===========================================================================
// BuildConfig
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub workspace: WorkspaceConfig,
    /// Directories whose regular files are copied into every workspace.
    pub library_dirs: Vec<PathBuf>,
    /// Directory of engine fragments emitted after the imports. Unset means
    /// no engine section.
    pub engine_dir: Option<PathBuf>,
    pub emit: EmitConfig,
    pub builder: BuilderConfig,
    /// Fail before the builder runs if any warning was raised.
    pub strict: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig::default(),
            library_dirs: vec![PathBuf::from("utils"), PathBuf::from("libs")],
            engine_dir: Some(PathBuf::from("engine")),
            emit: EmitConfig::default(),
            builder: BuilderConfig::default(),
            strict: false,
        }
    }
}

impl BuildConfig {
    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.workspace.root);
        self.library_dirs.iter_mut().for_each(resolve);
        if let Some(dir) = self.engine_dir.as_mut() {
            resolve(dir);
        }
    }
}

// ===========================================================================
// Loading
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Ron,
    Json,
}

pub fn detect_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(ConfigFormat::Toml),
        Some("ron") => Ok(ConfigFormat::Ron),
        Some("json") => Ok(ConfigFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Parse config text without touching the filesystem. Paths stay as written.
pub fn parse_config(
    text: &str,
    format: ConfigFormat,
    file: &Path,
) -> Result<BuildConfig, ConfigError> {
    let parse_err = |detail: String| ConfigError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        ConfigFormat::Toml => toml::from_str(text).map_err(|e| parse_err(e.to_string())),
        ConfigFormat::Ron => ron::from_str(text).map_err(|e| parse_err(e.to_string())),
        ConfigFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read a config file and resolve its relative paths.
pub fn load_config(path: &Path) -> Result<BuildConfig, ConfigError> {
    let format = detect_format(path)?;
    let text = std::fs::read_to_string(path)?;
    let mut config = parse_config(&text, format, path)?;
    // `Path::parent` of a bare file name is empty; anchor at the cwd instead.
    let base = std::path::absolute(path)?
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    config.resolve_paths(&base);
    log::debug!("loaded build config from {}", path.display());
    Ok(config)
}

/// Load `spwnforge.toml` from `dir` if present, otherwise the defaults with
/// paths resolved against `dir`.
pub fn discover_config(dir: &Path) -> Result<BuildConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.is_file() {
        return load_config(&path);
    }
    let mut config = BuildConfig::default();
    config.resolve_paths(dir);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = parse_config("", ConfigFormat::Toml, Path::new("x.toml")).unwrap();
        assert_eq!(config, BuildConfig::default());
        assert_eq!(config.workspace.output_file, "compiled.spwn");
        assert!(!config.workspace.keep);
        assert_eq!(config.builder.program, "spwn");
        assert_eq!(config.emit.offset, 100.0);
        assert_eq!(config.library_dirs, [PathBuf::from("utils"), PathBuf::from("libs")]);
    }

    #[test]
    fn toml_sections_override_defaults() {
        let text = r#"
library_dirs = ["vendor"]
engine_dir = "core"

[workspace]
prefix = "lvl-"
keep = true

[emit]
offset = 0.0
script_mode = "disabled"
decorate = false
imports = [{ binding = "std", module = "std.spwn" }]

[builder]
program = "/opt/spwn"
timeout_secs = 30
"#;
        let config = parse_config(text, ConfigFormat::Toml, Path::new("spwnforge.toml")).unwrap();
        assert_eq!(config.workspace.prefix, "lvl-");
        assert!(config.workspace.keep);
        assert_eq!(config.workspace.output_file, "compiled.spwn");
        assert_eq!(config.library_dirs, [PathBuf::from("vendor")]);
        assert_eq!(config.engine_dir, Some(PathBuf::from("core")));
        assert_eq!(config.emit.script_mode, ScriptMode::Disabled);
        assert_eq!(config.emit.imports, [Import::new("std", "std.spwn")]);
        assert!(matches!(config.emit.decoration(), Decoration::Off));
        assert_eq!(config.builder.program, "/opt/spwn");
        assert_eq!(config.builder.args, ["build"]);
        assert_eq!(config.builder.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn json_and_ron_are_accepted() {
        let json = r#"{ "strict": true, "workspace": { "keep": true }, "builder": { "skip": true } }"#;
        let config = parse_config(json, ConfigFormat::Json, Path::new("c.json")).unwrap();
        assert!(config.strict);
        assert!(config.workspace.keep);
        assert!(config.builder.skip);

        let ron = "(emit: (seed: Some(5)))";
        let config = parse_config(ron, ConfigFormat::Ron, Path::new("c.ron")).unwrap();
        assert_eq!(config.emit.seed, Some(5));
    }

    #[test]
    fn bad_config_reports_file() {
        let text = "[workspace]\nkeep = \"yes\"";
        let err = parse_config(text, ConfigFormat::Toml, Path::new("bad.toml")).unwrap_err();
        match err {
            ConfigError::Parse { file, .. } => assert_eq!(file, PathBuf::from("bad.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            detect_format(Path::new("spwnforge.yaml")),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spwnforge.toml");
        std::fs::write(
            &path,
            "library_dirs = [\"utils\", \"/abs/libs\"]\n[workspace]\nroot = \"out\"\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.library_dirs[0], dir.path().join("utils"));
        assert_eq!(config.library_dirs[1], PathBuf::from("/abs/libs"));
        assert_eq!(config.workspace.root, dir.path().join("out"));
        assert_eq!(config.engine_dir, Some(dir.path().join("engine")));
    }

    #[test]
    fn relative_config_path_yields_absolute_paths() {
        let dir = tempfile::tempdir_in(".").unwrap();
        assert!(dir.path().is_relative());
        let path = dir.path().join("spwnforge.toml");
        std::fs::write(&path, "[workspace]\nroot = \"out\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert!(config.workspace.root.is_absolute());
        assert!(config.workspace.root.ends_with("out"));
        assert!(config.library_dirs.iter().all(|d| d.is_absolute()));
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = discover_config(dir.path()).unwrap();
        assert_eq!(config.library_dirs[0], dir.path().join("utils"));
        assert_eq!(config.workspace.root, std::env::temp_dir());
    }
}
