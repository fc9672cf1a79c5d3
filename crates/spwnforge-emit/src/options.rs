use serde::{Deserialize, Serialize};

/// Offset added to both coordinates so objects never land at negative
/// positions in the target coordinate system.
pub const COORDINATE_OFFSET: f64 = 100.0;

/// How object scripts are written into the program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptMode {
    /// Wrapped in a `{ ... }` block and executed.
    #[default]
    Inline,
    /// Every line commented out with `// `.
    Disabled,
}

/// A module import in the preamble: `let <binding> = import "<module>";`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub binding: String,
    pub module: String,
}

impl Import {
    pub fn new(binding: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            binding: binding.into(),
            module: module.into(),
        }
    }
}

/// The libraries every generated program imports unless configured otherwise.
pub fn default_imports() -> Vec<Import> {
    vec![
        Import::new("isNumber", "is-number"),
        Import::new("spwngen", "spwngen.spwn"),
        Import::new("gameoflife", "gameoflife.spwn"),
        Import::new("collection", "collection.spwn"),
        Import::new("xor", "xor.spwn"),
    ]
}

/// Knobs for lowering a project into statements.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitOptions {
    pub coordinate_offset: f64,
    pub script_mode: ScriptMode,
    pub imports: Vec<Import>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            coordinate_offset: COORDINATE_OFFSET,
            script_mode: ScriptMode::default(),
            imports: default_imports(),
        }
    }
}
