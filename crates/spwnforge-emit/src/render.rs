//! Rendering: statements → program text.
//!
//! Pure string formatting. Each statement renders to whole lines; the
//! output always ends with a newline.

use std::fmt::Write as _;

use crate::ir::{CreateObject, Statement};
use crate::options::ScriptMode;

/// Marker closing every scene block.
pub const SCENE_ADVANCE: &str = "next_scene();";

/// Prefix of every scene header comment.
pub const SCENE_HEADER_PREFIX: &str = "// Scene: ";

/// Prefix of a commented-out script line. Distinct from a plain `// ` so a
/// script line can never read as a scene header.
pub const DISABLED_SCRIPT_PREFIX: &str = "//|";

/// Shortest decimal that round-trips; integral values have no fraction and
/// negative zero prints as `0`.
pub fn number(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v}")
    }
}

/// Double-quoted string literal with `\`, `"` and control characters escaped.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn one_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

fn render_object(out: &mut String, obj: &CreateObject) {
    match obj.token {
        Some(token) => {
            let _ = writeln!(out, "let block_{token} = {{");
        }
        None => out.push_str("let block = {\n"),
    }
    let _ = writeln!(out, "    id: {},", obj.obj_id);
    let _ = writeln!(out, "    x: {},", number(obj.x));
    let _ = writeln!(out, "    y: {},", number(obj.y));
    let _ = writeln!(out, "    rotation: {},", number(obj.rotation));
    let _ = writeln!(out, "    color: {},", quote(&obj.color.to_hex()));
    let _ = writeln!(out, "    group: {},", obj.group);
    if !obj.tags.is_empty() {
        let tags: Vec<String> = obj.tags.iter().map(|t| quote(t)).collect();
        let _ = writeln!(out, "    tags: [{}],", tags.join(", "));
    }
    out.push_str("};\n");
}

fn render_script(out: &mut String, text: &str, mode: ScriptMode) {
    match mode {
        ScriptMode::Inline => {
            out.push_str("{\n");
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("}\n");
        }
        ScriptMode::Disabled => {
            for line in text.lines() {
                if line.is_empty() {
                    let _ = writeln!(out, "{DISABLED_SCRIPT_PREFIX}");
                } else {
                    let _ = writeln!(out, "{DISABLED_SCRIPT_PREFIX} {line}");
                }
            }
        }
    }
}

/// Render one statement onto `out`.
pub fn render_statement(out: &mut String, statement: &Statement) {
    match statement {
        Statement::LibsHeader => out.push_str("//libs\n"),
        Statement::Import(import) => {
            let _ = writeln!(
                out,
                "let {} = import {};",
                import.binding,
                quote(&import.module)
            );
        }
        Statement::Engine(fragment) => {
            out.push_str(&fragment.text);
            if !fragment.text.is_empty() && !fragment.text.ends_with('\n') {
                out.push('\n');
            }
        }
        Statement::SceneHeader { name, .. } => {
            let _ = writeln!(out, "\n{SCENE_HEADER_PREFIX}{}", one_line(name));
        }
        Statement::CreateObject(obj) => render_object(out, obj),
        Statement::Script { text, mode } => render_script(out, text, *mode),
        Statement::SceneAdvance { .. } => {
            out.push_str(SCENE_ADVANCE);
            out.push('\n');
        }
    }
}

/// Render a statement list into a complete program.
pub fn render(statements: &[Statement]) -> String {
    let mut out = String::new();
    for statement in statements {
        render_statement(&mut out, statement);
    }
    out
}
