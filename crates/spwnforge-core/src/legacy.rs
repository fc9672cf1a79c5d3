//! The original editor's line-based `.proj` format.
//!
//! ```text
//! Scene: Intro
//! Object 1: (10, 20)
//! Script: $.print("hi")
//!
//! Scene: Outro
//! ```
//!
//! Only scene names, object type ids, positions and single-line scripts are
//! representable. The format carries no scene ids or counter, so import
//! allocates fresh ids in file order.

use std::fmt::Write as _;

use crate::document::{DocumentError, Format};
use crate::id::ObjectTypeId;
use crate::model::{GameObject, Project};

const SCENE_PREFIX: &str = "Scene:";
const OBJECT_PREFIX: &str = "Object ";
const SCRIPT_PREFIX: &str = "Script:";

fn malformed(line_no: usize, detail: impl Into<String>) -> DocumentError {
    DocumentError::Malformed {
        format: Format::Legacy,
        detail: format!("line {line_no}: {}", detail.into()),
    }
}

/// Parse `Object <id>: (<x>, <y>)`.
fn parse_object_line(rest: &str, line_no: usize) -> Result<GameObject, DocumentError> {
    let (id, coords) = rest
        .split_once(':')
        .ok_or_else(|| malformed(line_no, "expected 'Object <id>: (<x>, <y>)'"))?;
    let obj_id: u32 = id
        .trim()
        .parse()
        .map_err(|_| malformed(line_no, format!("bad object id '{}'", id.trim())))?;
    let coords = coords
        .trim()
        .strip_prefix('(')
        .and_then(|c| c.strip_suffix(')'))
        .ok_or_else(|| malformed(line_no, "expected parenthesised position"))?;
    let (x, y) = coords
        .split_once(',')
        .ok_or_else(|| malformed(line_no, "expected 'x, y'"))?;
    let coord = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| malformed(line_no, format!("bad coordinate '{}'", s.trim())))
    };

    let mut object = GameObject::new(ObjectTypeId(obj_id));
    object.set_position(coord(x)?, coord(y)?);
    Ok(object)
}

/// Import a legacy project. Scenes get fresh ids in file order, so the
/// resulting scene counter equals the scene count.
pub fn import(text: &str) -> Result<Project, DocumentError> {
    let mut project = Project::new();
    let mut current_scene = None;
    let mut last_object = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix(SCENE_PREFIX) {
            let key = project
                .add_scene(name.trim_start())
                .map_err(|e| malformed(line_no, e.to_string()))?;
            current_scene = Some(key);
            last_object = None;
        } else if let Some(rest) = line.strip_prefix(OBJECT_PREFIX) {
            let scene = current_scene.ok_or_else(|| malformed(line_no, "object before any scene"))?;
            let object = parse_object_line(rest, line_no)?;
            let key = project
                .insert_object(scene, object)
                .map_err(|e| malformed(line_no, e.to_string()))?;
            last_object = Some(key);
        } else if let Some(script) = line.strip_prefix(SCRIPT_PREFIX) {
            let key = last_object.ok_or_else(|| malformed(line_no, "script before any object"))?;
            if let Some(object) = project.object_mut(key) {
                object.script = script.trim_start().to_string();
            }
        } else {
            return Err(malformed(line_no, format!("unrecognised line '{line}'")));
        }
    }

    Ok(project)
}

/// Export in the legacy format. Multi-line scripts are joined onto one line.
pub fn export(project: &Project) -> String {
    let mut out = String::new();
    for (key, scene) in project.scenes() {
        let _ = writeln!(out, "{SCENE_PREFIX} {}", scene.name.replace(['\r', '\n'], " "));
        for (_, obj) in project.objects_in(key) {
            let _ = writeln!(out, "{OBJECT_PREFIX}{}: ({}, {})", obj.obj_id, obj.x, obj.y);
            let joined = obj
                .script
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !joined.is_empty() {
                let _ = writeln!(out, "{SCRIPT_PREFIX} {joined}");
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SceneId;

    const SAMPLE: &str = "Scene: Scene 1\n\
                          Object 1: (10, 20)\n\
                          Script: $.print(\"hi\")\n\
                          Object 2: (-5, 0)\n\
                          \n\
                          Scene: Scene 2\n\
                          \n";

    #[test]
    fn imports_scenes_objects_and_scripts() {
        let project = import(SAMPLE).unwrap();
        assert_eq!(project.scene_count(), 2);
        assert_eq!(project.scene_counter(), 2);

        let first = project.scene_key_at(0).unwrap();
        assert_eq!(project.scene(first).unwrap().id(), SceneId(1001));
        let objects: Vec<_> = project.objects_in(first).map(|(_, o)| o.clone()).collect();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].obj_id, ObjectTypeId(1));
        assert_eq!(objects[0].position(), (10.0, 20.0));
        assert_eq!(objects[0].script, "$.print(\"hi\")");
        assert_eq!(objects[1].position(), (-5.0, 0.0));
        assert!(objects[1].script.is_empty());
    }

    #[test]
    fn export_then_import_keeps_representable_fields() {
        let project = import(SAMPLE).unwrap();
        let again = import(&export(&project)).unwrap();
        assert_eq!(again, project);
    }

    #[test]
    fn multi_line_script_is_joined() {
        let mut project = Project::new();
        let s = project.add_scene("S").unwrap();
        let k = project.add_object(s, None).unwrap();
        project.object_mut(k).unwrap().script = "let a = 1\n  $.print(a)\n".into();
        let text = export(&project);
        assert!(text.contains("Script: let a = 1 $.print(a)\n"));
    }

    #[test]
    fn object_before_scene_is_malformed() {
        let err = import("Object 1: (0, 0)\n").unwrap_err();
        assert!(err.to_string().contains("line 1"), "{err}");
    }

    #[test]
    fn bad_coordinates_are_malformed() {
        assert!(import("Scene: S\nObject 1: (a, 0)\n").is_err());
        assert!(import("Scene: S\nObject 1: 0, 0\n").is_err());
        assert!(import("Scene: S\nObject x: (0, 0)\n").is_err());
    }

    #[test]
    fn empty_scene_name_survives() {
        let project = import("Scene:\nObject 1: (0, 0)\n").unwrap();
        let key = project.scene_key_at(0).unwrap();
        assert_eq!(project.scene(key).unwrap().name, "");
        assert_eq!(project.scene(key).unwrap().len(), 1);
    }

    #[test]
    fn unknown_lines_are_malformed() {
        assert!(import("Scene: S\nWidget 3\n").is_err());
    }
}
