//! Shared test fixtures for unit tests, integration tests and downstream
//! crates (via the `test-utils` feature).

use crate::color::{Color, Palette};
use crate::id::{ObjectKey, ObjectTypeId, SceneKey};
use crate::model::{GameObject, Project};

// ===========================================================================
// Object constructors
// ===========================================================================

pub fn object_at(obj_id: u32, x: f64, y: f64) -> GameObject {
    let mut obj = GameObject::new(ObjectTypeId(obj_id));
    obj.set_position(x, y);
    obj
}

pub fn scripted(obj_id: u32, x: f64, y: f64, script: &str) -> GameObject {
    let mut obj = object_at(obj_id, x, y);
    obj.script = script.to_string();
    obj
}

pub fn place(project: &mut Project, scene: SceneKey, object: GameObject) -> ObjectKey {
    project.insert_object(scene, object).unwrap()
}

pub fn sample_palette() -> Palette {
    let mut palette = Palette::new();
    palette.insert("red", Color::rgb(0xFF, 0x00, 0x00));
    palette.insert("gold", Color::rgb(0xFF, 0xD7, 0x00));
    palette
}

// ===========================================================================
// Projects
// ===========================================================================

/// Two scenes, "Intro" (id 1001) and "Outro" (id 1003). A scene created in
/// between was deleted, so the counter is 3.
///
/// Intro holds a red block at (10, 20) tagged `floor`, and a scripted spike
/// at (-5, 0) whose color key is not in the palette. Outro holds one plain
/// block.
pub fn sample_project() -> Project {
    let mut project = Project::with_scene_counter(0, sample_palette());
    let intro = project.add_scene("Intro").unwrap();
    let scratch = project.add_scene("Scratch").unwrap();
    let outro = project.add_scene("Outro").unwrap();
    project.delete_scene(scratch).unwrap();

    let mut block = object_at(1, 10.0, 20.0);
    block.color_id = Some("red".into());
    block.groups = vec!["floor".into()];
    block.name = "Floor".into();
    place(&mut project, intro, block);

    let mut spike = scripted(8, -5.0, 0.0, "$.print(\"spike\")");
    spike.rotation = 90.0;
    spike.color_id = Some("missing".into());
    place(&mut project, intro, spike);

    place(&mut project, outro, object_at(1, 300.0, 45.5));
    project
}

/// A project with `scenes` scenes of `per_scene` plain objects each.
pub fn grid_project(scenes: usize, per_scene: usize) -> Project {
    let mut project = Project::new();
    for s in 0..scenes {
        let key = project.add_default_scene().unwrap();
        for i in 0..per_scene {
            place(
                &mut project,
                key,
                object_at(i as u32 + 1, (i * 30) as f64, (s * 30) as f64),
            );
        }
    }
    project
}
