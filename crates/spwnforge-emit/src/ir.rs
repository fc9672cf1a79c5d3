//! Typed statements produced by lowering and consumed by rendering.

use spwnforge_core::Color;
use spwnforge_core::id::{GroupId, ObjectTypeId, SceneId};

use crate::options::{Import, ScriptMode};
use crate::token::BlockToken;

/// Opaque engine source text, supplied by the caller and emitted verbatim
/// after the imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFragment {
    /// Where the text came from (file name). Not emitted.
    pub name: String,
    pub text: String,
}

impl EngineFragment {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// One object creation. Coordinates are already offset.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateObject {
    pub token: Option<BlockToken>,
    pub obj_id: ObjectTypeId,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub color: Color,
    pub group: GroupId,
    pub tags: Vec<String>,
}

/// A unit of output, in program order.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `//libs` marker that opens the preamble.
    LibsHeader,
    Import(Import),
    Engine(EngineFragment),
    SceneHeader { scene: SceneId, name: String },
    CreateObject(CreateObject),
    Script { text: String, mode: ScriptMode },
    SceneAdvance { scene: SceneId },
}

impl Statement {
    pub fn is_scene_header(&self) -> bool {
        matches!(self, Statement::SceneHeader { .. })
    }

    pub fn is_scene_advance(&self) -> bool {
        matches!(self, Statement::SceneAdvance { .. })
    }
}
