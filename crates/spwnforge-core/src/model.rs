//! In-memory project model: scenes, placed objects, palette and scene counter.
//!
//! Scenes and objects live in slotmaps and are addressed by stable keys.
//! Emission order is a separate ordered list of scene keys (and, per scene,
//! of object keys), so deleting or reordering never invalidates a key held
//! by a caller.

use slotmap::{SecondaryMap, SlotMap};

use crate::alloc::{AllocationError, SceneIdAllocator};
use crate::color::{ColorResolution, Palette};
use crate::id::{ObjectKey, ObjectTypeId, SceneId, SceneKey};

/// Errors from model edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("scene not found")]
    SceneNotFound,
    #[error("object not found")]
    ObjectNotFound,
    #[error("position {position} is out of range (len {len})")]
    PositionOutOfRange { position: usize, len: usize },
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

// ---------------------------------------------------------------------------
// GameObject
// ---------------------------------------------------------------------------

/// A placed object. `script` is opaque target-language text and is never
/// inspected here.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    pub obj_id: ObjectTypeId,
    pub x: f64,
    pub y: f64,
    /// Degrees.
    pub rotation: f64,
    pub color_id: Option<String>,
    /// Explicit group tags, in insertion order.
    pub groups: Vec<String>,
    pub name: String,
    pub script: String,
}

impl GameObject {
    /// A new object at the origin with no rotation, color, tags or script.
    pub fn new(obj_id: ObjectTypeId) -> Self {
        Self {
            obj_id,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            color_id: None,
            groups: Vec::new(),
            name: format!("Object {obj_id}"),
            script: String::new(),
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Whether the object carries a script. Any non-empty text counts,
    /// whitespace included; it is emitted verbatim.
    pub fn has_script(&self) -> bool {
        !self.script.is_empty()
    }

    /// Add a group tag unless it is already present.
    pub fn add_group_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.groups.contains(&tag) {
            return false;
        }
        self.groups.push(tag);
        true
    }

    pub fn remove_group_tag(&mut self, tag: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|t| t != tag);
        self.groups.len() != before
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A named, ordered container of objects. The id is fixed at creation.
#[derive(Debug, Clone)]
pub struct Scene {
    id: SceneId,
    pub name: String,
    objects: Vec<ObjectKey>,
}

impl Scene {
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Object keys in z/emission order.
    pub fn object_keys(&self) -> &[ObjectKey] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// The aggregate edited by the user and consumed by the compiler.
#[derive(Debug, Clone, Default)]
pub struct Project {
    scenes: SlotMap<SceneKey, Scene>,
    order: Vec<SceneKey>,
    objects: SlotMap<ObjectKey, GameObject>,
    owners: SecondaryMap<ObjectKey, SceneKey>,
    allocator: SceneIdAllocator,
    pub palette: Palette,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty project whose scene counter resumes from `scene_counter`.
    pub fn with_scene_counter(scene_counter: u32, palette: Palette) -> Self {
        Self {
            allocator: SceneIdAllocator::restore(scene_counter),
            palette,
            ..Self::default()
        }
    }

    pub fn allocator(&self) -> &SceneIdAllocator {
        &self.allocator
    }

    pub fn scene_counter(&self) -> u32 {
        self.allocator.counter()
    }

    // --- Scenes ---

    /// Create a scene at the end of the emission order, allocating its id.
    pub fn add_scene(&mut self, name: impl Into<String>) -> Result<SceneKey, ModelError> {
        let id = self.allocator.allocate()?;
        Ok(self.push_scene(id, name.into()))
    }

    /// Create a scene named `Scene {n}`, where `n` is the new scene count.
    pub fn add_default_scene(&mut self) -> Result<SceneKey, ModelError> {
        let name = format!("Scene {}", self.order.len() + 1);
        self.add_scene(name)
    }

    /// Append a scene with an already-issued id and its objects. Used when
    /// restoring a document; the caller confirms ids against the allocator.
    pub(crate) fn restore_scene(
        &mut self,
        id: SceneId,
        name: String,
        objects: impl IntoIterator<Item = GameObject>,
    ) -> SceneKey {
        let key = self.push_scene(id, name);
        for object in objects {
            let obj = self.objects.insert(object);
            self.owners.insert(obj, key);
            self.scenes[key].objects.push(obj);
        }
        key
    }

    fn push_scene(&mut self, id: SceneId, name: String) -> SceneKey {
        let key = self.scenes.insert(Scene {
            id,
            name,
            objects: Vec::new(),
        });
        self.order.push(key);
        key
    }

    /// Delete a scene and all its objects. The scene counter is untouched.
    pub fn delete_scene(&mut self, key: SceneKey) -> Result<(), ModelError> {
        let scene = self.scenes.remove(key).ok_or(ModelError::SceneNotFound)?;
        for obj in scene.objects {
            self.objects.remove(obj);
            self.owners.remove(obj);
        }
        self.order.retain(|k| *k != key);
        Ok(())
    }

    /// Delete the scene at `position` in emission order, returning its key.
    pub fn delete_scene_at(&mut self, position: usize) -> Result<SceneKey, ModelError> {
        let key = self.scene_key_at(position).ok_or(ModelError::PositionOutOfRange {
            position,
            len: self.order.len(),
        })?;
        self.delete_scene(key)?;
        Ok(key)
    }

    /// Move a scene to `position` in emission order. Ids are unaffected.
    pub fn move_scene(&mut self, key: SceneKey, position: usize) -> Result<(), ModelError> {
        let from = self.position_of(key).ok_or(ModelError::SceneNotFound)?;
        if position >= self.order.len() {
            return Err(ModelError::PositionOutOfRange {
                position,
                len: self.order.len(),
            });
        }
        let key = self.order.remove(from);
        self.order.insert(position, key);
        Ok(())
    }

    pub fn rename_scene(&mut self, key: SceneKey, name: impl Into<String>) -> Result<(), ModelError> {
        let scene = self.scenes.get_mut(key).ok_or(ModelError::SceneNotFound)?;
        scene.name = name.into();
        Ok(())
    }

    pub fn scene(&self, key: SceneKey) -> Option<&Scene> {
        self.scenes.get(key)
    }

    pub fn scene_key_at(&self, position: usize) -> Option<SceneKey> {
        self.order.get(position).copied()
    }

    pub fn position_of(&self, key: SceneKey) -> Option<usize> {
        self.order.iter().position(|k| *k == key)
    }

    pub fn find_scene(&self, id: SceneId) -> Option<SceneKey> {
        self.order.iter().copied().find(|k| self.scenes[*k].id == id)
    }

    /// Scenes in emission order.
    pub fn scenes(&self) -> impl Iterator<Item = (SceneKey, &Scene)> + '_ {
        self.order.iter().map(move |k| (*k, &self.scenes[*k]))
    }

    pub fn scene_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // --- Objects ---

    /// `max(obj_id) + 1` over the scene's objects, or 1 for an empty scene.
    pub fn next_object_id(&self, scene: SceneKey) -> Result<ObjectTypeId, ModelError> {
        let scene = self.scenes.get(scene).ok_or(ModelError::SceneNotFound)?;
        let max = scene
            .objects
            .iter()
            .map(|k| self.objects[*k].obj_id.0)
            .max()
            .unwrap_or(0);
        Ok(ObjectTypeId(max.saturating_add(1)))
    }

    /// Add a default object to the end of a scene. Without an explicit type
    /// id, [`next_object_id`](Self::next_object_id) is used.
    pub fn add_object(
        &mut self,
        scene: SceneKey,
        obj_id: Option<ObjectTypeId>,
    ) -> Result<ObjectKey, ModelError> {
        let obj_id = match obj_id {
            Some(id) => id,
            None => self.next_object_id(scene)?,
        };
        self.insert_object(scene, GameObject::new(obj_id))
    }

    /// Append a fully specified object to a scene.
    pub fn insert_object(
        &mut self,
        scene: SceneKey,
        object: GameObject,
    ) -> Result<ObjectKey, ModelError> {
        if !self.scenes.contains_key(scene) {
            return Err(ModelError::SceneNotFound);
        }
        let key = self.objects.insert(object);
        self.owners.insert(key, scene);
        self.scenes[scene].objects.push(key);
        Ok(key)
    }

    /// Remove one object from its scene. Group numbering is per scene and
    /// does not change.
    pub fn remove_object(&mut self, key: ObjectKey) -> Result<GameObject, ModelError> {
        let object = self.objects.remove(key).ok_or(ModelError::ObjectNotFound)?;
        if let Some(scene) = self.owners.remove(key) {
            if let Some(scene) = self.scenes.get_mut(scene) {
                scene.objects.retain(|k| *k != key);
            }
        }
        Ok(object)
    }

    pub fn object(&self, key: ObjectKey) -> Option<&GameObject> {
        self.objects.get(key)
    }

    pub fn object_mut(&mut self, key: ObjectKey) -> Option<&mut GameObject> {
        self.objects.get_mut(key)
    }

    pub fn scene_of(&self, key: ObjectKey) -> Option<SceneKey> {
        self.owners.get(key).copied()
    }

    /// A scene's objects in emission order. Empty for an unknown scene.
    pub fn objects_in(&self, scene: SceneKey) -> impl Iterator<Item = (ObjectKey, &GameObject)> + '_ {
        self.scenes
            .get(scene)
            .map(|s| s.objects.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |k| (*k, &self.objects[*k]))
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Resolve an object's color key against the project palette.
    pub fn resolve_color<'a>(&self, object: &'a GameObject) -> ColorResolution<'a> {
        self.palette.resolve(object.color_id.as_deref())
    }
}

/// Structural equality: counter, palette, and scenes/objects in order.
/// Keys are not compared.
impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        if self.scene_counter() != other.scene_counter()
            || self.palette != other.palette
            || self.scene_count() != other.scene_count()
        {
            return false;
        }
        self.scenes().zip(other.scenes()).all(|((ka, a), (kb, b))| {
            a.id == b.id
                && a.name == b.name
                && a.objects.len() == b.objects.len()
                && self
                    .objects_in(ka)
                    .map(|(_, o)| o)
                    .eq(other.objects_in(kb).map(|(_, o)| o))
        })
    }
}
