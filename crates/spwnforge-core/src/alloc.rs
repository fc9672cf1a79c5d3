//! Scene identifier allocation and per-scene group assignment.
//!
//! Scene ids are `SCENE_ID_BASE + counter` where the counter only ever grows.
//! The counter is persisted with the project and restored verbatim, so ids of
//! deleted scenes are never handed out again.
//!
//! Group numbers are a separate namespace: the n-th scene in emission order
//! gets group `n` (1-based). They are recomputed for every compile.

use slotmap::SecondaryMap;
use std::collections::HashSet;

use crate::id::{GroupId, SceneId, SceneKey};
use crate::model::Project;

/// Offset added to the scene counter to form a [`SceneId`].
pub const SCENE_ID_BASE: u32 = 1000;

/// Errors from allocating or confirming identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("scene id {0} is used by more than one scene")]
    DuplicateSceneId(SceneId),
    #[error("scene id {id} is outside the allocated range {first}..={last}")]
    OutOfRange { id: SceneId, first: u32, last: u32 },
    #[error("scene id space exhausted")]
    Exhausted,
}

// ---------------------------------------------------------------------------
// SceneIdAllocator
// ---------------------------------------------------------------------------

/// Monotonic scene id allocator. The counter is the only state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneIdAllocator {
    counter: u32,
}

impl SceneIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore an allocator from a persisted counter value.
    pub fn restore(counter: u32) -> Self {
        Self { counter }
    }

    /// Number of ids handed out so far (including those of deleted scenes).
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Allocate the next id. Irreversible.
    pub fn allocate(&mut self) -> Result<SceneId, AllocationError> {
        let next = self.counter.checked_add(1).ok_or(AllocationError::Exhausted)?;
        let id = SCENE_ID_BASE
            .checked_add(next)
            .ok_or(AllocationError::Exhausted)?;
        self.counter = next;
        Ok(SceneId(id))
    }

    /// Whether `id` has been handed out by this allocator.
    pub fn has_issued(&self, id: SceneId) -> bool {
        id.0 > SCENE_ID_BASE && id.0 - SCENE_ID_BASE <= self.counter
    }

    /// Check that every id was issued by this allocator and none repeats.
    pub fn confirm(&self, ids: impl IntoIterator<Item = SceneId>) -> Result<(), AllocationError> {
        let mut seen = HashSet::new();
        for id in ids {
            if !self.has_issued(id) {
                return Err(AllocationError::OutOfRange {
                    id,
                    first: SCENE_ID_BASE + 1,
                    last: SCENE_ID_BASE.saturating_add(self.counter),
                });
            }
            if !seen.insert(id) {
                return Err(AllocationError::DuplicateSceneId(id));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GroupPlan
// ---------------------------------------------------------------------------

/// Implicit group number for every scene, in emission order.
#[derive(Debug, Clone, Default)]
pub struct GroupPlan {
    order: Vec<(SceneKey, GroupId)>,
    groups: SecondaryMap<SceneKey, GroupId>,
}

impl GroupPlan {
    /// Number scenes 1..=N in the project's emission order.
    pub fn assign(project: &Project) -> Self {
        let mut plan = Self::default();
        for (position, (key, _)) in project.scenes().enumerate() {
            let group = GroupId(position as u32 + 1);
            plan.order.push((key, group));
            plan.groups.insert(key, group);
        }
        plan
    }

    pub fn group_of(&self, scene: SceneKey) -> Option<GroupId> {
        self.groups.get(scene).copied()
    }

    /// `(scene, group)` pairs in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (SceneKey, GroupId)> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Confirm the project's scene ids and assign group numbers. Run once per
/// compile, before emission.
pub fn prepare(project: &Project) -> Result<GroupPlan, AllocationError> {
    project
        .allocator()
        .confirm(project.scenes().map(|(_, scene)| scene.id()))?;
    Ok(GroupPlan::assign(project))
}
