use std::fmt;

use crate::ecs::entity::{Entity, Generation};

/// A weak, generation checked reference to an entity.
///
/// An `EntityRef` is a relation, never an ownership edge: holding one keeps nothing alive. It
/// must be resolved through [`Manager::resolve`](super::Manager::resolve) before use, which fails
/// once the referenced entity has been destroyed (even if its id has since been recycled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    entity: Entity,
    generation: Generation,
}

impl EntityRef {
    /// The empty reference, pointing at nothing.
    pub const EMPTY: EntityRef = EntityRef {
        entity: Entity(u32::MAX),
        generation: Generation::FIRST,
    };

    #[inline]
    pub const fn new(entity: Entity, generation: Generation) -> Self {
        Self { entity, generation }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entity.0 == u32::MAX
    }

    /// The referenced entity id, unless this reference is empty. The entity is *not* checked
    /// for liveness.
    #[inline]
    pub fn entity(&self) -> Option<Entity> {
        (!self.is_empty()).then_some(self.entity)
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl Default for EntityRef {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entity() {
            Some(entity) => write!(f, "{entity}@{}", self.generation.value()),
            None => f.write_str("<empty>"),
        }
    }
}
