//! Entity management for the ECS.
//!
//! Entities are opaque integer handles. The [`Manager`] hands out the lowest free id, tracks
//! which ids are alive, and keeps one component signature (a bit per registered component) for
//! each live entity so that "does this entity have component X" is a single bit test.
//!
//! # Generation Tracking
//!
//! Every id slot carries a [`Generation`]. Destroying an entity bumps the generation of its
//! slot, so an [`EntityRef`] captured before the destruction no longer resolves, even after the
//! id has been handed out again:
//!
//! ```rust
//! use pivot_engine::ecs::entity::Manager;
//!
//! let mut entities = Manager::default();
//! let first = entities.create();
//! let weak = entities.entity_ref(first).unwrap();
//! entities.destroy(first).unwrap();
//!
//! let reused = entities.create();
//! assert_eq!(first, reused);
//! assert_eq!(entities.resolve(weak), None);
//! ```
//!
//! # Recycling
//!
//! Ids are only recycled through [`Manager::destroy`]. The scene is responsible for removing the
//! entity from every component array before the id is released, so a recycled id never observes
//! stale component values.

mod reference;

use std::{collections::BTreeSet, fmt};

use fixedbitset::FixedBitSet;
use log::warn;
use serde::{Deserialize, Serialize};

pub use reference::EntityRef;

use crate::ecs::{Error, Result, component};

/// The generation of an entity slot. Starts at `FIRST` and is incremented each time the entity
/// occupying the slot is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u32);

impl Generation {
    /// The first generation of an entity.
    pub const FIRST: Self = Self(0);

    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the next generation from the current.
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// An entity identifier, unique among the live entities of one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(u32);

impl Entity {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.0
    }

    /// Get the index of this entity if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Entity {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Highest id (exclusive) [`Manager::create_at`] accepts. `u32::MAX` itself marks an empty
/// [`EntityRef`].
pub const MAX_ENTITIES: u32 = 1 << 24;

/// Allocates entity ids and tracks the component signature of every live entity.
#[derive(Debug, Default)]
pub struct Manager {
    /// Current generation of every slot ever handed out, indexed by id.
    generations: Vec<Generation>,

    /// Live ids.
    alive: FixedBitSet,

    /// One bit per component id, indexed by entity id. Cleared on destroy.
    signatures: Vec<FixedBitSet>,

    /// Destroyed ids available for reuse. Ordered so the lowest id is reused first.
    free: BTreeSet<u32>,

    /// Next never-used id.
    next_id: u32,

    count: usize,
}

impl Manager {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity, reusing the lowest destroyed id if there is one.
    pub fn create(&mut self) -> Entity {
        let id = match self.free.pop_first() {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        };
        let entity = Entity(id);
        self.activate(entity);
        entity
    }

    /// Create an entity with a specific id, as needed when restoring a saved scene.
    ///
    /// Ids at or above [`MAX_ENTITIES`] are rejected. The ids skipped below a new high id are
    /// added to the free list, so the limit also bounds that list.
    pub fn create_at(&mut self, entity: Entity) -> Result<()> {
        if entity.0 >= MAX_ENTITIES {
            return Err(Error::EntityOutOfRange {
                entity,
                limit: MAX_ENTITIES,
            });
        }
        if self.is_alive(entity) {
            return Err(Error::EntityAlreadyAlive(entity));
        }
        if entity.0 >= self.next_id {
            self.free.extend(self.next_id..entity.0);
            self.next_id = entity.0 + 1;
        } else {
            self.free.remove(&entity.0);
        }
        self.activate(entity);
        Ok(())
    }

    fn activate(&mut self, entity: Entity) {
        let index = entity.index();
        if index >= self.generations.len() {
            self.generations.resize(index + 1, Generation::FIRST);
            self.signatures.resize_with(index + 1, FixedBitSet::new);
        }
        self.alive.grow(index + 1);
        self.alive.insert(index);
        self.count += 1;
    }

    /// Destroy an entity, releasing its id and clearing its signature.
    ///
    /// The caller must already have removed the entity from every component array.
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        if !self.is_alive(entity) {
            warn!("Attempted to destroy unknown entity {entity}");
            return Err(Error::UnknownEntity(entity));
        }
        let index = entity.index();
        self.alive.set(index, false);
        self.signatures[index].clear();
        self.generations[index] = self.generations[index].next();
        self.free.insert(entity.0);
        self.count -= 1;
        Ok(())
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(entity.index())
    }

    /// The component signature of a live entity.
    #[inline]
    pub fn signature(&self, entity: Entity) -> Option<&FixedBitSet> {
        self.is_alive(entity)
            .then(|| &self.signatures[entity.index()])
    }

    /// Set or clear the bit for a component in an entity's signature.
    pub fn set_signature_bit(
        &mut self,
        entity: Entity,
        component: component::Id,
        present: bool,
    ) -> Result<()> {
        if !self.is_alive(entity) {
            return Err(Error::UnknownEntity(entity));
        }
        let signature = &mut self.signatures[entity.index()];
        if present {
            signature.grow(component.index() + 1);
            signature.insert(component.index());
        } else if component.index() < signature.len() {
            signature.set(component.index(), false);
        }
        Ok(())
    }

    #[inline]
    pub fn has_component(&self, entity: Entity, component: component::Id) -> bool {
        self.signature(entity)
            .is_some_and(|signature| signature.contains(component.index()))
    }

    /// A weak reference to a live entity, stamped with its current generation.
    pub fn entity_ref(&self, entity: Entity) -> Option<EntityRef> {
        self.is_alive(entity)
            .then(|| EntityRef::new(entity, self.generations[entity.index()]))
    }

    /// Resolve a weak reference. Fails if the reference is empty, or the entity has been
    /// destroyed since the reference was taken.
    pub fn resolve(&self, reference: EntityRef) -> Option<Entity> {
        let entity = reference.entity()?;
        (self.is_alive(entity) && self.generations[entity.index()] == reference.generation())
            .then_some(entity)
    }

    /// Every live entity, in ascending id order.
    pub fn alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.ones().map(|index| Entity(index as u32))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_sequential() {
        // Given
        let mut manager = Manager::new();

        // When
        let entities: Vec<_> = (0..5).map(|_| manager.create()).collect();

        // Then
        assert_eq!(
            entities,
            (0..5).map(Entity::new).collect::<Vec<_>>()
        );
        assert_eq!(manager.len(), 5);
    }

    #[test]
    fn destroy_recycles_lowest_id_first() {
        // Given
        let mut manager = Manager::new();
        for _ in 0..5 {
            manager.create();
        }

        // When
        manager.destroy(Entity::new(3)).unwrap();
        manager.destroy(Entity::new(1)).unwrap();

        // Then
        assert_eq!(manager.create(), Entity::new(1));
        assert_eq!(manager.create(), Entity::new(3));
        assert_eq!(manager.create(), Entity::new(5));
    }

    #[test]
    fn destroy_unknown_entity_fails() {
        let mut manager = Manager::new();
        let entity = manager.create();
        manager.destroy(entity).unwrap();

        assert_eq!(
            manager.destroy(entity),
            Err(Error::UnknownEntity(entity))
        );
        assert_eq!(
            manager.destroy(Entity::new(42)),
            Err(Error::UnknownEntity(Entity::new(42)))
        );
    }

    #[test]
    fn destroy_clears_signature() {
        // Given
        let mut manager = Manager::new();
        let entity = manager.create();
        let component = component::Id::new(3);
        manager.set_signature_bit(entity, component, true).unwrap();
        assert!(manager.has_component(entity, component));

        // When
        manager.destroy(entity).unwrap();
        let reused = manager.create();

        // Then
        assert_eq!(reused, entity);
        assert!(!manager.has_component(reused, component));
        assert_eq!(manager.signature(reused).map(|s| s.count_ones(..)), Some(0));
    }

    #[test]
    fn stale_references_do_not_resolve() {
        // Given
        let mut manager = Manager::new();
        let entity = manager.create();
        let weak = manager.entity_ref(entity).unwrap();
        assert_eq!(manager.resolve(weak), Some(entity));

        // When
        manager.destroy(entity).unwrap();
        let reused = manager.create();

        // Then
        assert_eq!(reused, entity);
        assert_eq!(manager.resolve(weak), None);
        let fresh = manager.entity_ref(reused).unwrap();
        assert_eq!(fresh.generation(), Generation::FIRST.next());
        assert_eq!(manager.resolve(fresh), Some(reused));
        assert_eq!(manager.resolve(EntityRef::EMPTY), None);
    }

    #[test]
    fn create_at_fills_gaps_into_the_free_list() {
        // Given
        let mut manager = Manager::new();

        // When
        manager.create_at(Entity::new(3)).unwrap();
        assert_eq!(
            manager.create_at(Entity::new(3)),
            Err(Error::EntityAlreadyAlive(Entity::new(3)))
        );

        // Then
        assert_eq!(manager.alive().collect::<Vec<_>>(), vec![Entity::new(3)]);
        assert_eq!(manager.create(), Entity::new(0));
        assert_eq!(manager.create(), Entity::new(1));
        assert_eq!(manager.create(), Entity::new(2));
        assert_eq!(manager.create(), Entity::new(4));
    }

    #[test]
    fn create_at_rejects_out_of_range_ids() {
        let mut manager = Manager::new();

        for id in [MAX_ENTITIES, u32::MAX] {
            assert_eq!(
                manager.create_at(Entity::new(id)),
                Err(Error::EntityOutOfRange {
                    entity: Entity::new(id),
                    limit: MAX_ENTITIES,
                })
            );
        }
        assert_eq!(manager.len(), 0);
        assert_eq!(manager.create(), Entity::new(0));
    }

    #[test]
    fn alive_is_ascending() {
        let mut manager = Manager::new();
        for _ in 0..4 {
            manager.create();
        }
        manager.destroy(Entity::new(2)).unwrap();

        let alive: Vec<_> = manager.alive().collect();
        assert_eq!(alive, vec![Entity::new(0), Entity::new(1), Entity::new(3)]);
    }

    #[test]
    fn empty_reference() {
        assert!(EntityRef::EMPTY.is_empty());
        assert_eq!(EntityRef::default(), EntityRef::EMPTY);
        assert_eq!(EntityRef::EMPTY.entity(), None);
        assert_eq!(EntityRef::EMPTY.to_string(), "<empty>");
    }
}
