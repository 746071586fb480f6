//! Aligned iteration over several component arrays.
//!
//! An [`ArrayCombination`] matches the entities present in *every* one of a list of arrays, and
//! yields one [`ComponentCombination`] per matched entity: the entity and a [`ComponentRef`] into
//! each array, in the order the arrays were given.
//!
//! The matched entity list is a snapshot taken when the combination is built, in ascending entity
//! order. Structural changes made afterwards (a component removed, an entity destroyed) do not
//! change which entities are visited, which is what lets a system mutate the scene while a
//! combination derived from it is being walked. Values, on the other hand, are never copied: every
//! read and write through a [`ComponentRef`] hits the live array.

use std::{ops::Index, rc::Rc};

use crate::ecs::{
    Error, Result,
    component::{self, ArrayHandle, ComponentRef},
    entity::Entity,
};

/// Entities shared by a list of component arrays.
#[derive(Clone)]
pub struct ArrayCombination {
    arrays: Vec<(Rc<str>, ArrayHandle)>,
    entities: Vec<Entity>,
}

impl ArrayCombination {
    /// Match the entities present in every array. An empty list matches nothing.
    pub fn new(arrays: Vec<(Rc<str>, ArrayHandle)>) -> Self {
        let entities = match arrays
            .iter()
            .min_by_key(|(_, array)| array.borrow().len())
        {
            None => Vec::new(),
            Some((_, smallest)) => {
                let candidates = smallest.borrow().entities();
                candidates
                    .into_iter()
                    .filter(|entity| arrays.iter().all(|(_, array)| array.borrow().has(*entity)))
                    .collect()
            }
        };
        Self { arrays, entities }
    }

    /// Build a combination over named components of a component manager, in the order given.
    pub fn from_manager<S: AsRef<str>>(manager: &component::Manager, names: &[S]) -> Result<Self> {
        let arrays = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                manager
                    .get_component_id(name)
                    .and_then(|id| Some((manager.shared_name(id)?, manager.array(id)?)))
                    .ok_or_else(|| Error::UnknownComponent(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(arrays))
    }

    /// Number of matched entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The matched entities, ascending.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Component names, in array order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.arrays.iter().map(|(name, _)| name.as_ref())
    }

    /// The `index`-th matched combination.
    pub fn get(&self, index: usize) -> Option<ComponentCombination> {
        self.entities
            .get(index)
            .map(|entity| self.combination_for(*entity))
    }

    /// Walk every matched combination. Can be called any number of times.
    pub fn iter(&self) -> impl Iterator<Item = ComponentCombination> + '_ {
        self.entities
            .iter()
            .map(|entity| self.combination_for(*entity))
    }

    fn combination_for(&self, entity: Entity) -> ComponentCombination {
        ComponentCombination {
            entity,
            refs: self
                .arrays
                .iter()
                .map(|(name, array)| ComponentRef::new(array.clone(), entity, name.clone()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ArrayCombination {
    type Item = ComponentCombination;
    type IntoIter = Box<dyn Iterator<Item = ComponentCombination> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// One matched entity and a reference into each array of its [`ArrayCombination`].
#[derive(Debug, Clone)]
pub struct ComponentCombination {
    entity: Entity,
    refs: Vec<ComponentRef>,
}

impl ComponentCombination {
    /// Bind one entity to named components, failing with [`Error::MissingComponent`] if it lacks
    /// any of them.
    pub fn for_entity<S: AsRef<str>>(
        manager: &component::Manager,
        entity: Entity,
        names: &[S],
    ) -> Result<Self> {
        let refs = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let id = manager
                    .get_component_id(name)
                    .ok_or_else(|| Error::UnknownComponent(name.to_string()))?;
                manager.component_ref(entity, id)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entity, refs })
    }

    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&ComponentRef> {
        self.refs.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&ComponentRef> {
        self.refs.iter().find(|reference| reference.name() == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentRef> + '_ {
        self.refs.iter()
    }
}

impl Index<usize> for ComponentCombination {
    type Output = ComponentRef;

    fn index(&self, index: usize) -> &Self::Output {
        &self.refs[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{
        component::{ComponentDescription, Manager},
        value::{Type, Value},
    };

    fn manager_with(entries: &[(&str, Vec<u32>)]) -> Manager {
        let mut manager = Manager::new();
        for (name, entities) in entries {
            let id = manager.register_component(&ComponentDescription::new(*name, Type::NUMBER));
            for entity in entities {
                manager
                    .add_component(Entity::new(*entity), Value::Number(*entity as f64), id)
                    .unwrap();
            }
        }
        manager
    }

    #[test]
    fn matches_the_intersection_in_ascending_order() {
        // Given
        let manager = manager_with(&[("A", vec![5, 1, 3, 8]), ("B", vec![8, 3, 2])]);

        // When
        let combination = ArrayCombination::from_manager(&manager, &["A", "B"]).unwrap();

        // Then
        assert_eq!(combination.entities(), &[Entity::new(3), Entity::new(8)]);
        assert_eq!(combination.len(), 2);
        let names: Vec<_> = combination.names().collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn positional_refs_point_at_the_same_entity() {
        let manager = manager_with(&[("A", vec![1, 2]), ("B", vec![2])]);
        let combination = ArrayCombination::from_manager(&manager, &["B", "A"]).unwrap();

        let matched = combination.get(0).unwrap();
        assert_eq!(matched.entity(), Entity::new(2));
        assert_eq!(matched[0].name(), "B");
        assert_eq!(matched[1].name(), "A");
        assert_eq!(matched[1].get(), Some(Value::Number(2.0)));
        assert!(combination.get(1).is_none());
    }

    #[test]
    fn writes_are_visible_through_the_combination() {
        // Given
        let manager = manager_with(&[("A", vec![4])]);
        let combination = ArrayCombination::from_manager(&manager, &["A"]).unwrap();
        let first = combination.get(0).unwrap();

        // When
        first[0].set(Value::Number(42.0)).unwrap();

        // Then
        let again = combination.iter().next().unwrap();
        assert_eq!(again[0].get(), Some(Value::Number(42.0)));
    }

    #[test]
    fn snapshot_survives_structural_changes() {
        // Given
        let mut manager = manager_with(&[("A", vec![0, 1, 2])]);
        let combination = ArrayCombination::from_manager(&manager, &["A"]).unwrap();
        let id = manager.get_component_id("A").unwrap();

        // When
        manager.remove_component(Entity::new(1), id).unwrap();

        // Then
        let visited: Vec<_> = combination
            .iter()
            .map(|matched| (matched.entity().id(), matched[0].get()))
            .collect();
        assert_eq!(
            visited,
            vec![
                (0, Some(Value::Number(0.0))),
                (1, None),
                (2, Some(Value::Number(2.0))),
            ]
        );
    }

    #[test]
    fn unknown_and_empty_inputs() {
        let manager = manager_with(&[("A", vec![0])]);
        assert_eq!(
            ArrayCombination::from_manager(&manager, &["Nope"]).map(|c| c.len()),
            Err(Error::UnknownComponent("Nope".to_string()))
        );
        assert!(ArrayCombination::new(Vec::new()).is_empty());
        assert_eq!((&ArrayCombination::new(Vec::new())).into_iter().count(), 0);
    }

    #[test]
    fn for_entity_requires_every_component() {
        let manager = manager_with(&[("A", vec![0, 1]), ("B", vec![1])]);

        let bound =
            ComponentCombination::for_entity(&manager, Entity::new(1), &["A", "B"]).unwrap();
        assert_eq!(
            bound.by_name("B").and_then(ComponentRef::get),
            Some(Value::Number(1.0))
        );

        assert_eq!(
            ComponentCombination::for_entity(&manager, Entity::new(0), &["A", "B"])
                .map(|c| c.len()),
            Err(Error::MissingComponent {
                entity: Entity::new(0),
                component: "B".to_string(),
            })
        );
    }
}
