use std::{any::Any, cell::RefCell, fmt, rc::Rc};

use dashmap::DashMap;
use log::debug;

use crate::ecs::{
    Error, Result,
    component::{ArrayHandle, ComponentDescription, ComponentRef, Id},
    entity::Entity,
    value::Value,
};

struct Slot {
    description: ComponentDescription,
    name: Rc<str>,
    array: ArrayHandle,
    typed: Rc<dyn Any>,
}

/// The component store of one scene: component names to [`Id`]s, and one backing array per id.
///
/// Registration is idempotent by name. Registering a name a second time returns the id assigned
/// the first time and keeps the original array.
#[derive(Default)]
pub struct Manager {
    /// Map from component name to id. Reads never block.
    ids: DashMap<String, Id>,

    /// Registered components, indexed by id.
    slots: Vec<Slot>,
}

impl Manager {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component kind and get its id, building its array on first registration.
    pub fn register_component(&mut self, description: &ComponentDescription) -> Id {
        if let Some(id) = self.get_component_id(description.name()) {
            return id;
        }

        let id = Id::from(self.slots.len());
        let created = description.create_array();
        self.slots.push(Slot {
            description: description.clone(),
            name: Rc::from(description.name()),
            array: created.handle,
            typed: created.typed,
        });
        self.ids.insert(description.name().to_string(), id);
        debug!("Registered component `{}` as {id:?}", description.name());
        id
    }

    /// Register a component kind and get its array as the concrete storage type `A`.
    ///
    /// Fails with [`Error::StorageMismatch`] if the description's factory builds a different
    /// array type.
    pub fn register_typed<A: Any>(
        &mut self,
        description: &ComponentDescription,
    ) -> Result<(Id, Rc<RefCell<A>>)> {
        let id = self.register_component(description);
        let typed = self.typed::<A>(id)?;
        Ok((id, typed))
    }

    /// The array for `id` as the concrete storage type `A`.
    pub fn typed<A: Any>(&self, id: Id) -> Result<Rc<RefCell<A>>> {
        let slot = self.slot(id)?;
        slot.typed
            .clone()
            .downcast::<RefCell<A>>()
            .map_err(|_| Error::StorageMismatch(slot.name.to_string()))
    }

    #[inline]
    pub fn get_component_id(&self, name: &str) -> Option<Id> {
        self.ids.get(name).map(|entry| *entry.value())
    }

    /// Attach a value to an entity, overwriting any value already present.
    pub fn add_component(&mut self, entity: Entity, value: Value, id: Id) -> Result<()> {
        self.slot(id)?
            .array
            .borrow_mut()
            .insert_value(entity, value)
            .map(drop)
    }

    /// Detach a component, returning the removed value if the entity had one.
    pub fn remove_component(&mut self, entity: Entity, id: Id) -> Result<Option<Value>> {
        Ok(self.slot(id)?.array.borrow_mut().remove_value(entity))
    }

    pub fn get_component(&self, entity: Entity, id: Id) -> Result<Option<Value>> {
        Ok(self.slot(id)?.array.borrow().get_value(entity))
    }

    /// A live reference to an entity's component.
    pub fn component_ref(&self, entity: Entity, id: Id) -> Result<ComponentRef> {
        let slot = self.slot(id)?;
        if !slot.array.borrow().has(entity) {
            return Err(Error::MissingComponent {
                entity,
                component: slot.name.to_string(),
            });
        }
        Ok(ComponentRef::new(slot.array.clone(), entity, slot.name.clone()))
    }

    /// References to every component the entity has, in id order.
    pub fn get_all_components(&self, entity: Entity) -> Vec<ComponentRef> {
        self.slots
            .iter()
            .filter(|slot| slot.array.borrow().has(entity))
            .map(|slot| ComponentRef::new(slot.array.clone(), entity, slot.name.clone()))
            .collect()
    }

    /// Remove the entity from every array.
    pub fn entity_destroyed(&mut self, entity: Entity) {
        for slot in &self.slots {
            slot.array.borrow_mut().remove_value(entity);
        }
    }

    /// Whether any array still holds a value for the entity.
    pub fn holds_entity(&self, entity: Entity) -> bool {
        self.slots.iter().any(|slot| slot.array.borrow().has(entity))
    }

    pub fn array(&self, id: Id) -> Option<ArrayHandle> {
        self.slots.get(id.index()).map(|slot| slot.array.clone())
    }

    pub fn description(&self, id: Id) -> Option<&ComponentDescription> {
        self.slots.get(id.index()).map(|slot| &slot.description)
    }

    pub(crate) fn shared_name(&self, id: Id) -> Option<Rc<str>> {
        self.slots.get(id.index()).map(|slot| slot.name.clone())
    }

    pub fn component_ids(&self) -> impl Iterator<Item = Id> + '_ {
        (0..self.slots.len()).map(Id::from)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, id: Id) -> Result<&Slot> {
        self.slots.get(id.index()).ok_or(Error::InvalidComponentId(id))
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|slot| &slot.name))
            .finish()
    }
}
