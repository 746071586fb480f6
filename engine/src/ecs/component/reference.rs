use std::{fmt, rc::Rc};

use crate::ecs::{
    Error, Result,
    component::ArrayHandle,
    entity::Entity,
    value::Value,
};

/// A live binding of one entity to one component array.
///
/// Reads and writes go straight to the array, so every holder of a reference to the same
/// `(array, entity)` pair observes a write immediately.
#[derive(Clone)]
pub struct ComponentRef {
    array: ArrayHandle,
    entity: Entity,
    name: Rc<str>,
}

impl ComponentRef {
    pub fn new(array: ArrayHandle, entity: Entity, name: Rc<str>) -> Self {
        Self {
            array,
            entity,
            name,
        }
    }

    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The component name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn array(&self) -> &ArrayHandle {
        &self.array
    }

    /// The current value, or `None` if the entity no longer has the component.
    pub fn get(&self) -> Option<Value> {
        self.array.borrow().get_value(self.entity)
    }

    /// Like [`get`](Self::get), failing with [`Error::MissingComponent`].
    pub fn value(&self) -> Result<Value> {
        self.get().ok_or_else(|| self.missing())
    }

    /// Overwrite the value. The write is type-checked by the array.
    ///
    /// Fails with [`Error::MissingComponent`] once the component has been removed or its entity
    /// destroyed: a stale reference never puts a value back.
    pub fn set(&self, value: Value) -> Result<()> {
        if !self.array.borrow().has(self.entity) {
            return Err(self.missing());
        }
        self.array
            .borrow_mut()
            .insert_value(self.entity, value)
            .map(drop)
    }

    /// Read one member of the component value.
    pub fn member(&self, name: &str) -> Result<Value> {
        self.value()?.member(name)
    }

    /// Write one member of the component value.
    pub fn set_member(&self, name: &str, member: Value) -> Result<()> {
        let mut value = self.value()?;
        value.set_member(name, member)?;
        self.set(value)
    }

    /// Write a nested member, e.g. `["velocity", "y"]`. An empty path replaces the whole value.
    pub fn set_path(&self, path: &[&str], member: Value) -> Result<()> {
        if path.is_empty() {
            return self.set(member);
        }
        let mut value = self.value()?;
        value.set_path(path, member)?;
        self.set(value)
    }

    fn missing(&self) -> Error {
        Error::MissingComponent {
            entity: self.entity,
            component: self.name.to_string(),
        }
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("name", &self.name)
            .field("entity", &self.entity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use glam::DVec3;

    use super::*;
    use crate::ecs::{
        component::MapComponentArray,
        value::{BasicType, Record, RecordType},
    };

    fn rigid_body() -> (ArrayHandle, Entity) {
        let shape = RecordType::new()
            .with("velocity", BasicType::Vec3)
            .with("mass", BasicType::Number);
        let array: ArrayHandle = Rc::new(RefCell::new(MapComponentArray::new(shape.into())));
        let entity = Entity::new(0);
        array
            .borrow_mut()
            .insert_value(
                entity,
                Record::new()
                    .with("velocity", DVec3::ZERO)
                    .with("mass", 1.0)
                    .into(),
            )
            .unwrap();
        (array, entity)
    }

    #[test]
    fn writes_are_seen_by_every_reference() {
        // Given
        let (array, entity) = rigid_body();
        let first = ComponentRef::new(array.clone(), entity, "RigidBody".into());
        let second = first.clone();

        // When
        first.set_member("mass", Value::Number(4.0)).unwrap();

        // Then
        assert_eq!(second.member("mass"), Ok(Value::Number(4.0)));
    }

    #[test]
    fn nested_paths_write_through() {
        let (array, entity) = rigid_body();
        let reference = ComponentRef::new(array, entity, "RigidBody".into());

        reference
            .set_path(&["velocity", "y"], Value::Number(-9.8))
            .unwrap();

        assert_eq!(
            reference.member("velocity"),
            Ok(Value::Vec3(DVec3::new(0.0, -9.8, 0.0)))
        );
    }

    #[test]
    fn removed_component_is_missing() {
        let (array, entity) = rigid_body();
        let reference = ComponentRef::new(array.clone(), entity, "RigidBody".into());
        array.borrow_mut().remove_value(entity);

        assert_eq!(reference.get(), None);
        assert_eq!(
            reference.set_member("mass", Value::Number(1.0)),
            Err(Error::MissingComponent {
                entity,
                component: "RigidBody".to_string(),
            })
        );
    }

    #[test]
    fn removed_components_reject_writes() {
        // Given
        let (array, entity) = rigid_body();
        let reference = ComponentRef::new(array.clone(), entity, "RigidBody".into());
        array.borrow_mut().remove_value(entity);

        // When
        let whole = reference.set(Value::Void);
        let member = reference.set_member("mass", Value::Number(2.0));

        // Then
        let missing = Err(Error::MissingComponent {
            entity,
            component: "RigidBody".to_string(),
        });
        assert_eq!(whole, missing);
        assert_eq!(member, missing);
        assert!(!array.borrow().has(entity));
    }
}
