use std::{any::Any, cell::RefCell, collections::BTreeMap, rc::Rc};

use fixedbitset::FixedBitSet;

use crate::ecs::{
    Error, Result,
    entity::Entity,
    value::{Type, Value},
};

/// Shared, type-erased handle to a component array.
pub type ArrayHandle = Rc<RefCell<dyn ComponentArray>>;

/// Storage for the values of one component kind, keyed by entity.
///
/// Presence is answered by [`has`](ComponentArray::has) alone: an entity without the component is
/// absent from the array, never stored with a placeholder.
pub trait ComponentArray: Any {
    /// The type every stored value has.
    fn shape(&self) -> &Type;

    fn has(&self, entity: Entity) -> bool;

    fn get_value(&self, entity: Entity) -> Option<Value>;

    /// Store a value for an entity, returning the previous one. The value must match
    /// [`shape`](ComponentArray::shape).
    fn insert_value(&mut self, entity: Entity, value: Value) -> Result<Option<Value>>;

    fn remove_value(&mut self, entity: Entity) -> Option<Value>;

    /// Every entity holding a value, in ascending order.
    fn entities(&self) -> Vec<Entity>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set or clear the value for an entity.
    fn set_value(&mut self, entity: Entity, value: Option<Value>) -> Result<()> {
        match value {
            Some(value) => self.insert_value(entity, value).map(drop),
            None => {
                self.remove_value(entity);
                Ok(())
            }
        }
    }
}

/// A Rust type that can be stored in a typed component array and converted to and from the
/// dynamic [`Value`] model.
pub trait ComponentValue: Clone + Default + 'static {
    fn to_value(&self) -> Value;

    /// Convert back from a value, or `None` if the value has the wrong shape.
    fn from_value(value: &Value) -> Option<Self>;
}

impl ComponentValue for Value {
    #[inline]
    fn to_value(&self) -> Value {
        self.clone()
    }

    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

pub(super) fn check_shape(shape: &Type, value: &Value) -> Result<()> {
    let found = value.ty();
    if &found == shape {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: shape.clone(),
            found,
        })
    }
}

/// Contiguous storage indexed by entity id. Presence is tracked in a bit set, absent slots hold
/// `T::default()` and are never observable.
#[derive(Debug, Clone)]
pub struct DenseComponentArray<T> {
    shape: Type,
    present: FixedBitSet,
    values: Vec<T>,
}

impl<T: ComponentValue> DenseComponentArray<T> {
    pub fn new(shape: Type) -> Self {
        Self {
            shape,
            present: FixedBitSet::new(),
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.present.contains(entity.index())
    }

    #[inline]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.contains(entity).then(|| &self.values[entity.index()])
    }

    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        if self.contains(entity) {
            Some(&mut self.values[entity.index()])
        } else {
            None
        }
    }

    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let index = entity.index();
        if index >= self.values.len() {
            self.values.resize_with(index + 1, T::default);
            self.present.grow(index + 1);
        }
        let previous = std::mem::replace(&mut self.values[index], value);
        let was_present = self.present.put(index);
        was_present.then_some(previous)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        if !self.contains(entity) {
            return None;
        }
        let index = entity.index();
        self.present.set(index, false);
        Some(std::mem::take(&mut self.values[index]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.present
            .ones()
            .map(|index| (Entity::new(index as u32), &self.values[index]))
    }

    /// The presence bit set, indexed by entity id.
    #[inline]
    pub fn presence(&self) -> &FixedBitSet {
        &self.present
    }
}

impl<T: ComponentValue> ComponentArray for DenseComponentArray<T> {
    fn shape(&self) -> &Type {
        &self.shape
    }

    fn has(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn get_value(&self, entity: Entity) -> Option<Value> {
        self.get(entity).map(ComponentValue::to_value)
    }

    fn insert_value(&mut self, entity: Entity, value: Value) -> Result<Option<Value>> {
        check_shape(&self.shape, &value)?;
        let typed = T::from_value(&value).ok_or_else(|| Error::TypeMismatch {
            expected: self.shape.clone(),
            found: value.ty(),
        })?;
        Ok(self.insert(entity, typed).map(|previous| previous.to_value()))
    }

    fn remove_value(&mut self, entity: Entity) -> Option<Value> {
        self.remove(entity).map(|value| value.to_value())
    }

    fn entities(&self) -> Vec<Entity> {
        self.present
            .ones()
            .map(|index| Entity::new(index as u32))
            .collect()
    }

    fn len(&self) -> usize {
        self.present.count_ones(..)
    }
}

/// Sparse storage for components few entities carry, and for components declared by scripts.
#[derive(Debug, Clone)]
pub struct MapComponentArray {
    shape: Type,
    values: BTreeMap<Entity, Value>,
}

impl MapComponentArray {
    pub fn new(shape: Type) -> Self {
        Self {
            shape,
            values: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn get(&self, entity: Entity) -> Option<&Value> {
        self.values.get(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &Value)> + '_ {
        self.values.iter().map(|(entity, value)| (*entity, value))
    }
}

impl ComponentArray for MapComponentArray {
    fn shape(&self) -> &Type {
        &self.shape
    }

    fn has(&self, entity: Entity) -> bool {
        self.values.contains_key(&entity)
    }

    fn get_value(&self, entity: Entity) -> Option<Value> {
        self.values.get(&entity).cloned()
    }

    fn insert_value(&mut self, entity: Entity, value: Value) -> Result<Option<Value>> {
        check_shape(&self.shape, &value)?;
        Ok(self.values.insert(entity, value))
    }

    fn remove_value(&mut self, entity: Entity) -> Option<Value> {
        self.values.remove(&entity)
    }

    fn entities(&self) -> Vec<Entity> {
        self.values.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}
