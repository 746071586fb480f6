use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ecs::{
    Result,
    component::{ComponentArray, ComponentValue, DenseComponentArray},
    entity::Entity,
    value::{Type, Value},
};

/// A dense array behind a mutex, so a render thread can take a consistent view of it.
///
/// The ECS side goes through [`ComponentArray`], which locks for the duration of each call. A
/// renderer obtains its own handle with [`share`](Self::share) and holds [`lock`](Self::lock)
/// while it builds its buffers. Scripts must not run while that lock is held.
#[derive(Debug)]
pub struct SynchronizedComponentArray<T> {
    shape: Type,
    inner: Arc<Mutex<DenseComponentArray<T>>>,
}

impl<T: ComponentValue> SynchronizedComponentArray<T> {
    pub fn new(shape: Type) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DenseComponentArray::new(shape.clone()))),
            shape,
        }
    }

    /// Lock the array. The guard releases the lock when dropped. Poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, DenseComponentArray<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A second handle to the same storage, for another thread.
    pub fn share(&self) -> Arc<Mutex<DenseComponentArray<T>>> {
        self.inner.clone()
    }
}

impl<T: ComponentValue> ComponentArray for SynchronizedComponentArray<T> {
    fn shape(&self) -> &Type {
        &self.shape
    }

    fn has(&self, entity: Entity) -> bool {
        self.lock().contains(entity)
    }

    fn get_value(&self, entity: Entity) -> Option<Value> {
        self.lock().get_value(entity)
    }

    fn insert_value(&mut self, entity: Entity, value: Value) -> Result<Option<Value>> {
        self.lock().insert_value(entity, value)
    }

    fn remove_value(&mut self, entity: Entity) -> Option<Value> {
        self.lock().remove_value(entity)
    }

    fn entities(&self) -> Vec<Entity> {
        self.lock().entities()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
