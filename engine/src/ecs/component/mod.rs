//! Component management for the ECS.
//!
//! Components are named, typed data attached to entities. A component kind is described once by
//! a [`ComponentDescription`] (its name, its [`Type`], its default value and how to build the array
//! that stores it) and registered with a scene's [`Manager`], which lazily builds the backing
//! [`ComponentArray`].
//!
//! ## Architecture
//!
//! - [`ComponentDescription`]: the declaration of a component kind, either built-in or declared
//!   in a PivotScript file (see [`Provenance`]).
//! - [`ComponentArray`]: the type-erased storage capability shared by every array.
//! - [`DenseComponentArray`], [`MapComponentArray`] and [`SynchronizedComponentArray`]: the
//!   concrete storages. Dense arrays suit components most entities carry, map arrays suit sparse
//!   or script-declared components, and synchronized arrays can be read from a render thread.
//! - [`Manager`]: name to [`Id`] lookup and per-id storage for one scene.
//! - [`ComponentRef`]: a live `(array, entity)` binding for reading and writing a value in place.
//!
//! ## Typed access
//!
//! Arrays are created by the description's factory, which hands back both the type-erased handle
//! and a typed one. [`Manager::register_typed`] returns the typed handle directly, so collaborators
//! such as a renderer can reach `SynchronizedComponentArray<Transform>` without downcasting on
//! every frame.

mod array;
mod manager;
mod reference;
mod synchronized;
mod transform;

use std::{any::Any, cell::RefCell, fmt, rc::Rc};

pub use array::{
    ArrayHandle, ComponentArray, ComponentValue, DenseComponentArray, MapComponentArray,
};
pub use manager::Manager;
pub use reference::ComponentRef;
pub use synchronized::SynchronizedComponentArray;
pub use transform::Transform;

use crate::ecs::value::{BasicType, RecordType, Type, Value};

/// A component identifier, unique within one [`Manager`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Construct a new component Id from a raw u32 value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the index of this component if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<usize> for Id {
    #[inline]
    fn from(value: usize) -> Self {
        Self::new(value as u32)
    }
}

/// Where a component kind was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Provenance {
    BuiltIn,
    File(String),
}

/// A freshly built component array: the handle used by the ECS, and the same array as a typed
/// `Rc<RefCell<A>>` for callers that know the concrete storage.
pub struct CreatedArray {
    pub handle: ArrayHandle,
    pub typed: Rc<dyn Any>,
}

impl CreatedArray {
    pub fn new<A: ComponentArray>(array: A) -> Self {
        let typed = Rc::new(RefCell::new(array));
        Self {
            handle: typed.clone(),
            typed,
        }
    }
}

/// Builds the backing array for a component description.
pub type ArrayFactory = Rc<dyn Fn(&ComponentDescription) -> CreatedArray>;

/// The declaration of a component kind.
#[derive(Clone)]
pub struct ComponentDescription {
    name: String,
    shape: Type,
    default_value: Value,
    factory: ArrayFactory,
    provenance: Provenance,
}

impl ComponentDescription {
    /// Describe a component stored in a [`MapComponentArray`], starting at the shape's default
    /// value.
    pub fn new(name: impl Into<String>, shape: impl Into<Type>) -> Self {
        let shape = shape.into();
        Self {
            name: name.into(),
            default_value: shape.default_value(),
            shape,
            factory: Rc::new(|description: &ComponentDescription| {
                CreatedArray::new(MapComponentArray::new(description.shape().clone()))
            }),
            provenance: Provenance::BuiltIn,
        }
    }

    /// The built-in `Tag { name: String }` component.
    pub fn tag() -> Self {
        Self::new("Tag", RecordType::new().with("name", BasicType::String))
    }

    /// The built-in `Transform { position, rotation, scale: Vector3 }` component, stored in a
    /// synchronized dense array so a render thread can read it.
    pub fn transform() -> Self {
        Self::new("Transform", Transform::shape())
            .with_default(Transform::default().to_value())
            .with_factory(|description| {
                CreatedArray::new(SynchronizedComponentArray::<Transform>::new(
                    description.shape().clone(),
                ))
            })
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = value;
        self
    }

    pub fn with_factory(
        mut self,
        factory: impl Fn(&ComponentDescription) -> CreatedArray + 'static,
    ) -> Self {
        self.factory = Rc::new(factory);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn shape(&self) -> &Type {
        &self.shape
    }

    #[inline]
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    #[inline]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Build a new, empty backing array.
    pub fn create_array(&self) -> CreatedArray {
        (self.factory)(self)
    }
}

impl fmt::Debug for ComponentDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescription")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("default_value", &self.default_value)
            .field("provenance", &self.provenance)
            .finish_non_exhaustive()
    }
}

/// Two descriptions are the same declaration if name, shape and default agree. Factories are not
/// compared.
impl PartialEq for ComponentDescription {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.shape == other.shape
            && self.default_value == other.default_value
    }
}
