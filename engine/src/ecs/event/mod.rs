//! Events and their declarations.
//!
//! An [`EventDescription`] is the declared shape of an event: its name, the named entity groups
//! it carries (each with the components a listener may touch), and an optional typed payload.
//! An [`Event`] is one occurrence of it. When an event reaches a listening system, the dispatcher
//! binds each carried entity to its group's components and hands the system an [`EventContext`].

mod stream;

pub use stream::Stream;

use crate::ecs::{
    combination::ComponentCombination,
    entity::{self, Entity, EntityRef},
    value::{Type, Value},
};

/// Name of the built-in per-frame event.
pub const TICK: &str = "Tick";

/// A named entity parameter of an event, and the components listeners can reach through it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityGroup {
    pub name: String,
    pub components: Vec<String>,
}

/// The declared payload of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload {
    pub name: String,
    pub ty: Type,
}

/// The declared shape of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventDescription {
    pub name: String,
    pub entities: Vec<EntityGroup>,
    pub payload: Option<Payload>,
}

impl EventDescription {
    /// An event without entities or payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
            payload: None,
        }
    }

    /// The built-in `Tick(Number deltaTime)` event.
    pub fn tick() -> Self {
        Self::new(TICK).with_payload("deltaTime", Type::NUMBER)
    }

    pub fn with_payload(mut self, name: impl Into<String>, ty: impl Into<Type>) -> Self {
        self.payload = Some(Payload {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn with_entities<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        components: impl IntoIterator<Item = S>,
    ) -> Self {
        self.entities.push(EntityGroup {
            name: name.into(),
            components: components.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// The payload type events must carry. Events without a declared payload carry `Void`.
    pub fn payload_type(&self) -> Type {
        self.payload
            .as_ref()
            .map_or(Type::VOID, |payload| payload.ty.clone())
    }

    /// Why `event` cannot be delivered as this description, if it cannot.
    pub fn mismatch(&self, event: &Event) -> Option<String> {
        let expected = self.payload_type();
        let found = event.payload.ty();
        if expected != found {
            return Some(format!("payload is {found}, expected {expected}"));
        }
        if event.entities.len() != self.entities.len() {
            return Some(format!(
                "carries {} entities, expected {}",
                event.entities.len(),
                self.entities.len()
            ));
        }
        None
    }
}

/// One occurrence of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub payload: Value,
    pub entities: Vec<Entity>,
}

impl Event {
    pub fn new(name: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
            entities: Vec::new(),
        }
    }

    /// The built-in tick event for a frame of `delta_time` seconds.
    pub fn tick(delta_time: f64) -> Self {
        Self::new(TICK, delta_time)
    }

    /// Builder style addition of a carried entity. Entities bind to the description's groups in
    /// order.
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }
}

/// An event as seen by one listening system.
pub struct EventContext<'a> {
    event: &'a Event,
    groups: Vec<(String, ComponentCombination)>,
    entities: &'a entity::Manager,
}

impl<'a> EventContext<'a> {
    pub fn new(
        event: &'a Event,
        groups: Vec<(String, ComponentCombination)>,
        entities: &'a entity::Manager,
    ) -> Self {
        Self {
            event,
            groups,
            entities,
        }
    }

    #[inline]
    pub fn event(&self) -> &Event {
        self.event
    }

    #[inline]
    pub fn payload(&self) -> &Value {
        &self.event.payload
    }

    /// The carried entities, bound to their declared groups.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &ComponentCombination)> + '_ {
        self.groups
            .iter()
            .map(|(name, combination)| (name.as_str(), combination))
    }

    pub fn group(&self, name: &str) -> Option<&ComponentCombination> {
        self.groups
            .iter()
            .find(|(group, _)| group == name)
            .map(|(_, combination)| combination)
    }

    /// A weak reference to a live entity, or [`EntityRef::EMPTY`].
    pub fn entity_ref(&self, entity: Entity) -> EntityRef {
        self.entities.entity_ref(entity).unwrap_or_default()
    }

    /// Resolve a weak reference against the scene's current entities.
    pub fn resolve(&self, reference: EntityRef) -> Option<Entity> {
        self.entities.resolve(reference)
    }
}
