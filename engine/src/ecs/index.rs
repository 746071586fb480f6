//! The declaration index: every component, event and system known to a load session.
//!
//! An [`Index`] is an ordinary value owned by the caller. Nothing is global: tests and tools that
//! need isolation build a fresh one, or [`reset`](Index::reset) an existing one.
//!
//! Registration policies:
//! - components are idempotent by name, the first declaration wins;
//! - events must keep one shape per name ([`Error::ConflictingEvent`]);
//! - systems are unique by name ([`Error::DuplicateSystem`]).

use log::debug;

use crate::ecs::{
    Error, Result,
    component::ComponentDescription,
    event::EventDescription,
    system::SystemDescription,
};

const TRANSFORM: &str = "Transform";

#[derive(Debug, Clone)]
pub struct Index {
    components: Vec<ComponentDescription>,
    events: Vec<EventDescription>,
    systems: Vec<SystemDescription>,
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Index {
    /// An index holding only the built-in declarations: the `Tag` and `Transform` components and
    /// the `Tick` event.
    pub fn new() -> Self {
        Self {
            components: vec![ComponentDescription::tag(), ComponentDescription::transform()],
            events: vec![EventDescription::tick()],
            systems: Vec::new(),
        }
    }

    /// Drop every declaration except the built-ins.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Register a component description, returning the stored one. A name that is already
    /// registered keeps its first description.
    pub fn register_component(
        &mut self,
        description: ComponentDescription,
    ) -> &ComponentDescription {
        match self.position_of_component(description.name()) {
            Some(index) => &self.components[index],
            None => {
                debug!("Declared component `{}`", description.name());
                self.components.push(description);
                &self.components[self.components.len() - 1]
            }
        }
    }

    pub fn component(&self, name: &str) -> Option<&ComponentDescription> {
        self.position_of_component(name)
            .map(|index| &self.components[index])
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentDescription> + '_ {
        self.components.iter()
    }

    /// The component renderers and editors treat as the spatial transform.
    pub fn transform_component(&self) -> Option<&ComponentDescription> {
        self.component(TRANSFORM)
    }

    /// Register an event description. Registering the same shape again is a no-op.
    pub fn register_event(&mut self, description: EventDescription) -> Result<()> {
        match self.event(&description.name) {
            Some(existing) if *existing == description => Ok(()),
            Some(_) => Err(Error::ConflictingEvent(description.name)),
            None => {
                debug!("Declared event `{}`", description.name);
                self.events.push(description);
                Ok(())
            }
        }
    }

    pub fn event(&self, name: &str) -> Option<&EventDescription> {
        self.events.iter().find(|event| event.name == name)
    }

    pub fn events(&self) -> impl Iterator<Item = &EventDescription> + '_ {
        self.events.iter()
    }

    /// Register a system, and the event it listens to.
    pub fn register_system(&mut self, description: SystemDescription) -> Result<()> {
        if self.system(description.name()).is_some() {
            return Err(Error::DuplicateSystem(description.name().to_string()));
        }
        for name in description.components() {
            if self.component(name).is_none() {
                return Err(Error::UnknownComponent(name.clone()));
            }
        }
        self.register_event(description.event().clone())?;
        debug!("Declared system `{}`", description.name());
        self.systems.push(description);
        Ok(())
    }

    pub fn system(&self, name: &str) -> Option<&SystemDescription> {
        self.systems.iter().find(|system| system.name() == name)
    }

    pub fn systems(&self) -> impl Iterator<Item = &SystemDescription> + '_ {
        self.systems.iter()
    }

    fn position_of_component(&self, name: &str) -> Option<usize> {
        self.components
            .iter()
            .position(|component| component.name() == name)
    }
}
