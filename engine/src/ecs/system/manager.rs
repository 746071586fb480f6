//! System registration and event dispatch.
//!
//! # Dispatch
//!
//! [`Manager::send_event`] runs an event to completion. Each round moves through the same
//! states:
//!
//! 1. **Pending**: the round's events are taken from the [`Stream`].
//! 2. **Matching**: for every event, each listening system (in registration order) gets an
//!    [`ArrayCombination`] over its signature and an [`EventContext`] binding the carried
//!    entities.
//! 3. **Invoking**: the callback runs once per matched entity (or once per event for batch
//!    systems).
//! 4. **Collecting**: emitted events are queued for the *next* round.
//!
//! Rounds repeat until no event is pending (**Drained**). Because emitted events wait for the
//! next round, no system ever runs against an array another system of the same round is still
//! walking.
//!
//! # Failure Handling
//!
//! A failing invocation is logged with `error!` and only that entity's result is dropped.
//! An event whose payload or entity list does not match a listener's declaration is skipped for
//! that listener with a `warn!`.

use std::collections::HashMap;

use log::{debug, error, warn};

use crate::ecs::{
    Error, Result,
    combination::{ArrayCombination, ComponentCombination},
    component, entity,
    event::{Event, EventContext, Stream},
    system::{Id, SystemCallback, SystemDescription},
};

/// What one [`Manager::send_event`] call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Dispatch rounds run, the first event's included.
    pub rounds: usize,
    /// Events delivered, cascaded ones included.
    pub events: usize,
    /// Callback invocations.
    pub invocations: usize,
    /// Invocations that failed, plus listeners that could not be bound.
    pub failures: usize,
}

/// Registered systems, in registration order.
#[derive(Debug, Default)]
pub struct Manager {
    /// All registered systems, indexed by their [`Id`].
    systems: Vec<SystemDescription>,

    by_name: HashMap<String, Id>,
}

impl Manager {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system. Names are unique: a second system with the same name is rejected.
    pub fn register(&mut self, system: SystemDescription) -> Result<Id> {
        if self.by_name.contains_key(system.name()) {
            return Err(Error::DuplicateSystem(system.name().to_string()));
        }
        let id = Id(self.systems.len() as u32);
        self.by_name.insert(system.name().to_string(), id);
        self.systems.push(system);
        Ok(id)
    }

    #[inline]
    pub fn get(&self, id: Id) -> Option<&SystemDescription> {
        self.systems.get(id.index())
    }

    pub fn by_name(&self, name: &str) -> Option<&SystemDescription> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SystemDescription> + '_ {
        self.systems.iter()
    }

    /// Systems listening to the named event, in registration order.
    pub fn listeners<'a>(&'a self, event: &'a str) -> impl Iterator<Item = &'a SystemDescription> {
        self.systems
            .iter()
            .filter(move |system| system.event().name == event)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Deliver an event and everything it cascades into.
    pub fn send_event(
        &self,
        entities: &entity::Manager,
        components: &component::Manager,
        event: Event,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut stream = Stream::new();
        stream.send(event);

        loop {
            stream.swap();
            if stream.is_empty() {
                break;
            }
            report.rounds += 1;

            for event in stream.take_round() {
                report.events += 1;
                let mut listened = false;
                for system in self.listeners(&event.name) {
                    listened = true;
                    let emitted = self.invoke(system, &event, entities, components, &mut report);
                    stream.extend(emitted);
                }
                if !listened {
                    debug!("No system listens to event `{}`", event.name);
                }
            }
        }

        report
    }

    fn invoke(
        &self,
        system: &SystemDescription,
        event: &Event,
        entities: &entity::Manager,
        components: &component::Manager,
        report: &mut DispatchReport,
    ) -> Vec<Event> {
        if let Some(reason) = system.event().mismatch(event) {
            warn!(
                "System `{}` skipped event `{}`: {reason}",
                system.name(),
                event.name
            );
            return Vec::new();
        }

        let bound = bind_groups(system, event, components).and_then(|groups| {
            let combination = ArrayCombination::from_manager(components, system.components())?;
            Ok((groups, combination))
        });
        let (groups, combination) = match bound {
            Ok(bound) => bound,
            Err(err) => {
                error!(
                    "System `{}` could not handle event `{}`: {err}",
                    system.name(),
                    event.name
                );
                report.failures += 1;
                return Vec::new();
            }
        };
        let context = EventContext::new(event, groups, entities);

        let mut emitted = Vec::new();
        match system.callback() {
            SystemCallback::PerEntity(callback) => {
                for matched in combination.iter() {
                    report.invocations += 1;
                    match callback(system, &matched, &context) {
                        Ok(events) => emitted.extend(events),
                        Err(err) => {
                            error!(
                                "System `{}` failed for entity {}: {err}",
                                system.name(),
                                matched.entity()
                            );
                            report.failures += 1;
                        }
                    }
                }
            }
            SystemCallback::Batch(callback) => {
                report.invocations += 1;
                match callback(system, &combination, &context) {
                    Ok(events) => emitted.extend(events),
                    Err(err) => {
                        error!("System `{}` failed: {err}", system.name());
                        report.failures += 1;
                    }
                }
            }
        }
        emitted
    }
}

/// Bind each carried entity to its declared group.
fn bind_groups(
    system: &SystemDescription,
    event: &Event,
    components: &component::Manager,
) -> Result<Vec<(String, ComponentCombination)>> {
    system
        .event()
        .entities
        .iter()
        .zip(&event.entities)
        .map(|(group, entity)| {
            let names = group.components.as_slice();
            let bound = ComponentCombination::for_entity(components, *entity, names)?;
            Ok((group.name.clone(), bound))
        })
        .collect()
}
