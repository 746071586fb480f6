//! Systems: behavior that runs when an event is delivered.
//!
//! # Overview
//!
//! A system is declared by a [`SystemDescription`]: a name, the name its entity parameter goes
//! by, the components an entity must have to be visited (its signature), the
//! [`EventDescription`] it listens to, and a [`SystemCallback`].
//!
//! ```rust
//! use pivot_engine::ecs::{
//!     Event, EventDescription, SystemDescription,
//!     system::SystemCallback,
//! };
//!
//! let gravity = SystemDescription::new(
//!     "gravity",
//!     "body",
//!     ["RigidBody", "Gravity"],
//!     EventDescription::tick(),
//!     SystemCallback::per_entity(|_system, matched, event| {
//!         let dt = event.payload().as_number().unwrap_or_default();
//!         let force = matched[1].member("force")?;
//!         let velocity = matched[0].member("velocity")?;
//!         let scaled = pivot_engine::ecs::value::Operator::Mul.apply(&force, &dt.into())?;
//!         let updated = pivot_engine::ecs::value::Operator::Add.apply(&velocity, &scaled)?;
//!         matched[0].set_member("velocity", updated)?;
//!         Ok(Vec::<Event>::new())
//!     }),
//! );
//! assert_eq!(gravity.components(), ["RigidBody", "Gravity"]);
//! ```
//!
//! # Callback Shapes
//!
//! - **Per entity** ([`SystemCallback::PerEntity`]): invoked once for every entity matching the
//!   signature. A failure only drops that entity's result.
//! - **Batch** ([`SystemCallback::Batch`]): invoked once per delivered event with the whole
//!   [`ArrayCombination`].
//!
//! Both return the events they emit, which the [`Manager`] dispatches in the next round.

mod manager;

use std::{fmt, rc::Rc};

pub use manager::{DispatchReport, Manager};

use crate::ecs::{
    combination::{ArrayCombination, ComponentCombination},
    event::{Event, EventContext, EventDescription},
};

/// Error type returned by system callbacks.
pub type SystemError = Box<dyn std::error::Error>;

/// Events emitted by a callback, or the reason it failed.
pub type SystemResult = Result<Vec<Event>, SystemError>;

type PerEntityFn =
    dyn Fn(&SystemDescription, &ComponentCombination, &EventContext<'_>) -> SystemResult;
type BatchFn = dyn Fn(&SystemDescription, &ArrayCombination, &EventContext<'_>) -> SystemResult;

/// The behavior of a system.
#[derive(Clone)]
pub enum SystemCallback {
    PerEntity(Rc<PerEntityFn>),
    Batch(Rc<BatchFn>),
}

impl SystemCallback {
    pub fn per_entity(
        callback: impl Fn(&SystemDescription, &ComponentCombination, &EventContext<'_>) -> SystemResult
        + 'static,
    ) -> Self {
        Self::PerEntity(Rc::new(callback))
    }

    pub fn batch(
        callback: impl Fn(&SystemDescription, &ArrayCombination, &EventContext<'_>) -> SystemResult
        + 'static,
    ) -> Self {
        Self::Batch(Rc::new(callback))
    }
}

impl fmt::Debug for SystemCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemCallback::PerEntity(_) => f.write_str("PerEntity(..)"),
            SystemCallback::Batch(_) => f.write_str("Batch(..)"),
        }
    }
}

/// A system identifier, its position in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The declaration of a system.
#[derive(Debug, Clone)]
pub struct SystemDescription {
    name: String,
    entity_name: String,
    components: Vec<String>,
    event: EventDescription,
    callback: SystemCallback,
}

impl SystemDescription {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        entity_name: impl Into<String>,
        components: impl IntoIterator<Item = S>,
        event: EventDescription,
        callback: SystemCallback,
    ) -> Self {
        Self {
            name: name.into(),
            entity_name: entity_name.into(),
            components: components.into_iter().map(Into::into).collect(),
            event,
            callback,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the entity parameter inside the system body.
    #[inline]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// The signature: components a visited entity must have, in declaration order.
    #[inline]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    #[inline]
    pub fn event(&self) -> &EventDescription {
        &self.event
    }

    #[inline]
    pub fn callback(&self) -> &SystemCallback {
        &self.callback
    }
}
