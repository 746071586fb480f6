//! Errors raised by the ECS data core.
//!
//! These cover structural problems (a missing component, an unknown id) and value problems (a
//! write with the wrong type, an operator applied to incompatible operands). None of them is
//! fatal: the dispatcher logs them per entity and moves on.

use thiserror::Error;

use crate::ecs::{
    component,
    entity::Entity,
    value::{Operator, Type},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("entity {entity} has no `{component}` component")]
    MissingComponent { entity: Entity, component: String },

    #[error("no component is registered with id {0:?}")]
    InvalidComponentId(component::Id),

    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    #[error("entity {0} is not alive")]
    UnknownEntity(Entity),

    #[error("entity {0} is already alive")]
    EntityAlreadyAlive(Entity),

    #[error("entity id {entity} is out of range (limit {limit})")]
    EntityOutOfRange { entity: Entity, limit: u32 },

    #[error("expected a value of type {expected}, found {found}")]
    TypeMismatch { expected: Type, found: Type },

    #[error("operator `{operator}` is not defined for {left} and {right}")]
    InvalidOperation {
        operator: Operator,
        left: Type,
        right: Type,
    },

    #[error("`{operator}` by zero")]
    DivisionByZero { operator: Operator },

    #[error("{ty} has no member `{member}`")]
    UnknownMember { ty: Type, member: String },

    #[error("component `{0}` is stored in a different array type")]
    StorageMismatch(String),

    #[error("unknown system `{0}`")]
    UnknownSystem(String),

    #[error("a system named `{0}` is already registered")]
    DuplicateSystem(String),

    #[error("event `{0}` is already declared with a different signature")]
    ConflictingEvent(String),

    #[error("invalid JSON for {expected}: {reason}")]
    InvalidJson { expected: Type, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
