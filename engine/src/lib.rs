//! Pivot engine core: a dynamically typed ECS driven by events, and the PivotScript language that
//! declares its components and systems.

pub mod ecs;
pub mod logger;
pub mod script;
