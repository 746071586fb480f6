//! Realistic scene benchmarks.
//!
//! These scenarios drive a [`Scene`](pivot_engine::ecs::Scene) the way a running game does: by
//! sending events and letting systems cascade.
//!
//! # Scenarios
//!
//! - **Physics**: gravity integration, as a native callback or as PivotScript
//! - **Cascade**: one tick fanning out into a chain of script events

pub mod cascade;
pub mod physics;

pub use cascade::{CascadeConfig, CascadeScenario};
pub use physics::{PhysicsConfig, PhysicsMode, PhysicsScenario};

/// Common trait for benchmark scenarios.
pub trait Scenario {
    /// Human-readable name of the scenario.
    fn name(&self) -> &'static str;

    /// Brief description of what this scenario tests.
    fn description(&self) -> &'static str;

    /// Number of entities in this scenario.
    fn entity_count(&self) -> usize;

    /// Set up the scenario (declare components, register systems, create entities).
    fn setup(&mut self);

    /// Run one "frame" of the scenario.
    fn update(&mut self);

    /// Clean up the scenario.
    fn teardown(&mut self);
}
