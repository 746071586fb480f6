//! Component declarations shared by the benchmarks.

use glam::DVec3;
use pivot_engine::ecs::{
    ComponentDescription, Index, Value,
    value::{BasicType, Record, RecordType},
};

/// PivotScript declaring the physics components, for script driven scenarios.
pub const PHYSICS_COMPONENTS: &str = "\
component RigidBody
    Vector3 velocity
    Vector3 acceleration
component Gravity
    Vector3 force
";

/// Standard gravity, in the engine's y-up convention.
pub const GRAVITY: DVec3 = DVec3::new(0.0, -9.81, 0.0);

// =============================================================================
// Physics Components
// =============================================================================

pub fn rigid_body_description() -> ComponentDescription {
    ComponentDescription::new(
        "RigidBody",
        RecordType::new()
            .with("velocity", BasicType::Vec3)
            .with("acceleration", BasicType::Vec3),
    )
}

pub fn gravity_description() -> ComponentDescription {
    ComponentDescription::new("Gravity", RecordType::new().with("force", BasicType::Vec3))
}

/// Declare the physics components natively.
pub fn register_physics(index: &mut Index) {
    index.register_component(rigid_body_description());
    index.register_component(gravity_description());
}

pub fn rigid_body(velocity: DVec3) -> Value {
    Record::new()
        .with("velocity", velocity)
        .with("acceleration", DVec3::ZERO)
        .into()
}

pub fn gravity(force: DVec3) -> Value {
    Record::new().with("force", force).into()
}

// =============================================================================
// Tags
// =============================================================================

pub fn tag(name: &str) -> Value {
    Record::new().with("name", name).into()
}
