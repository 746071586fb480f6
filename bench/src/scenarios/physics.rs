//! Gravity integration benchmark scenario.
//!
//! Every body has a `RigidBody` and a `Gravity` component. One `Tick` per frame adds
//! `force * deltaTime` to each velocity. The same work is done three ways so their costs can be
//! compared:
//! - a native per-entity callback
//! - a native batch callback
//! - a PivotScript system

use glam::DVec3;
use pivot_engine::{
    ecs::{
        ComponentCombination, Entity, Event, EventDescription, Index, Scene, SystemDescription,
        system::{SystemCallback, SystemResult},
    },
    script::{self, Config},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    components::{self, GRAVITY},
    scenarios::Scenario,
};

const GRAVITY_SCRIPT: &str = "\
system gravity(body<RigidBody, Gravity>):
    body.RigidBody.velocity = body.RigidBody.velocity + (body.Gravity.force * deltaTime)
";

/// How the gravity system is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsMode {
    PerEntity,
    Batch,
    Script,
}

/// Configuration for the physics benchmark.
pub struct PhysicsConfig {
    /// Number of physics bodies.
    pub body_count: usize,
    /// Fixed timestep carried by each tick.
    pub delta_time: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
    pub mode: PhysicsMode,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            body_count: 10_000,
            delta_time: 1.0 / 120.0, // 120 Hz physics
            seed: 99999,
            mode: PhysicsMode::PerEntity,
        }
    }
}

/// Gravity integration benchmark scenario.
pub struct PhysicsScenario {
    config: PhysicsConfig,
    scene: Scene,
    rng: ChaCha8Rng,
    bodies: Vec<Entity>,
}

fn integrate(matched: &ComponentCombination, delta_time: f64) -> SystemResult {
    let (Some(body), Some(gravity)) = (matched.by_name("RigidBody"), matched.by_name("Gravity"))
    else {
        return Ok(Vec::new());
    };
    let force = gravity.member("force")?.as_vec3().unwrap_or_default();
    let velocity = body.member("velocity")?.as_vec3().unwrap_or_default();
    body.set_member("velocity", (velocity + force * delta_time).into())?;
    Ok(Vec::new())
}

fn native_system(mode: PhysicsMode) -> SystemDescription {
    let callback = match mode {
        PhysicsMode::Batch => SystemCallback::batch(|_, combination, context| {
            let delta_time = context.payload().as_number().unwrap_or_default();
            for matched in combination.iter() {
                integrate(&matched, delta_time)?;
            }
            Ok(Vec::new())
        }),
        _ => SystemCallback::per_entity(|_, matched, context| {
            integrate(matched, context.payload().as_number().unwrap_or_default())
        }),
    };
    SystemDescription::new(
        "gravity",
        "body",
        ["RigidBody", "Gravity"],
        EventDescription::tick(),
        callback,
    )
}

impl PhysicsScenario {
    /// Create a new physics scenario with default config.
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a new physics scenario with custom config.
    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            scene: Scene::new("physics"),
            bodies: Vec::new(),
            config,
        }
    }

    fn systems(&self, index: &mut Index) -> Vec<SystemDescription> {
        match self.config.mode {
            PhysicsMode::Script => {
                let source = format!("{}\n{}", components::PHYSICS_COMPONENTS, GRAVITY_SCRIPT);
                script::load_source(index, "gravity.pivotscript", &source, &Config::default())
                    .expect("gravity script should load")
            }
            mode => {
                components::register_physics(index);
                vec![native_system(mode)]
            }
        }
    }

    fn spawn_body(&mut self) -> Entity {
        let velocity = DVec3::new(
            self.rng.gen_range(-10.0..10.0),
            self.rng.gen_range(-10.0..10.0),
            self.rng.gen_range(-10.0..10.0),
        );
        let entity = self.scene.create_entity();
        self.scene
            .add_component(entity, "RigidBody", components::rigid_body(velocity))
            .unwrap();
        self.scene
            .add_component(entity, "Gravity", components::gravity(GRAVITY))
            .unwrap();
        entity
    }

    /// Current body count.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Velocity of the `n`th body spawned.
    pub fn velocity(&self, n: usize) -> Option<DVec3> {
        let entity = *self.bodies.get(n)?;
        self.scene
            .get_component(entity, "RigidBody")
            .ok()??
            .member("velocity")
            .ok()?
            .as_vec3()
    }
}

impl Default for PhysicsScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for PhysicsScenario {
    fn name(&self) -> &'static str {
        match self.config.mode {
            PhysicsMode::PerEntity => "physics/per_entity",
            PhysicsMode::Batch => "physics/batch",
            PhysicsMode::Script => "physics/script",
        }
    }

    fn description(&self) -> &'static str {
        "Gravity integration over rigid bodies, one tick per frame"
    }

    fn entity_count(&self) -> usize {
        self.config.body_count
    }

    fn setup(&mut self) {
        let mut index = Index::new();
        for system in self.systems(&mut index) {
            self.scene.register_system(&index, system).unwrap();
        }
        self.bodies = Vec::with_capacity(self.config.body_count);
        for _ in 0..self.config.body_count {
            let entity = self.spawn_body();
            self.bodies.push(entity);
        }
    }

    fn update(&mut self) {
        self.scene.send_event(Event::tick(self.config.delta_time));
    }

    fn teardown(&mut self) {
        for entity in self.bodies.drain(..) {
            let _ = self.scene.destroy_entity(entity);
        }
    }
}
