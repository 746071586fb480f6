//! Event cascade benchmark scenario.
//!
//! A single `Tick` starts a chain of `Step` events, each emitted by a script system in the
//! previous round. Every step bumps a counter on every counted entity, so one frame costs
//! `depth` dispatch rounds over `counter_count` entities.

use pivot_engine::{
    ecs::{Entity, Event, Index, Scene, Value, system::DispatchReport},
    script::{self, Config},
};

use crate::{components, scenarios::Scenario};

/// Configuration for the cascade benchmark.
pub struct CascadeConfig {
    /// Entities whose counter every step bumps.
    pub counter_count: usize,
    /// `Step` events chained from each tick.
    pub depth: i64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            counter_count: 1_000,
            depth: 10,
        }
    }
}

/// Event cascade benchmark scenario.
pub struct CascadeScenario {
    config: CascadeConfig,
    scene: Scene,
    entities: Vec<Entity>,
    last_report: DispatchReport,
}

impl CascadeScenario {
    pub fn new() -> Self {
        Self::with_config(CascadeConfig::default())
    }

    pub fn with_config(config: CascadeConfig) -> Self {
        Self {
            config,
            scene: Scene::new("cascade"),
            entities: Vec::new(),
            last_report: DispatchReport::default(),
        }
    }

    fn source(&self) -> String {
        format!(
            "component Counter Integer\n\
             system start(e<Tag>):\n    emit(\"Step\", 1)\n\
             system step(e<Tag>) event Step(Integer depth):\n    \
                 if depth < {}:\n        emit(\"Step\", depth + 1)\n\
             system count(c<Counter>) event Step(Integer depth):\n    \
                 c.Counter = c.Counter + 1\n",
            self.config.depth
        )
    }

    /// What the last [`update`](Scenario::update) dispatched.
    pub fn last_report(&self) -> DispatchReport {
        self.last_report
    }

    /// Counter of the `n`th counted entity.
    pub fn counter(&self, n: usize) -> Option<i64> {
        let entity = *self.entities.get(n + 1)?;
        self.scene
            .get_component(entity, "Counter")
            .ok()?
            .as_ref()
            .and_then(Value::as_integer)
    }
}

impl Default for CascadeScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for CascadeScenario {
    fn name(&self) -> &'static str {
        "cascade"
    }

    fn description(&self) -> &'static str {
        "One tick chained into script emitted events over many entities"
    }

    fn entity_count(&self) -> usize {
        self.config.counter_count + 1
    }

    fn setup(&mut self) {
        let mut index = Index::new();
        let source = self.source();
        let systems =
            script::load_source(&mut index, "cascade.pivotscript", &source, &Config::default())
                .expect("cascade script should load");
        for system in systems {
            self.scene.register_system(&index, system).unwrap();
        }

        let driver = self.scene.create_entity();
        self.scene
            .add_component(driver, "Tag", components::tag("driver"))
            .unwrap();
        self.entities.push(driver);
        for _ in 0..self.config.counter_count {
            let entity = self.scene.create_entity();
            self.scene.add_default_component(entity, "Counter").unwrap();
            self.entities.push(entity);
        }
    }

    fn update(&mut self) {
        self.last_report = self.scene.send_event(Event::tick(1.0 / 60.0));
    }

    fn teardown(&mut self) {
        for entity in self.entities.drain(..) {
            let _ = self.scene.destroy_entity(entity);
        }
    }
}
