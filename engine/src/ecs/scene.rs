//! A scene: the entities, component arrays and systems of one running world.
//!
//! The [`Scene`] keeps its three managers consistent. Adding or removing a component updates the
//! entity's signature, and destroying an entity clears it from every array before its id is
//! released for reuse.
//!
//! Scenes are persisted as a [`SceneSnapshot`], a serde friendly description of the scene's
//! contents. Reading and writing the snapshot file is left to the caller.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::ecs::{
    Error, Index, Result,
    component::{self, ComponentRef, SynchronizedComponentArray, Transform},
    entity::{self, Entity},
    event::Event,
    system::{self, DispatchReport, SystemDescription},
    value::Value,
};

/// The persisted form of a scene.
///
/// ```json
/// {
///   "name": "level",
///   "components": { "0": { "Tag": { "name": "player" } } },
///   "systems": ["gravity"],
///   "scripts": ["physics.pivotscript"],
///   "assets": ["bricks.png"]
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub name: String,
    #[serde(default)]
    pub components: BTreeMap<Entity, BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub systems: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub assets: Vec<String>,
}

#[derive(Debug)]
pub struct Scene {
    name: String,
    entities: entity::Manager,
    components: component::Manager,
    systems: system::Manager,
    scripts: Vec<String>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: entity::Manager::new(),
            components: component::Manager::new(),
            systems: system::Manager::new(),
            scripts: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn entities(&self) -> &entity::Manager {
        &self.entities
    }

    #[inline]
    pub fn component_manager(&self) -> &component::Manager {
        &self.components
    }

    #[inline]
    pub fn systems(&self) -> &system::Manager {
        &self.systems
    }

    pub fn create_entity(&mut self) -> Entity {
        self.entities.create()
    }

    /// Destroy an entity: its components first, then its id.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<()> {
        if !self.entities.is_alive(entity) {
            return Err(Error::UnknownEntity(entity));
        }
        self.components.entity_destroyed(entity);
        self.entities.destroy(entity)
    }

    /// Make a component declared in `index` available in this scene.
    pub fn register_component(&mut self, index: &Index, name: &str) -> Result<component::Id> {
        let description = index
            .component(name)
            .ok_or_else(|| Error::UnknownComponent(name.to_string()))?;
        Ok(self.components.register_component(description))
    }

    /// The built-in transform array, typed for renderers and editors.
    pub fn transforms(
        &mut self,
        index: &Index,
    ) -> Result<(component::Id, Rc<RefCell<SynchronizedComponentArray<Transform>>>)> {
        let description = index
            .transform_component()
            .ok_or_else(|| Error::UnknownComponent("Transform".to_string()))?;
        self.components.register_typed(description)
    }

    /// Attach a component value to a live entity, overwriting any previous value.
    pub fn add_component(&mut self, entity: Entity, name: &str, value: Value) -> Result<()> {
        let id = self.component_id(name)?;
        self.add_component_with_id(entity, id, value)
    }

    pub fn add_component_with_id(
        &mut self,
        entity: Entity,
        id: component::Id,
        value: Value,
    ) -> Result<()> {
        if !self.entities.is_alive(entity) {
            return Err(Error::UnknownEntity(entity));
        }
        self.components.add_component(entity, value, id)?;
        self.entities.set_signature_bit(entity, id, true)
    }

    /// Attach a component with its declared default value.
    pub fn add_default_component(&mut self, entity: Entity, name: &str) -> Result<()> {
        let id = self.component_id(name)?;
        let value = self
            .components
            .description(id)
            .map(|description| description.default_value().clone())
            .ok_or(Error::InvalidComponentId(id))?;
        self.add_component_with_id(entity, id, value)
    }

    pub fn remove_component(&mut self, entity: Entity, name: &str) -> Result<Option<Value>> {
        let id = self.component_id(name)?;
        self.remove_component_with_id(entity, id)
    }

    pub fn remove_component_with_id(
        &mut self,
        entity: Entity,
        id: component::Id,
    ) -> Result<Option<Value>> {
        let removed = self.components.remove_component(entity, id)?;
        if self.entities.is_alive(entity) {
            self.entities.set_signature_bit(entity, id, false)?;
        }
        Ok(removed)
    }

    pub fn get_component(&self, entity: Entity, name: &str) -> Result<Option<Value>> {
        self.get_component_with_id(entity, self.component_id(name)?)
    }

    #[inline]
    pub fn get_component_with_id(
        &self,
        entity: Entity,
        id: component::Id,
    ) -> Result<Option<Value>> {
        self.components.get_component(entity, id)
    }

    /// Live references to every component an entity has.
    pub fn get_all_components(&self, entity: Entity) -> Vec<ComponentRef> {
        self.components.get_all_components(entity)
    }

    /// Every `(entity, component)` pair in the scene, by ascending entity.
    pub fn components(&self) -> Vec<(Entity, ComponentRef)> {
        self.entities
            .alive()
            .flat_map(|entity| {
                self.components
                    .get_all_components(entity)
                    .into_iter()
                    .map(move |reference| (entity, reference))
            })
            .collect()
    }

    /// Register a system with this scene. Its signature components, and the components of its
    /// event groups, are registered from `index` as needed.
    pub fn register_system(
        &mut self,
        index: &Index,
        description: SystemDescription,
    ) -> Result<system::Id> {
        let groups = description
            .event()
            .entities
            .iter()
            .flat_map(|group| group.components.iter());
        for name in description.components().iter().chain(groups) {
            self.register_component(index, name)?;
        }
        self.systems.register(description)
    }

    /// Register a system declared in `index`, by name.
    pub fn register_system_by_name(&mut self, index: &Index, name: &str) -> Result<system::Id> {
        let description = index
            .system(name)
            .cloned()
            .ok_or_else(|| Error::UnknownSystem(name.to_string()))?;
        self.register_system(index, description)
    }

    /// Remember a script this scene depends on, for persistence.
    pub fn add_script(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.scripts.contains(&path) {
            self.scripts.push(path);
        }
    }

    #[inline]
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Deliver an event to this scene's systems, and everything it cascades into.
    pub fn send_event(&self, event: Event) -> DispatchReport {
        self.systems
            .send_event(&self.entities, &self.components, event)
    }

    /// Names of every asset referenced by a component value, sorted.
    pub fn referenced_assets(&self) -> BTreeSet<String> {
        let mut assets = BTreeSet::new();
        for (_, reference) in self.components() {
            if let Some(value) = reference.get() {
                value.visit_data(&mut |leaf| {
                    if let Value::Asset(asset) = leaf
                        && !asset.is_empty()
                    {
                        assets.insert(asset.name().to_string());
                    }
                });
            }
        }
        assets
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        let mut components: BTreeMap<Entity, BTreeMap<String, serde_json::Value>> =
            BTreeMap::new();
        for entity in self.entities.alive() {
            let values = components.entry(entity).or_default();
            for reference in self.components.get_all_components(entity) {
                if let Some(value) = reference.get() {
                    values.insert(reference.name().to_string(), value.to_json());
                }
            }
        }
        SceneSnapshot {
            name: self.name.clone(),
            components,
            systems: self.systems.iter().map(|system| system.name().to_string()).collect(),
            scripts: self.scripts.clone(),
            assets: self.referenced_assets().into_iter().collect(),
        }
    }

    /// Rebuild a scene from a snapshot. Components and systems are looked up in `index`, so the
    /// snapshot's scripts must already be loaded into it.
    pub fn restore(index: &Index, snapshot: &SceneSnapshot) -> Result<Self> {
        let mut scene = Scene::new(snapshot.name.clone());
        for (entity, values) in &snapshot.components {
            scene.entities.create_at(*entity)?;
            for (name, json) in values {
                let id = scene.register_component(index, name)?;
                let shape = scene
                    .components
                    .description(id)
                    .map(|description| description.shape().clone())
                    .ok_or(Error::InvalidComponentId(id))?;
                let value = Value::from_json(&shape, json)?;
                scene.add_component_with_id(*entity, id, value)?;
            }
        }
        for name in &snapshot.systems {
            scene.register_system_by_name(index, name)?;
        }
        for script in &snapshot.scripts {
            scene.add_script(script.clone());
        }
        info!(
            "Restored scene `{}` with {} entities",
            scene.name,
            scene.entities.len()
        );
        Ok(scene)
    }

    fn component_id(&self, name: &str) -> Result<component::Id> {
        self.components
            .get_component_id(name)
            .ok_or_else(|| Error::UnknownComponent(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;
    use crate::ecs::{
        component::{ComponentDescription, ComponentValue},
        event::EventDescription,
        system::SystemCallback,
        value::{Asset, BasicType, Operator, Record, RecordType},
    };

    fn physics_index() -> Index {
        let mut index = Index::new();
        index.register_component(ComponentDescription::new(
            "RigidBody",
            RecordType::new()
                .with("velocity", BasicType::Vec3)
                .with("acceleration", BasicType::Vec3),
        ));
        index.register_component(ComponentDescription::new(
            "Gravity",
            RecordType::new().with("force", BasicType::Vec3),
        ));
        index.register_component(ComponentDescription::new(
            "Renderable",
            RecordType::new()
                .with("mesh", BasicType::Asset)
                .with("texture", BasicType::Asset),
        ));
        index
            .register_system(SystemDescription::new(
                "gravity",
                "body",
                ["RigidBody", "Gravity"],
                EventDescription::tick(),
                SystemCallback::per_entity(|_, matched, event| {
                    let force = matched[1].member("force")?;
                    let step = Operator::Mul.apply(&force, event.payload())?;
                    let velocity = Operator::Add.apply(&matched[0].member("velocity")?, &step)?;
                    matched[0].set_member("velocity", velocity)?;
                    Ok(Vec::new())
                }),
            ))
            .unwrap();
        index
    }

    fn body(velocity: DVec3) -> Value {
        Record::new()
            .with("velocity", velocity)
            .with("acceleration", DVec3::ZERO)
            .into()
    }

    fn gravity() -> Value {
        Record::new().with("force", DVec3::new(0.0, -10.0, 0.0)).into()
    }

    #[test]
    fn gravity_updates_only_bodies_with_gravity() {
        // Given
        let index = physics_index();
        let mut scene = Scene::new("physics");
        scene.register_system_by_name(&index, "gravity").unwrap();
        let falling = scene.create_entity();
        let floating = scene.create_entity();
        scene
            .add_component(falling, "RigidBody", body(DVec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        scene.add_component(falling, "Gravity", gravity()).unwrap();
        scene
            .add_component(floating, "RigidBody", body(DVec3::ZERO))
            .unwrap();

        // When
        let report = scene.send_event(Event::tick(0.5));

        // Then
        assert_eq!(report.invocations, 1);
        assert_eq!(
            scene
                .get_component(falling, "RigidBody")
                .unwrap()
                .map(|value| value.member("velocity")),
            Some(Ok(Value::Vec3(DVec3::new(1.0, -5.0, 0.0))))
        );
        assert_eq!(
            scene.get_component(floating, "RigidBody").unwrap(),
            Some(body(DVec3::ZERO))
        );
    }

    #[test]
    fn signatures_follow_components() {
        // Given
        let index = physics_index();
        let mut scene = Scene::new("signatures");
        let id = scene.register_component(&index, "Gravity").unwrap();
        let entity = scene.create_entity();

        // When
        scene.add_default_component(entity, "Gravity").unwrap();

        // Then
        assert!(scene.entities().has_component(entity, id));
        assert_eq!(
            scene.get_component(entity, "Gravity").unwrap(),
            Some(Record::new().with("force", DVec3::ZERO).into())
        );

        // When
        scene.remove_component(entity, "Gravity").unwrap();

        // Then
        assert!(!scene.entities().has_component(entity, id));
    }

    #[test]
    fn destroy_clears_arrays_before_recycling() {
        // Given
        let index = physics_index();
        let mut scene = Scene::new("recycle");
        scene.register_component(&index, "Gravity").unwrap();
        let entity = scene.create_entity();
        scene.add_component(entity, "Gravity", gravity()).unwrap();

        // When
        scene.destroy_entity(entity).unwrap();
        let reused = scene.create_entity();

        // Then
        assert_eq!(reused, entity);
        assert_eq!(scene.get_component(reused, "Gravity"), Ok(None));
        assert!(scene.get_all_components(reused).is_empty());
        assert_eq!(
            scene.destroy_entity(Entity::new(99)),
            Err(Error::UnknownEntity(Entity::new(99)))
        );
    }

    #[test]
    fn stale_references_cannot_write_into_recycled_ids() {
        // Given
        let index = physics_index();
        let mut scene = Scene::new("stale");
        scene.register_component(&index, "Gravity").unwrap();
        let entity = scene.create_entity();
        scene.add_component(entity, "Gravity", gravity()).unwrap();
        let stale = scene.get_all_components(entity);
        scene.destroy_entity(entity).unwrap();

        // When
        let written = stale[0].set(gravity());
        let reused = scene.create_entity();

        // Then
        assert_eq!(
            written,
            Err(Error::MissingComponent {
                entity,
                component: "Gravity".to_string(),
            })
        );
        assert_eq!(reused, entity);
        assert_eq!(scene.get_component(reused, "Gravity"), Ok(None));
        assert!(!scene.component_manager().holds_entity(reused));
    }

    #[test]
    fn components_on_dead_entities_are_rejected() {
        let index = physics_index();
        let mut scene = Scene::new("dead");
        scene.register_component(&index, "Gravity").unwrap();
        assert_eq!(
            scene.add_component(Entity::new(0), "Gravity", gravity()),
            Err(Error::UnknownEntity(Entity::new(0)))
        );
        assert_eq!(
            scene.add_component(Entity::new(0), "Mana", Value::Void),
            Err(Error::UnknownComponent("Mana".to_string()))
        );
    }

    #[test]
    fn referenced_assets_are_collected() {
        // Given
        let index = physics_index();
        let mut scene = Scene::new("assets");
        scene.register_component(&index, "Renderable").unwrap();
        for (mesh, texture) in [("cube.obj", "bricks.png"), ("cube.obj", "")] {
            let entity = scene.create_entity();
            scene
                .add_component(
                    entity,
                    "Renderable",
                    Record::new()
                        .with("mesh", Asset::new(mesh))
                        .with("texture", Asset::new(texture))
                        .into(),
                )
                .unwrap();
        }

        // When
        let assets = scene.referenced_assets();

        // Then
        assert_eq!(
            assets.into_iter().collect::<Vec<_>>(),
            vec!["bricks.png".to_string(), "cube.obj".to_string()]
        );
    }

    #[test]
    fn transforms_are_shared_with_renderers() {
        // Given
        let index = Index::new();
        let mut scene = Scene::new("render");
        let (id, transforms) = scene.transforms(&index).unwrap();
        let entity = scene.create_entity();

        // When
        scene
            .add_component_with_id(entity, id, Transform::from_position(DVec3::Y).to_value())
            .unwrap();

        // Then
        let shared = transforms.borrow().share();
        let position = shared
            .lock()
            .unwrap()
            .get(entity)
            .map(|transform| transform.position);
        assert_eq!(position, Some(DVec3::Y));
    }

    #[test]
    fn snapshot_restores_an_equivalent_scene() {
        // Given
        let index = physics_index();
        let mut scene = Scene::new("level");
        scene.register_system_by_name(&index, "gravity").unwrap();
        scene.register_component(&index, "Tag").unwrap();
        let first = scene.create_entity();
        let second = scene.create_entity();
        scene.destroy_entity(first).unwrap();
        scene
            .add_component(second, "RigidBody", body(DVec3::X))
            .unwrap();
        scene.add_component(second, "Gravity", gravity()).unwrap();
        scene
            .add_component(second, "Tag", Record::new().with("name", "player").into())
            .unwrap();
        scene.add_script("physics.pivotscript");

        // When
        let snapshot = scene.snapshot();
        let text = serde_json::to_string(&snapshot).unwrap();
        let parsed: SceneSnapshot = serde_json::from_str(&text).unwrap();
        let restored = Scene::restore(&index, &parsed).unwrap();

        // Then
        assert_eq!(parsed, snapshot);
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.entities().alive().collect::<Vec<_>>(), vec![second]);
        assert_eq!(restored.scripts(), ["physics.pivotscript"]);
        assert!(restored.systems().by_name("gravity").is_some());
    }

    #[test]
    fn restore_rejects_unknown_declarations() {
        let index = Index::new();
        let mut snapshot = SceneSnapshot {
            name: "broken".to_string(),
            ..Default::default()
        };
        snapshot.systems.push("missing".to_string());

        assert_eq!(
            Scene::restore(&index, &snapshot).map(|scene| scene.name().to_string()),
            Err(Error::UnknownSystem("missing".to_string()))
        );
    }

    #[test]
    fn restore_rejects_out_of_range_entities() {
        // Given
        let index = physics_index();
        let mut snapshot = SceneSnapshot {
            name: "crafted".to_string(),
            ..Default::default()
        };
        snapshot
            .components
            .insert(Entity::new(u32::MAX), BTreeMap::new());

        // When
        let restored = Scene::restore(&index, &snapshot).map(|scene| scene.name().to_string());

        // Then
        assert_eq!(
            restored,
            Err(Error::EntityOutOfRange {
                entity: Entity::new(u32::MAX),
                limit: entity::MAX_ENTITIES,
            })
        );
    }
}
