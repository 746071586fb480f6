//! PivotScript: components and systems declared in a small indentation based language.
//!
//! ```text
//! component RigidBody
//!     Vector3 velocity
//!     Vector3 acceleration
//! component Gravity
//!     Vector3 force
//!
//! system gravity(body<RigidBody, Gravity>) event Tick(Number deltaTime):
//!     body.RigidBody.velocity = body.RigidBody.velocity + (body.Gravity.force * deltaTime)
//! ```
//!
//! A file goes through [`lexer`], [`parser`] and [`interpreter`]. [`load_source`] runs all three
//! and commits the declarations to an [`Index`] only if the whole file is valid.
//!
//! Expressions evaluate strictly left to right: `2 + 3 * 4` is `20`. Use parentheses to group.

pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod token;

use std::{fs, path::Path};

use log::info;

pub use error::{Error, ErrorKind, RuntimeError};
pub use interpreter::Config;

use crate::ecs::{Index, SystemDescription};

/// Load one script from source text.
///
/// On success, the file's components and systems are registered in `index` and its systems are
/// returned. On failure, `index` is left untouched.
pub fn load_source(
    index: &mut Index,
    file: &str,
    source: &str,
    config: &Config,
) -> Result<Vec<SystemDescription>, Error> {
    let tokens = lexer::tokenize(file, source)?;
    let tree = parser::parse(file, tokens)?;
    let mut staged = index.clone();
    let systems = interpreter::register_declarations(&tree, &mut staged, config)?;
    *index = staged;
    info!("Loaded `{}` with {} systems", file, systems.len());
    Ok(systems)
}

/// Load one script file. See [`load_source`].
pub fn load_file(
    index: &mut Index,
    path: impl AsRef<Path>,
    config: &Config,
) -> Result<Vec<SystemDescription>, Error> {
    let path = path.as_ref();
    let file = path.display().to_string();
    let source = fs::read_to_string(path)
        .map_err(|error| Error::new(&file, 0, 0, ErrorKind::Io(error.to_string())))?;
    load_source(index, &file, &source, config)
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use log::Level;

    use super::*;
    use crate::{
        ecs::{
            Entity, Event, Scene,
            component::Provenance,
            value::{Record, Value},
        },
        logger,
    };

    const FILE: &str = "test.pivotscript";

    fn load(index: &mut Index, source: &str) -> Vec<SystemDescription> {
        load_source(index, FILE, source, &Config::default()).unwrap()
    }

    fn scene_with(index: &Index, systems: &[SystemDescription]) -> Scene {
        let mut scene = Scene::new("test");
        for system in systems {
            scene.register_system(index, system.clone()).unwrap();
        }
        scene
    }

    fn tagged(scene: &mut Scene, name: &str) -> Entity {
        let entity = scene.create_entity();
        scene
            .add_component(entity, "Tag", Record::new().with("name", name).into())
            .unwrap();
        entity
    }

    fn tag_name(scene: &Scene, entity: Entity) -> Value {
        scene
            .get_component(entity, "Tag")
            .unwrap()
            .unwrap()
            .member("name")
            .unwrap()
    }

    #[test]
    fn tick_cascades_into_a_rename() {
        // Given
        let mut index = Index::new();
        let systems = load(
            &mut index,
            concat!(
                "system tick(e<Tag>)\n",
                "    emit(\"ChangeName\", \"newName\")\n",
                "\n",
                "system changeName(e<Tag>) event ChangeName(String name):\n",
                "    e.Tag.name = name\n",
            ),
        );
        let mut scene = scene_with(&index, &systems);
        let entity = tagged(&mut scene, "oui");

        // When
        let report = scene.send_event(Event::tick(0.016));

        // Then
        assert_eq!(tag_name(&scene, entity), Value::from("newName"));
        assert_eq!((report.rounds, report.invocations, report.failures), (2, 2, 0));
    }

    #[test]
    fn gravity_script() {
        // Given
        let mut index = Index::new();
        let systems = load(
            &mut index,
            concat!(
                "component RigidBody\n",
                "    Vector3 velocity\n",
                "    Vector3 acceleration\n",
                "component Gravity\n",
                "    Vector3 force\n",
                "\n",
                "system gravity(body<RigidBody, Gravity>):\n",
                "    v = body.RigidBody.velocity\n",
                "    body.RigidBody.velocity = v + (body.Gravity.force * deltaTime)\n",
            ),
        );
        let mut scene = scene_with(&index, &systems);
        let body = |velocity: DVec3| -> Value {
            Record::new()
                .with("velocity", velocity)
                .with("acceleration", DVec3::ZERO)
                .into()
        };
        let falling = scene.create_entity();
        let resting = scene.create_entity();
        scene
            .add_component(falling, "RigidBody", body(DVec3::X))
            .unwrap();
        scene
            .add_component(
                falling,
                "Gravity",
                Record::new().with("force", DVec3::new(0.0, -10.0, 0.0)).into(),
            )
            .unwrap();
        scene
            .add_component(resting, "RigidBody", body(DVec3::ZERO))
            .unwrap();

        // When
        scene.send_event(Event::tick(0.5));

        // Then
        let velocity = |entity| {
            scene
                .get_component(entity, "RigidBody")
                .unwrap()
                .unwrap()
                .member("velocity")
                .unwrap()
        };
        assert_eq!(velocity(falling), Value::Vec3(DVec3::new(1.0, -5.0, 0.0)));
        assert_eq!(velocity(resting), Value::Vec3(DVec3::ZERO));
        assert_eq!(
            index.component("Gravity").map(|c| c.provenance().clone()),
            Some(Provenance::File(FILE.to_string()))
        );
    }

    #[test]
    fn operators_apply_left_to_right() {
        let mut index = Index::new();
        let systems = load(
            &mut index,
            concat!(
                "component Score Integer\n",
                "system score(e<Score>):\n",
                "    e.Score = 2 + 3 * 4\n",
            ),
        );
        let mut scene = scene_with(&index, &systems);
        let entity = scene.create_entity();
        scene.add_default_component(entity, "Score").unwrap();

        scene.send_event(Event::tick(0.016));

        assert_eq!(
            scene.get_component(entity, "Score").unwrap(),
            Some(Value::Integer(20))
        );
    }

    #[test]
    fn control_flow_and_locals() {
        // Given
        let mut index = Index::new();
        let systems = load(
            &mut index,
            concat!(
                "component Score Integer\n",
                "system classify(e<Score, Tag>):\n",
                "    total = 0\n",
                "    i = 0\n",
                "    while i < 4:\n",
                "        i = i + 1\n",
                "        total = total + i\n",
                "    if total > 100:\n",
                "        e.Tag.name = \"big\"\n",
                "    else if total == 10:\n",
                "        e.Tag.name = \"ten\"\n",
                "    else:\n",
                "        e.Tag.name = \"small\"\n",
                "    e.Score = total\n",
            ),
        );
        let mut scene = scene_with(&index, &systems);
        let entity = tagged(&mut scene, "");
        scene.add_default_component(entity, "Score").unwrap();

        // When
        scene.send_event(Event::tick(0.016));

        // Then
        assert_eq!(tag_name(&scene, entity), Value::from("ten"));
        assert_eq!(
            scene.get_component(entity, "Score").unwrap(),
            Some(Value::Integer(10))
        );
    }

    #[test]
    fn runaway_loops_are_capped() {
        // Given
        let capture = logger::capture();
        let mut index = Index::new();
        let config = Config::default().with_max_loop_iterations(5);
        let systems = load_source(
            &mut index,
            FILE,
            concat!(
                "component Counter Integer\n",
                "system spin(e<Counter>):\n",
                "    while true:\n",
                "        e.Counter = e.Counter + 1\n",
            ),
            &config,
        )
        .unwrap();
        let mut scene = scene_with(&index, &systems);
        let entity = scene.create_entity();
        scene.add_default_component(entity, "Counter").unwrap();

        // When
        let report = scene.send_event(Event::tick(0.016));

        // Then
        assert_eq!(report.failures, 0);
        assert_eq!(
            scene.get_component(entity, "Counter").unwrap(),
            Some(Value::Integer(5))
        );
        assert!(capture.contains(Level::Warn, "`spin` stopped after 5 iterations"));
    }

    #[test]
    fn targeted_events_bind_entity_groups() {
        // Given
        let mut index = Index::new();
        let systems = load(
            &mut index,
            concat!(
                "component Health Integer\n",
                "system attack(e<Tag>):\n",
                "    emitTo(\"Damage\", 10, e)\n",
                "system damage(e<Health>) event Damage(Integer amount, target<Health>):\n",
                "    target.Health = target.Health - amount\n",
            ),
        );
        let mut scene = scene_with(&index, &systems);
        let entity = tagged(&mut scene, "knight");
        scene
            .add_component(entity, "Health", Value::Integer(100))
            .unwrap();

        // When
        scene.send_event(Event::tick(0.016));

        // Then
        assert_eq!(
            scene.get_component(entity, "Health").unwrap(),
            Some(Value::Integer(90))
        );
    }

    #[test]
    fn runtime_errors_only_fail_the_entity() {
        // Given
        let capture = logger::capture();
        let mut index = Index::new();
        let systems = load(
            &mut index,
            concat!(
                "system rename(e<Tag>):\n",
                "    if e.Tag.name == \"bad\":\n",
                "        e.Tag.name = 3\n",
                "    else:\n",
                "        e.Tag.name = \"renamed\"\n",
            ),
        );
        let mut scene = scene_with(&index, &systems);
        let bad = tagged(&mut scene, "bad");
        let good = tagged(&mut scene, "good");

        // When
        let report = scene.send_event(Event::tick(0.016));

        // Then
        assert_eq!(report.failures, 1);
        assert_eq!(tag_name(&scene, bad), Value::from("bad"));
        assert_eq!(tag_name(&scene, good), Value::from("renamed"));
        assert!(capture.contains(log::Level::Error, "line 3, column 9"));
    }

    #[test]
    fn failed_loads_register_nothing() {
        // Given
        let mut index = Index::new();
        let source = concat!(
            "component Health Integer\n",
            "system heal(e<Health, Mana>):\n",
            "    pass\n",
        );

        // When
        let error = load_source(&mut index, FILE, source, &Config::default()).unwrap_err();

        // Then
        assert_eq!(error.kind, ErrorKind::UnknownComponent("Mana".into()));
        assert_eq!((error.line, error.column), (2, 23));
        assert!(index.component("Health").is_none());
        assert!(index.system("heal").is_none());
    }

    #[test]
    fn out_of_range_literals_fail_the_load() {
        // Given
        let mut index = Index::new();
        let source = concat!(
            "component Score Integer\n",
            "system score(e<Score>):\n",
            "    e.Score = 99999999999999999999\n",
        );

        // When
        let error = load_source(&mut index, FILE, source, &Config::default()).unwrap_err();

        // Then
        assert_eq!(
            error.kind,
            ErrorKind::LiteralOutOfRange("99999999999999999999".into())
        );
        assert_eq!((error.line, error.column), (3, 15));
        assert!(index.system("score").is_none());
    }

    #[test]
    fn declaration_errors() {
        let mut index = Index::new();
        let error = |source: &str, index: &mut Index| {
            load_source(index, FILE, source, &Config::default())
                .unwrap_err()
                .kind
        };

        assert_eq!(
            error("component Speed Float\n", &mut index),
            ErrorKind::UnknownType("Float".into())
        );
        load(&mut index, "system idle(e<Tag>)\n    pass\n");
        assert_eq!(
            error("system idle(e<Tag>)\n    pass\n", &mut index),
            ErrorKind::DuplicateSystem("idle".into())
        );
        assert_eq!(
            error(
                "system tock(e<Tag>) event Tick(Integer frame)\n    pass\n",
                &mut index
            ),
            ErrorKind::ConflictingEvent("Tick".into())
        );
    }

    #[test]
    fn components_are_idempotent_across_files() {
        let mut index = Index::new();
        load(&mut index, "component Health Integer\n");
        load(&mut index, "component Health Number\n");
        assert_eq!(
            index.component("Health").map(|c| c.default_value().clone()),
            Some(Value::Integer(0))
        );
    }

    #[test]
    fn missing_files_report_io_errors() {
        let mut index = Index::new();
        let error = load_file(&mut index, "does/not/exist.pivotscript", &Config::default())
            .unwrap_err();
        assert!(matches!(error.kind, ErrorKind::Io(_)));
        assert_eq!(error.file, "does/not/exist.pivotscript");
    }
}
