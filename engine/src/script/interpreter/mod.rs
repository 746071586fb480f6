//! Registration and execution of parsed PivotScript.
//!
//! [`register_declarations`] walks a parsed file. Components are registered as they are met.
//! Each system becomes a [`SystemDescription`] whose per-entity callback runs the system body
//! with [`execute_system`].

mod builtins;
mod expression;
mod stack;

use std::rc::Rc;

use log::{debug, warn};

pub use builtins::{BUILTINS, Builtin, CallContext, Param};
pub use expression::{Item, reduce};
pub use stack::{Stack, Variable};

use crate::{
    ecs::{
        Index,
        combination::ComponentCombination,
        component::{ComponentDescription, Provenance},
        event::{Event, EventContext, EventDescription},
        system::{SystemCallback, SystemDescription},
        value::{BasicType, RecordType, Type, Value},
    },
    script::{
        error::{Error, ErrorKind, RuntimeError},
        node::{Node, NodeKind},
    },
};

/// Interpreter settings, captured by every system a load creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Iterations after which a `while` loop is stopped with a warning.
    pub max_loop_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_loop_iterations: 1000,
        }
    }
}

impl Config {
    pub fn with_max_loop_iterations(mut self, iterations: usize) -> Self {
        self.max_loop_iterations = iterations;
        self
    }
}

/// Register the declarations of a parsed file into `index`, returning its systems.
///
/// Fails on the first malformed declaration. Declarations before it may already be in `index`;
/// see [`load_source`](crate::script::load_source) for all or nothing loading.
pub fn register_declarations(
    file: &Node,
    index: &mut Index,
    config: &Config,
) -> Result<Vec<SystemDescription>, Error> {
    let declarations = Declarations {
        file: &file.value,
        config,
    };
    let mut systems = Vec::new();
    for declaration in &file.children {
        match declaration.kind {
            NodeKind::ComponentDeclaration => {
                let description = declarations.component(declaration)?;
                index.register_component(description);
            }
            NodeKind::SystemDeclaration => {
                let description = declarations.system(declaration, index)?;
                index
                    .register_system(description.clone())
                    .map_err(|error| declarations.error(declaration, error.into()))?;
                systems.push(description);
            }
            _ => {
                let kind = ErrorKind::MissingNode("declaration");
                return Err(declarations.error(declaration, kind));
            }
        }
    }
    Ok(systems)
}

struct Declarations<'a> {
    file: &'a str,
    config: &'a Config,
}

impl Declarations<'_> {
    fn component(&self, declaration: &Node) -> Result<ComponentDescription, Error> {
        let shape = match declaration.children.first() {
            None => return Err(self.error(declaration, ErrorKind::MissingNode("type"))),
            Some(ty) if ty.kind == NodeKind::Type => self.resolve_type(ty)?,
            Some(_) => {
                let mut record = RecordType::new();
                for property in declaration.children_of(NodeKind::Property) {
                    let ty = self.child(property, NodeKind::Type, "property type")?;
                    if record
                        .insert(property.value.clone(), self.resolve_type(ty)?)
                        .is_some()
                    {
                        return Err(self.error(
                            property,
                            ErrorKind::DuplicateProperty(property.value.clone()),
                        ));
                    }
                }
                Type::Record(record)
            }
        };
        Ok(ComponentDescription::new(&declaration.value, shape)
            .with_provenance(Provenance::File(self.file.to_string())))
    }

    fn system(&self, declaration: &Node, index: &Index) -> Result<SystemDescription, Error> {
        let parameter = self.child(declaration, NodeKind::EntityParameter, "entity parameter")?;
        self.known_components(parameter, index)?;
        let event = match declaration.child(NodeKind::EventDeclaration) {
            Some(event) => self.event(event, index)?,
            None => EventDescription::tick(),
        };
        let body = Rc::new(self.child(declaration, NodeKind::Block, "body")?.clone());
        let config = self.config.clone();
        let callback = SystemCallback::per_entity(move |system, matched, context| {
            Ok(execute_system(&body, system, matched, context, &config)?)
        });
        debug!("Compiled system `{}` from `{}`", declaration.value, self.file);
        Ok(SystemDescription::new(
            &declaration.value,
            &parameter.value,
            parameter.segments(),
            event,
            callback,
        ))
    }

    fn event(&self, declaration: &Node, index: &Index) -> Result<EventDescription, Error> {
        let mut event = EventDescription::new(&declaration.value);
        for child in &declaration.children {
            match child.kind {
                NodeKind::Payload => {
                    let ty = self.child(child, NodeKind::Type, "payload type")?;
                    event = event.with_payload(&child.value, self.resolve_type(ty)?);
                }
                NodeKind::EntityParameter => {
                    self.known_components(child, index)?;
                    event = event.with_entities(&child.value, child.segments());
                }
                _ => return Err(self.error(child, ErrorKind::MissingNode("event parameter"))),
            }
        }
        Ok(event)
    }

    fn known_components(&self, parameter: &Node, index: &Index) -> Result<(), Error> {
        match parameter
            .children
            .iter()
            .find(|component| index.component(&component.value).is_none())
        {
            Some(unknown) => Err(self.error(
                unknown,
                ErrorKind::UnknownComponent(unknown.value.clone()),
            )),
            None => Ok(()),
        }
    }

    fn resolve_type(&self, ty: &Node) -> Result<Type, Error> {
        BasicType::from_script_name(&ty.value)
            .map(Type::Basic)
            .ok_or_else(|| self.error(ty, ErrorKind::UnknownType(ty.value.clone())))
    }

    fn child<'n>(
        &self,
        node: &'n Node,
        kind: NodeKind,
        what: &'static str,
    ) -> Result<&'n Node, Error> {
        node.child(kind)
            .ok_or_else(|| self.error(node, ErrorKind::MissingNode(what)))
    }

    fn error(&self, at: &Node, kind: ErrorKind) -> Error {
        Error::new(self.file, at.line, at.column, kind)
    }
}

/// Run a system body for one matched entity, returning the events it emitted.
pub fn execute_system(
    body: &Node,
    system: &SystemDescription,
    matched: &ComponentCombination,
    context: &EventContext<'_>,
    config: &Config,
) -> Result<Vec<Event>, RuntimeError> {
    let mut executor = Executor {
        system,
        stack: Stack::entry(system, matched, context),
        context,
        config,
        emitted: Vec::new(),
    };
    executor.block(body)?;
    Ok(executor.emitted)
}

pub(crate) struct Executor<'a, 'ctx> {
    system: &'a SystemDescription,
    stack: Stack,
    context: &'a EventContext<'ctx>,
    config: &'a Config,
    emitted: Vec<Event>,
}

impl Executor<'_, '_> {
    fn block(&mut self, block: &Node) -> Result<(), RuntimeError> {
        for statement in &block.children {
            self.statement(statement)
                .map_err(|error| error.at(statement.line, statement.column))?;
        }
        Ok(())
    }

    fn statement(&mut self, statement: &Node) -> Result<(), RuntimeError> {
        match (statement.kind, statement.children.as_slice()) {
            (NodeKind::Pass, _) => Ok(()),
            (NodeKind::Assignment, [target, value]) => {
                let value = self.evaluate(value)?;
                self.stack.write(&target.segments(), value)
            }
            (NodeKind::Call, _) => self.call(statement).map(drop),
            (NodeKind::If, [condition, body, rest @ ..]) => {
                if self.condition(condition)? {
                    self.block(body)
                } else if let Some(otherwise) = rest.first().and_then(else_block) {
                    self.block(otherwise)
                } else {
                    Ok(())
                }
            }
            (NodeKind::While, [condition, body]) => {
                let mut iterations = 0;
                while self.condition(condition)? {
                    if iterations == self.config.max_loop_iterations {
                        warn!(
                            "Loop in system `{}` stopped after {} iterations",
                            self.system.name(),
                            iterations
                        );
                        break;
                    }
                    iterations += 1;
                    self.block(body)?;
                }
                Ok(())
            }
            _ => Err(RuntimeError::MalformedExpression),
        }
    }

    fn condition(&mut self, condition: &Node) -> Result<bool, RuntimeError> {
        let value = self.evaluate(condition)?;
        value
            .truthy()
            .ok_or_else(|| RuntimeError::ConditionNotBoolean(value.ty()))
    }

    fn call(&mut self, call: &Node) -> Result<Value, RuntimeError> {
        let args = call
            .children
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let mut context = CallContext {
            emitted: &mut self.emitted,
            context: self.context,
        };
        builtins::call(&call.value, &mut context, &args)
    }
}

fn else_block(otherwise: &Node) -> Option<&Node> {
    otherwise.child(NodeKind::Block)
}
