use std::collections::BTreeMap;

use crate::{
    ecs::{
        Error as EcsError,
        combination::ComponentCombination,
        component::ComponentRef,
        entity::EntityRef,
        event::EventContext,
        system::SystemDescription,
        value::{BasicType, Record, ScriptEntity, Type, Value},
    },
    script::error::RuntimeError,
};

/// Something a name refers to while a system body runs.
#[derive(Debug, Clone)]
pub enum Variable {
    /// A local, the event payload or a value computed by the script.
    Value(Value),
    /// An entity parameter, with live bindings to its components.
    Entity {
        reference: EntityRef,
        components: BTreeMap<String, ComponentRef>,
    },
}

impl Variable {
    fn entity(combination: &ComponentCombination, context: &EventContext<'_>) -> Self {
        Variable::Entity {
            reference: context.entity_ref(combination.entity()),
            components: combination
                .iter()
                .map(|reference| (reference.name().to_string(), reference.clone()))
                .collect(),
        }
    }
}

/// The variables of one system invocation.
#[derive(Debug, Default, Clone)]
pub struct Stack {
    variables: BTreeMap<String, Variable>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stack a system body starts with: the entity parameter, the event payload and the
    /// entity groups carried by the event.
    pub fn entry(
        system: &SystemDescription,
        matched: &ComponentCombination,
        context: &EventContext<'_>,
    ) -> Self {
        let mut stack = Self::new();
        stack.bind(system.entity_name(), Variable::entity(matched, context));
        if let Some(payload) = &system.event().payload {
            stack.bind(&payload.name, Variable::Value(context.payload().clone()));
        }
        for (name, combination) in context.groups() {
            stack.bind(name, Variable::entity(combination, context));
        }
        stack
    }

    pub fn bind(&mut self, name: &str, variable: Variable) {
        self.variables.insert(name.to_string(), variable);
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Read a dotted path such as `body.RigidBody.velocity.x`.
    pub fn read(&self, path: &[&str]) -> Result<Value, RuntimeError> {
        let Some((first, rest)) = path.split_first() else {
            return Err(RuntimeError::MalformedExpression);
        };
        let variable = self
            .get(first)
            .ok_or_else(|| RuntimeError::UnknownVariable(path.join(".")))?;
        match variable {
            Variable::Value(value) => members(value.clone(), rest),
            Variable::Entity {
                reference,
                components,
            } => match rest.split_first() {
                None => Ok(snapshot(*reference, components)?),
                Some((component, rest)) => {
                    let value = component_of(components, component)?.value()?;
                    members(value, rest)
                }
            },
        }
    }

    /// Write a dotted path. A single unknown name declares a local. Component members are written
    /// through to their arrays.
    pub fn write(&mut self, path: &[&str], value: Value) -> Result<(), RuntimeError> {
        let Some((first, rest)) = path.split_first() else {
            return Err(RuntimeError::MalformedExpression);
        };
        if !self.variables.contains_key(*first) {
            if !rest.is_empty() {
                return Err(RuntimeError::UnknownVariable(path.join(".")));
            }
            self.bind(first, Variable::Value(value));
            return Ok(());
        }
        match self.variables.get_mut(*first) {
            None => Err(RuntimeError::UnknownVariable(path.join("."))),
            Some(Variable::Value(local)) => Ok(local.set_path(rest, value)?),
            Some(Variable::Entity { components, .. }) => match rest.split_first() {
                None => Err(RuntimeError::NotAssignable(path.join("."))),
                Some((component, rest)) => {
                    Ok(component_of(components, component)?.set_path(rest, value)?)
                }
            },
        }
    }
}

fn members(value: Value, path: &[&str]) -> Result<Value, RuntimeError> {
    path.iter()
        .try_fold(value, |value, member| value.member(member))
        .map_err(RuntimeError::from)
}

fn component_of<'a>(
    components: &'a BTreeMap<String, ComponentRef>,
    name: &str,
) -> Result<&'a ComponentRef, EcsError> {
    components.get(name).ok_or_else(|| EcsError::UnknownMember {
        ty: Type::Basic(BasicType::ScriptEntity),
        member: name.to_string(),
    })
}

fn snapshot(
    reference: EntityRef,
    components: &BTreeMap<String, ComponentRef>,
) -> Result<Value, EcsError> {
    let components = components
        .iter()
        .map(|(name, component)| Ok((name.clone(), component.value()?)))
        .collect::<Result<Record, EcsError>>()?;
    Ok(Value::ScriptEntity(ScriptEntity {
        entity: reference,
        components,
    }))
}
