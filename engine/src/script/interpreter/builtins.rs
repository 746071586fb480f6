//! The fixed set of native functions scripts can call.
//!
//! Every builtin declares its parameters. Calls are checked before the native function runs:
//! the argument count must match, and every [`Param::Exact`] argument must already have that
//! type. Nothing is converted implicitly.
//!
//! [`Param::Entity`] accepts both ways a script holds an entity: a system's entity parameter
//! (a `ScriptEntity`) and an `Entity` value read from a component or an event payload.

use glam::{DVec2, DVec3};
use log::info;
use rand::Rng;

use crate::{
    ecs::{
        entity::EntityRef,
        event::{Event, EventContext},
        value::{BasicType, Color, ScriptEntity, Type, Value},
    },
    script::error::RuntimeError,
};

type Result<T> = std::result::Result<T, RuntimeError>;

/// What a builtin can reach besides its arguments.
pub struct CallContext<'a, 'ctx> {
    /// Events emitted so far by the running system.
    pub emitted: &'a mut Vec<Event>,
    pub context: &'a EventContext<'ctx>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Any,
    Exact(BasicType),
    /// An `EntityRef` or a `ScriptEntity`.
    Entity,
}

impl Param {
    fn accepts(&self, arg: &Value) -> bool {
        match self {
            Param::Any => true,
            Param::Exact(expected) => arg.ty() == Type::Basic(*expected),
            Param::Entity => matches!(arg, Value::EntityRef(_) | Value::ScriptEntity(_)),
        }
    }

    fn expected(&self) -> Type {
        match self {
            Param::Exact(expected) => Type::Basic(*expected),
            Param::Entity => Type::Basic(BasicType::EntityRef),
            Param::Any => Type::VOID,
        }
    }
}

type NativeFn = fn(&mut CallContext<'_, '_>, &[Value]) -> Result<Value>;

pub struct Builtin {
    pub name: &'static str,
    pub params: &'static [Param],
    call: NativeFn,
}

const ANY: Param = Param::Any;
const NUMBER: Param = Param::Exact(BasicType::Number);
const INTEGER: Param = Param::Exact(BasicType::Integer);
const STRING: Param = Param::Exact(BasicType::String);
const VEC3: Param = Param::Exact(BasicType::Vec3);
const LIST: Param = Param::Exact(BasicType::List);
const ENTITY: Param = Param::Entity;

pub static BUILTINS: &[Builtin] = &[
    Builtin::new("print", &[ANY], print),
    Builtin::new("toString", &[ANY], to_string),
    Builtin::new("sqrt", &[NUMBER], |_, args| Ok(number(args, 0).sqrt().into())),
    Builtin::new("abs", &[NUMBER], |_, args| Ok(number(args, 0).abs().into())),
    Builtin::new("floor", &[NUMBER], |_, args| Ok(number(args, 0).floor().into())),
    Builtin::new("cos", &[NUMBER], |_, args| Ok(number(args, 0).cos().into())),
    Builtin::new("sin", &[NUMBER], |_, args| Ok(number(args, 0).sin().into())),
    Builtin::new("pow", &[NUMBER, NUMBER], |_, args| {
        Ok(number(args, 0).powf(number(args, 1)).into())
    }),
    Builtin::new("randint", &[INTEGER, INTEGER], randint),
    Builtin::new("toInteger", &[NUMBER], |_, args| {
        Ok(Value::Integer(number(args, 0) as i64))
    }),
    Builtin::new("toNumber", &[INTEGER], |_, args| {
        Ok(Value::Number(integer(args, 0) as f64))
    }),
    Builtin::new("vec3", &[NUMBER, NUMBER, NUMBER], |_, args| {
        Ok(DVec3::new(number(args, 0), number(args, 1), number(args, 2)).into())
    }),
    Builtin::new("vec2", &[NUMBER, NUMBER], |_, args| {
        Ok(DVec2::new(number(args, 0), number(args, 1)).into())
    }),
    Builtin::new("color", &[NUMBER, NUMBER, NUMBER, NUMBER], |_, args| {
        let channel = |index| number(args, index);
        Ok(Color::new(channel(0), channel(1), channel(2), channel(3)).into())
    }),
    Builtin::new("length", &[VEC3], |_, args| Ok(vec3(args, 0).length().into())),
    Builtin::new("normalize", &[VEC3], |_, args| {
        Ok(vec3(args, 0).normalize_or_zero().into())
    }),
    Builtin::new("dot", &[VEC3, VEC3], |_, args| {
        Ok(vec3(args, 0).dot(vec3(args, 1)).into())
    }),
    Builtin::new("cross", &[VEC3, VEC3], |_, args| {
        Ok(vec3(args, 0).cross(vec3(args, 1)).into())
    }),
    Builtin::new("len", &[LIST], |_, args| Ok(Value::Integer(list(args, 0).len() as i64))),
    Builtin::new("push", &[LIST, ANY], |_, args| {
        let mut items = list(args, 0).to_vec();
        items.push(args[1].clone());
        Ok(Value::List(items))
    }),
    Builtin::new("isEmpty", &[ENTITY], is_empty),
    Builtin::new("emit", &[STRING, ANY], emit),
    Builtin::new("emitTo", &[STRING, ANY, ENTITY], emit_to),
];

impl Builtin {
    const fn new(name: &'static str, params: &'static [Param], call: NativeFn) -> Self {
        Self { name, params, call }
    }

    /// Check the arguments against the declared parameters.
    pub fn check(&self, args: &[Value]) -> Result<()> {
        if args.len() != self.params.len() {
            return Err(RuntimeError::WrongArity {
                builtin: self.name.to_string(),
                expected: self.params.len(),
                found: args.len(),
            });
        }
        for (position, (param, arg)) in self.params.iter().zip(args).enumerate() {
            if !param.accepts(arg) {
                return Err(RuntimeError::WrongParameterType {
                    builtin: self.name.to_string(),
                    position: position + 1,
                    expected: param.expected(),
                    found: arg.ty(),
                });
            }
        }
        Ok(())
    }

    pub fn invoke(&self, context: &mut CallContext<'_, '_>, args: &[Value]) -> Result<Value> {
        self.check(args)?;
        (self.call)(context, args)
    }
}

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

/// Check and run the builtin called `name`.
pub fn call(name: &str, context: &mut CallContext<'_, '_>, args: &[Value]) -> Result<Value> {
    lookup(name)
        .ok_or_else(|| RuntimeError::UnknownBuiltin(name.to_string()))?
        .invoke(context, args)
}

// Argument accessors. Only used after `check`, so the types are known.

fn number(args: &[Value], index: usize) -> f64 {
    args[index].as_number().unwrap_or_default()
}

fn integer(args: &[Value], index: usize) -> i64 {
    args[index].as_integer().unwrap_or_default()
}

fn vec3(args: &[Value], index: usize) -> DVec3 {
    args[index].as_vec3().unwrap_or_default()
}

fn entity(args: &[Value], index: usize) -> EntityRef {
    match &args[index] {
        Value::EntityRef(reference) => *reference,
        Value::ScriptEntity(ScriptEntity { entity, .. }) => *entity,
        _ => EntityRef::EMPTY,
    }
}

fn list(args: &[Value], index: usize) -> &[Value] {
    match &args[index] {
        Value::List(items) => items,
        _ => &[],
    }
}

fn print(_: &mut CallContext<'_, '_>, args: &[Value]) -> Result<Value> {
    info!("{}", args[0]);
    Ok(Value::Void)
}

fn to_string(_: &mut CallContext<'_, '_>, args: &[Value]) -> Result<Value> {
    Ok(Value::String(args[0].to_string()))
}

/// A random integer in `[low, high]`.
fn randint(_: &mut CallContext<'_, '_>, args: &[Value]) -> Result<Value> {
    let (low, high) = (integer(args, 0), integer(args, 1));
    if low > high {
        return Err(RuntimeError::InvalidArgument {
            builtin: "randint".to_string(),
            reason: format!("{low} is greater than {high}"),
        });
    }
    Ok(Value::Integer(rand::thread_rng().gen_range(low..=high)))
}

/// Whether an entity reference no longer points at a live entity.
fn is_empty(call: &mut CallContext<'_, '_>, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(call.context.resolve(entity(args, 0)).is_none()))
}

fn emit(call: &mut CallContext<'_, '_>, args: &[Value]) -> Result<Value> {
    let name = args[0].as_str().unwrap_or_default();
    call.emitted.push(Event::new(name, args[1].clone()));
    Ok(Value::Void)
}

fn emit_to(call: &mut CallContext<'_, '_>, args: &[Value]) -> Result<Value> {
    let name = args[0].as_str().unwrap_or_default();
    let target = entity(args, 2);
    let entity = call
        .context
        .resolve(target)
        .ok_or(RuntimeError::StaleEntity(target))?;
    call.emitted
        .push(Event::new(name, args[1].clone()).with_entity(entity));
    Ok(Value::Void)
}
