//! The dynamically typed value model shared by components, events and scripts.
//!
//! A [`Value`] is a closed sum type. Its [`Type`] is a pure function of the variant (and, for
//! records, of the members), so adding a variant is a compile error everywhere it is not handled.
//!
//! Values never own other entities: an [`EntityRef`] is a weak id that must be resolved through
//! the entity manager before use.

mod json;
mod ops;
mod types;

use std::{collections::BTreeMap, fmt};

use glam::{DVec2, DVec3};

pub use ops::Operator;
pub use types::{BasicType, RecordType, Type};

use crate::ecs::{Error, Result, entity::EntityRef};

/// A named reference to an asset (mesh, texture, ...). Only the name lives in the core.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Asset {
    name: String,
}

impl Asset {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// A linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// A mapping from property name to value. Iteration is in ascending name order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    #[inline]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The record type derived from the members.
    pub fn record_type(&self) -> RecordType {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), value.ty()))
            .collect()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A snapshot of an entity as seen from a script: its id and the values of the components the
/// script was given access to.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScriptEntity {
    pub entity: EntityRef,
    pub components: Record,
}

/// A dynamically typed value.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Integer(i64),
    String(String),
    Boolean(bool),
    Vec3(DVec3),
    Vec2(DVec2),
    Record(Record),
    Asset(Asset),
    List(Vec<Value>),
    #[default]
    Void,
    EntityRef(EntityRef),
    Color(Color),
    ScriptEntity(ScriptEntity),
}

impl Value {
    /// The type of this value.
    pub fn ty(&self) -> Type {
        let basic = match self {
            Value::Number(_) => BasicType::Number,
            Value::Integer(_) => BasicType::Integer,
            Value::String(_) => BasicType::String,
            Value::Boolean(_) => BasicType::Boolean,
            Value::Vec3(_) => BasicType::Vec3,
            Value::Vec2(_) => BasicType::Vec2,
            Value::Record(record) => return Type::Record(record.record_type()),
            Value::Asset(_) => BasicType::Asset,
            Value::List(_) => BasicType::List,
            Value::Void => BasicType::Void,
            Value::EntityRef(_) => BasicType::EntityRef,
            Value::Color(_) => BasicType::Color,
            Value::ScriptEntity(_) => BasicType::ScriptEntity,
        };
        Type::Basic(basic)
    }

    /// Pre-order traversal of every leaf (non-record) value, descending into nested records.
    pub fn visit_data<F: FnMut(&Value)>(&self, f: &mut F) {
        match self {
            Value::Record(record) => {
                for (_, member) in record.iter() {
                    member.visit_data(f);
                }
            }
            leaf => f(leaf),
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_vec3(&self) -> Option<DVec3> {
        match self {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    #[inline]
    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Read a named member: a record property, a vector axis (`x`, `y`, `z`), a color channel
    /// (`r`, `g`, `b`, `a`) or a component of a script entity.
    pub fn member(&self, name: &str) -> Result<Value> {
        let found = match (self, name) {
            (Value::Record(record), _) => record.get(name).cloned(),
            (Value::ScriptEntity(entity), _) => entity.components.get(name).cloned(),
            (Value::Vec3(v), "x") => Some(Value::Number(v.x)),
            (Value::Vec3(v), "y") => Some(Value::Number(v.y)),
            (Value::Vec3(v), "z") => Some(Value::Number(v.z)),
            (Value::Vec2(v), "x") => Some(Value::Number(v.x)),
            (Value::Vec2(v), "y") => Some(Value::Number(v.y)),
            (Value::Color(c), "r") => Some(Value::Number(c.r)),
            (Value::Color(c), "g") => Some(Value::Number(c.g)),
            (Value::Color(c), "b") => Some(Value::Number(c.b)),
            (Value::Color(c), "a") => Some(Value::Number(c.a)),
            _ => None,
        };
        found.ok_or_else(|| self.unknown_member(name))
    }

    /// Overwrite a named member in place. The new value must have the member's current type.
    pub fn set_member(&mut self, name: &str, value: Value) -> Result<()> {
        if let Value::Record(record) = self {
            let Some(slot) = record.get_mut(name) else {
                return Err(Error::UnknownMember {
                    ty: Type::Record(record.record_type()),
                    member: name.to_string(),
                });
            };
            let (expected, found) = (slot.ty(), value.ty());
            if expected != found {
                return Err(Error::TypeMismatch { expected, found });
            }
            *slot = value;
            return Ok(());
        }

        let number = value.as_number().ok_or_else(|| Error::TypeMismatch {
            expected: Type::NUMBER,
            found: value.ty(),
        })?;
        let axis = match (self, name) {
            (Value::Vec3(v), "x") => &mut v.x,
            (Value::Vec3(v), "y") => &mut v.y,
            (Value::Vec3(v), "z") => &mut v.z,
            (Value::Vec2(v), "x") => &mut v.x,
            (Value::Vec2(v), "y") => &mut v.y,
            (Value::Color(c), "r") => &mut c.r,
            (Value::Color(c), "g") => &mut c.g,
            (Value::Color(c), "b") => &mut c.b,
            (Value::Color(c), "a") => &mut c.a,
            (other, _) => return Err(other.unknown_member(name)),
        };
        *axis = number;
        Ok(())
    }

    /// Overwrite a nested member, e.g. `["velocity", "y"]`. An empty path replaces the value.
    pub fn set_path(&mut self, path: &[&str], value: Value) -> Result<()> {
        match path {
            [] => {
                *self = value;
                Ok(())
            }
            [last] => self.set_member(last, value),
            [first, rest @ ..] => {
                let mut child = self.member(first)?;
                child.set_path(rest, value)?;
                self.set_member(first, child)
            }
        }
    }

    /// Whether a value counts as true in a condition. Only booleans qualify.
    #[inline]
    pub fn truthy(&self) -> Option<bool> {
        self.as_bool()
    }

    fn unknown_member(&self, name: &str) -> Error {
        Error::UnknownMember {
            ty: self.ty(),
            member: name.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Vec3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Value::Vec2(v) => write!(f, "({}, {})", v.x, v.y),
            Value::Record(record) => {
                f.write_str("{")?;
                for (index, (name, value)) in record.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Asset(asset) => write!(f, "asset({})", asset.name()),
            Value::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Void => f.write_str("void"),
            Value::EntityRef(entity) => match entity.entity() {
                Some(entity) => write!(f, "{entity}"),
                None => f.write_str("<no entity>"),
            },
            Value::Color(c) => write!(f, "rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
            Value::ScriptEntity(entity) => match entity.entity.entity() {
                Some(id) => write!(f, "entity {id}"),
                None => f.write_str("entity <none>"),
            },
        }
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DVec3> for Value {
    #[inline]
    fn from(value: DVec3) -> Self {
        Value::Vec3(value)
    }
}

impl From<DVec2> for Value {
    #[inline]
    fn from(value: DVec2) -> Self {
        Value::Vec2(value)
    }
}

impl From<Record> for Value {
    #[inline]
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Asset> for Value {
    #[inline]
    fn from(value: Asset) -> Self {
        Value::Asset(value)
    }
}

impl From<Color> for Value {
    #[inline]
    fn from(value: Color) -> Self {
        Value::Color(value)
    }
}

impl From<EntityRef> for Value {
    #[inline]
    fn from(value: EntityRef) -> Self {
        Value::EntityRef(value)
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}
