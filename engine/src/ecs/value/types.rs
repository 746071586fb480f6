//! Static type descriptions for [`Value`]s.
//!
//! Every value has exactly one [`Type`]. Scalar and leaf values map to a [`BasicType`], while
//! records map to a [`RecordType`] that describes each named member. Types are checked when
//! components and systems are declared, and again whenever a value is written into a component
//! array.

use std::{collections::BTreeMap, fmt};

use glam::{DVec2, DVec3};

use crate::ecs::{
    entity::EntityRef,
    value::{Asset, Color, Record, ScriptEntity, Value},
};

/// The type of a non-record value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BasicType {
    Number,
    Integer,
    String,
    Boolean,
    Vec3,
    Vec2,
    Asset,
    List,
    Void,
    EntityRef,
    Color,
    ScriptEntity,
}

impl BasicType {
    /// The name used for this type in PivotScript sources.
    pub const fn script_name(&self) -> &'static str {
        match self {
            BasicType::Number => "Number",
            BasicType::Integer => "Integer",
            BasicType::String => "String",
            BasicType::Boolean => "Boolean",
            BasicType::Vec3 => "Vector3",
            BasicType::Vec2 => "Vector2",
            BasicType::Asset => "Asset",
            BasicType::List => "List",
            BasicType::Void => "Void",
            BasicType::EntityRef => "Entity",
            BasicType::Color => "Color",
            BasicType::ScriptEntity => "ScriptEntity",
        }
    }

    /// Resolve a type name written in a PivotScript declaration.
    ///
    /// `ScriptEntity` only exists at runtime and cannot be declared.
    pub fn from_script_name(name: &str) -> Option<Self> {
        Some(match name {
            "Number" => BasicType::Number,
            "Integer" => BasicType::Integer,
            "String" => BasicType::String,
            "Boolean" => BasicType::Boolean,
            "Vector3" => BasicType::Vec3,
            "Vector2" => BasicType::Vec2,
            "Asset" => BasicType::Asset,
            "List" => BasicType::List,
            "Void" => BasicType::Void,
            "Entity" => BasicType::EntityRef,
            "Color" => BasicType::Color,
            _ => return None,
        })
    }

    /// The value a freshly added component of this type starts with.
    pub fn default_value(&self) -> Value {
        match self {
            BasicType::Number => Value::Number(0.0),
            BasicType::Integer => Value::Integer(0),
            BasicType::String => Value::String(String::new()),
            BasicType::Boolean => Value::Boolean(false),
            BasicType::Vec3 => Value::Vec3(DVec3::ZERO),
            BasicType::Vec2 => Value::Vec2(DVec2::ZERO),
            BasicType::Asset => Value::Asset(Asset::default()),
            BasicType::List => Value::List(Vec::new()),
            BasicType::Void => Value::Void,
            BasicType::EntityRef => Value::EntityRef(EntityRef::EMPTY),
            BasicType::Color => Value::Color(Color::WHITE),
            BasicType::ScriptEntity => Value::ScriptEntity(ScriptEntity::default()),
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

/// The member layout of a record: property name to property type.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct RecordType(BTreeMap<String, Type>);

impl RecordType {
    #[inline]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder style insertion of a member.
    pub fn with(mut self, name: impl Into<String>, ty: impl Into<Type>) -> Self {
        self.insert(name, ty);
        self
    }

    /// Insert a member, returning the previous type of a member with the same name.
    pub fn insert(&mut self, name: impl Into<String>, ty: impl Into<Type>) -> Option<Type> {
        self.0.insert(name.into(), ty.into())
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Type> {
        self.0.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.0.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    /// A record holding the default value of every member.
    pub fn default_value(&self) -> Record {
        self.0
            .iter()
            .map(|(name, ty)| (name.clone(), ty.default_value()))
            .collect()
    }
}

impl FromIterator<(String, Type)> for RecordType {
    fn from_iter<I: IntoIterator<Item = (String, Type)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The type of any [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Basic(BasicType),
    Record(RecordType),
}

impl Type {
    pub const NUMBER: Type = Type::Basic(BasicType::Number);
    pub const INTEGER: Type = Type::Basic(BasicType::Integer);
    pub const STRING: Type = Type::Basic(BasicType::String);
    pub const BOOLEAN: Type = Type::Basic(BasicType::Boolean);
    pub const VEC3: Type = Type::Basic(BasicType::Vec3);
    pub const VOID: Type = Type::Basic(BasicType::Void);

    pub fn default_value(&self) -> Value {
        match self {
            Type::Basic(basic) => basic.default_value(),
            Type::Record(record) => Value::Record(record.default_value()),
        }
    }

    #[inline]
    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            Type::Record(record) => Some(record),
            Type::Basic(_) => None,
        }
    }

    #[inline]
    pub fn as_basic(&self) -> Option<BasicType> {
        match self {
            Type::Basic(basic) => Some(*basic),
            Type::Record(_) => None,
        }
    }
}

impl From<BasicType> for Type {
    #[inline]
    fn from(value: BasicType) -> Self {
        Type::Basic(value)
    }
}

impl From<RecordType> for Type {
    #[inline]
    fn from(value: RecordType) -> Self {
        Type::Record(value)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(basic) => basic.fmt(f),
            Type::Record(record) => {
                f.write_str("{")?;
                for (index, (name, ty)) in record.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_names_round_trip() {
        for name in [
            "Number", "Integer", "String", "Boolean", "Vector3", "Vector2", "Asset", "List",
            "Void", "Entity", "Color",
        ] {
            let ty = BasicType::from_script_name(name).unwrap();
            assert_eq!(ty.script_name(), name);
        }
        assert_eq!(BasicType::from_script_name("ScriptEntity"), None);
        assert_eq!(BasicType::from_script_name("Float"), None);
    }

    #[test]
    fn record_default_value_covers_every_member() {
        // Given
        let shape = RecordType::new()
            .with("velocity", BasicType::Vec3)
            .with("mass", BasicType::Number)
            .with("name", BasicType::String);

        // When
        let value = Type::from(shape.clone()).default_value();

        // Then
        assert_eq!(value.ty(), Type::Record(shape));
        let record = value.as_record().unwrap();
        assert_eq!(record.get("mass"), Some(&Value::Number(0.0)));
        assert_eq!(record.get("velocity"), Some(&Value::Vec3(DVec3::ZERO)));
    }

    #[test]
    fn display_uses_script_names() {
        let ty = Type::Record(
            RecordType::new()
                .with("force", BasicType::Vec3)
                .with("enabled", BasicType::Boolean),
        );
        assert_eq!(ty.to_string(), "{enabled: Boolean, force: Vector3}");
    }
}
