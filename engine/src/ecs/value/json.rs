//! Canonical JSON representation of [`Value`]s.
//!
//! Serialization goes through [`serde::Serialize`], so values can be embedded directly in any
//! serde document (scene files, editor clipboards, ...). Reading is schema driven: the
//! expected [`Type`] decides how an ambiguous JSON shape (a number, a 3-element array) is
//! interpreted.
//!
//! List elements and the components of a script entity have no declared type. They are written
//! in a tagged form, `{"type": "Vector3", "value": [1.0, 0.0, 0.0]}`, whose `type` is the
//! PivotScript type name (or `Record`, whose members are tagged in turn).
//!
//! | Value         | JSON                                       |
//! |---------------|--------------------------------------------|
//! | Number        | number (always with a fractional part)     |
//! | Integer       | integral number                            |
//! | String        | string                                     |
//! | Boolean       | bool                                       |
//! | Vec3 / Vec2   | `[x, y, z]` / `[x, y]`                     |
//! | Color         | `[r, g, b, a]`                             |
//! | Record        | object                                     |
//! | Asset         | asset name string                          |
//! | List          | array of tagged elements                   |
//! | Void          | `null`                                     |
//! | EntityRef     | `{"id": n, "generation": g}` or `null`     |
//! | ScriptEntity  | `{"entity": <EntityRef>, "components": {}}`|
//!
//! The components of a script entity are tagged like list elements.

use glam::{DVec2, DVec3};
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::{Map, Value as Json};

use crate::ecs::{
    Error, Result,
    entity::{Entity, EntityRef, Generation},
    value::{Asset, BasicType, Color, Record, ScriptEntity, Type, Value},
};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::String(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Vec3(v) => v.to_array().serialize(serializer),
            Value::Vec2(v) => v.to_array().serialize(serializer),
            Value::Color(c) => [c.r, c.g, c.b, c.a].serialize(serializer),
            Value::Record(record) => record.serialize(serializer),
            Value::Asset(asset) => serializer.serialize_str(asset.name()),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Tagged(item))?;
                }
                seq.end()
            }
            Value::Void => serializer.serialize_none(),
            Value::EntityRef(entity) => entity.serialize(serializer),
            Value::ScriptEntity(entity) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("entity", &entity.entity)?;
                map.serialize_entry("components", &TaggedRecord(&entity.components))?;
                map.end()
            }
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

const RECORD_TAG: &str = "Record";

/// A value written with its type name, for positions without a declared type.
struct Tagged<'a>(&'a Value);

/// A record whose members are all [`Tagged`].
struct TaggedRecord<'a>(&'a Record);

impl Serialize for Tagged<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self.0 {
            Value::Record(record) => {
                map.serialize_entry("type", RECORD_TAG)?;
                map.serialize_entry("value", &TaggedRecord(record))?;
            }
            value => {
                map.serialize_entry("type", type_tag(value))?;
                map.serialize_entry("value", value)?;
            }
        }
        map.end()
    }
}

impl Serialize for TaggedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, &Tagged(value))?;
        }
        map.end()
    }
}

fn type_tag(value: &Value) -> &'static str {
    match value.ty() {
        Type::Basic(basic) => basic.script_name(),
        Type::Record(_) => RECORD_TAG,
    }
}

impl Serialize for EntityRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.entity() {
            Some(entity) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("id", &entity.id())?;
                map.serialize_entry("generation", &self.generation().value())?;
                map.end()
            }
            None => serializer.serialize_none(),
        }
    }
}

impl Value {
    /// Serialize into a JSON tree.
    pub fn to_json(&self) -> Json {
        // Serializing into `serde_json::Value` only fails for non-string map keys.
        serde_json::to_value(self).unwrap_or(Json::Null)
    }

    /// Read a value of the given type from its canonical JSON shape.
    pub fn from_json(ty: &Type, json: &Json) -> Result<Value> {
        match ty {
            Type::Record(record_type) => {
                let object = json.as_object().ok_or_else(|| invalid(ty, "expected an object"))?;
                let mut record = Record::new();
                for (name, member_type) in record_type.iter() {
                    let member = object
                        .get(name)
                        .ok_or_else(|| invalid(ty, format!("missing member `{name}`")))?;
                    record.insert(name, Value::from_json(member_type, member)?);
                }
                if let Some(extra) = object.keys().find(|key| !record_type.contains(key)) {
                    return Err(invalid(ty, format!("unexpected member `{extra}`")));
                }
                Ok(Value::Record(record))
            }
            Type::Basic(basic) => basic_from_json(*basic, ty, json),
        }
    }
}

fn basic_from_json(basic: BasicType, ty: &Type, json: &Json) -> Result<Value> {
    let value = match basic {
        BasicType::Number => Value::Number(
            json.as_f64()
                .ok_or_else(|| invalid(ty, "expected a number"))?,
        ),
        BasicType::Integer => Value::Integer(
            json.as_i64()
                .ok_or_else(|| invalid(ty, "expected an integer"))?,
        ),
        BasicType::String => Value::String(
            json.as_str()
                .ok_or_else(|| invalid(ty, "expected a string"))?
                .to_string(),
        ),
        BasicType::Boolean => Value::Boolean(
            json.as_bool()
                .ok_or_else(|| invalid(ty, "expected a boolean"))?,
        ),
        BasicType::Vec3 => {
            let [x, y, z] = numbers::<3>(ty, json)?;
            Value::Vec3(DVec3::new(x, y, z))
        }
        BasicType::Vec2 => {
            let [x, y] = numbers::<2>(ty, json)?;
            Value::Vec2(DVec2::new(x, y))
        }
        BasicType::Color => {
            let [r, g, b, a] = numbers::<4>(ty, json)?;
            Value::Color(Color::new(r, g, b, a))
        }
        BasicType::Asset => Value::Asset(Asset::new(
            json.as_str()
                .ok_or_else(|| invalid(ty, "expected an asset name"))?,
        )),
        BasicType::List => Value::List(
            json.as_array()
                .ok_or_else(|| invalid(ty, "expected an array"))?
                .iter()
                .map(tagged_from_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        BasicType::Void => {
            if !json.is_null() {
                return Err(invalid(ty, "expected null"));
            }
            Value::Void
        }
        BasicType::EntityRef => Value::EntityRef(entity_from_json(ty, json)?),
        BasicType::ScriptEntity => {
            let object = json.as_object().ok_or_else(|| invalid(ty, "expected an object"))?;
            let entity = entity_from_json(ty, object.get("entity").unwrap_or(&Json::Null))?;
            let components = match object.get("components") {
                Some(Json::Object(components)) => tagged_record(components)?,
                Some(_) => return Err(invalid(ty, "`components` must be an object")),
                None => Record::new(),
            };
            Value::ScriptEntity(ScriptEntity { entity, components })
        }
    };
    Ok(value)
}

/// Read a value written by [`Tagged`].
fn tagged_from_json(json: &Json) -> Result<Value> {
    let untyped = Type::Basic(BasicType::Void);
    let tag = json
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| invalid(&untyped, "expected a `type` tag"))?;
    let value = json
        .get("value")
        .ok_or_else(|| invalid(&untyped, format!("missing `value` for `{tag}`")))?;
    match tag {
        RECORD_TAG => {
            let members = value
                .as_object()
                .ok_or_else(|| invalid(&untyped, "expected a tagged record"))?;
            Ok(Value::Record(tagged_record(members)?))
        }
        "ScriptEntity" => basic_from_json(
            BasicType::ScriptEntity,
            &Type::Basic(BasicType::ScriptEntity),
            value,
        ),
        name => {
            let basic = BasicType::from_script_name(name)
                .ok_or_else(|| invalid(&untyped, format!("unknown type tag `{name}`")))?;
            basic_from_json(basic, &Type::Basic(basic), value)
        }
    }
}

fn tagged_record(members: &Map<String, Json>) -> Result<Record> {
    members
        .iter()
        .map(|(name, member)| Ok((name.clone(), tagged_from_json(member)?)))
        .collect()
}

fn entity_from_json(ty: &Type, json: &Json) -> Result<EntityRef> {
    if json.is_null() {
        return Ok(EntityRef::EMPTY);
    }
    let field = |name: &str| {
        json.get(name)
            .and_then(Json::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| invalid(ty, format!("expected an unsigned `{name}`")))
    };
    Ok(EntityRef::new(
        Entity::new(field("id")?),
        Generation::new(field("generation")?),
    ))
}

fn numbers<const N: usize>(ty: &Type, json: &Json) -> Result<[f64; N]> {
    let items = json
        .as_array()
        .filter(|items| items.len() == N)
        .ok_or_else(|| invalid(ty, format!("expected an array of {N} numbers")))?;
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item
            .as_f64()
            .ok_or_else(|| invalid(ty, format!("expected an array of {N} numbers")))?;
    }
    Ok(out)
}

#[inline]
fn invalid(ty: &Type, reason: impl Into<String>) -> Error {
    Error::InvalidJson {
        expected: ty.clone(),
        reason: reason.into(),
    }
}
