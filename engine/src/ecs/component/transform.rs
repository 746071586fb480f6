use glam::DVec3;

use crate::ecs::{
    component::ComponentValue,
    value::{BasicType, Record, RecordType, Value},
};

/// The built-in spatial component. Stored natively so renderers can read it without going
/// through [`Value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: DVec3,
    pub rotation: DVec3,
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// The record type scripts see.
    pub fn shape() -> RecordType {
        RecordType::new()
            .with("position", BasicType::Vec3)
            .with("rotation", BasicType::Vec3)
            .with("scale", BasicType::Vec3)
    }
}

impl ComponentValue for Transform {
    fn to_value(&self) -> Value {
        Record::new()
            .with("position", self.position)
            .with("rotation", self.rotation)
            .with("scale", self.scale)
            .into()
    }

    fn from_value(value: &Value) -> Option<Self> {
        let record = value.as_record()?;
        let member = |name| record.get(name).and_then(Value::as_vec3);
        Some(Self {
            position: member("position")?,
            rotation: member("rotation")?,
            scale: member("scale")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::value::Type;

    #[test]
    fn value_conversion_keeps_every_member() {
        // Given
        let transform = Transform {
            position: DVec3::new(1.0, 2.0, 3.0),
            rotation: DVec3::new(0.0, 90.0, 0.0),
            scale: DVec3::splat(2.0),
        };

        // When
        let value = transform.to_value();

        // Then
        assert_eq!(value.ty(), Type::Record(Transform::shape()));
        assert_eq!(Transform::from_value(&value), Some(transform));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert_eq!(Transform::from_value(&Value::Number(1.0)), None);
        let partial = Record::new().with("position", DVec3::ZERO).into();
        assert_eq!(Transform::from_value(&partial), None);
    }

    #[test]
    fn default_scale_is_one() {
        assert_eq!(Transform::default().scale, DVec3::ONE);
    }
}
