//! Binary operators over [`Value`]s.
//!
//! Operators never coerce: both operands must already have the types the operator is defined
//! for. The only mixed pairs are vector/number scaling. Everything else is an
//! [`Error::InvalidOperation`].

use std::fmt;

use crate::ecs::{Error, Result, value::Value};

/// A binary operator usable in PivotScript expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Mod,
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::And,
        Operator::Or,
    ];

    pub const fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Apply the operator to two operands.
    pub fn apply(self, lhs: &Value, rhs: &Value) -> Result<Value> {
        use Value::*;

        let result = match (self, lhs, rhs) {
            (Operator::Eq, _, _) => Boolean(self.same_type(lhs, rhs)? && lhs == rhs),
            (Operator::Ne, _, _) => Boolean(self.same_type(lhs, rhs)? && lhs != rhs),

            (Operator::And, Boolean(a), Boolean(b)) => Boolean(*a && *b),
            (Operator::Or, Boolean(a), Boolean(b)) => Boolean(*a || *b),

            (_, Number(a), Number(b)) => self.numbers(*a, *b)?,
            (_, Integer(a), Integer(b)) => self.integers(*a, *b)?,
            (_, String(a), String(b)) => match self {
                Operator::Add => String(format!("{a}{b}")),
                Operator::Lt => Boolean(a < b),
                Operator::Le => Boolean(a <= b),
                Operator::Gt => Boolean(a > b),
                Operator::Ge => Boolean(a >= b),
                _ => return Err(self.invalid(lhs, rhs)),
            },

            (Operator::Add, Vec3(a), Vec3(b)) => Vec3(*a + *b),
            (Operator::Sub, Vec3(a), Vec3(b)) => Vec3(*a - *b),
            (Operator::Mul, Vec3(a), Number(b)) | (Operator::Mul, Number(b), Vec3(a)) => {
                Vec3(*a * *b)
            }
            (Operator::Div, Vec3(a), Number(b)) => Vec3(*a / self.divisor(*b)?),

            (Operator::Add, Vec2(a), Vec2(b)) => Vec2(*a + *b),
            (Operator::Sub, Vec2(a), Vec2(b)) => Vec2(*a - *b),
            (Operator::Mul, Vec2(a), Number(b)) | (Operator::Mul, Number(b), Vec2(a)) => {
                Vec2(*a * *b)
            }
            (Operator::Div, Vec2(a), Number(b)) => Vec2(*a / self.divisor(*b)?),

            _ => return Err(self.invalid(lhs, rhs)),
        };
        Ok(result)
    }

    fn numbers(self, a: f64, b: f64) -> Result<Value> {
        Ok(match self {
            Operator::Add => Value::Number(a + b),
            Operator::Sub => Value::Number(a - b),
            Operator::Mul => Value::Number(a * b),
            Operator::Div => Value::Number(a / self.divisor(b)?),
            Operator::Mod => Value::Number(a % self.divisor(b)?),
            Operator::Lt => Value::Boolean(a < b),
            Operator::Le => Value::Boolean(a <= b),
            Operator::Gt => Value::Boolean(a > b),
            Operator::Ge => Value::Boolean(a >= b),
            _ => return Err(self.invalid(&Value::Number(a), &Value::Number(b))),
        })
    }

    fn integers(self, a: i64, b: i64) -> Result<Value> {
        Ok(match self {
            Operator::Add => Value::Integer(a.wrapping_add(b)),
            Operator::Sub => Value::Integer(a.wrapping_sub(b)),
            Operator::Mul => Value::Integer(a.wrapping_mul(b)),
            Operator::Div | Operator::Mod if b == 0 => {
                return Err(Error::DivisionByZero { operator: self });
            }
            Operator::Div => Value::Integer(a.wrapping_div(b)),
            Operator::Mod => Value::Integer(a.wrapping_rem(b)),
            Operator::Lt => Value::Boolean(a < b),
            Operator::Le => Value::Boolean(a <= b),
            Operator::Gt => Value::Boolean(a > b),
            Operator::Ge => Value::Boolean(a >= b),
            _ => return Err(self.invalid(&Value::Integer(a), &Value::Integer(b))),
        })
    }

    #[inline]
    fn divisor(self, value: f64) -> Result<f64> {
        if value == 0.0 {
            Err(Error::DivisionByZero { operator: self })
        } else {
            Ok(value)
        }
    }

    /// Equality is only defined between values of the same type.
    fn same_type(self, lhs: &Value, rhs: &Value) -> Result<bool> {
        if lhs.ty() == rhs.ty() {
            Ok(true)
        } else {
            Err(self.invalid(lhs, rhs))
        }
    }

    fn invalid(self, lhs: &Value, rhs: &Value) -> Error {
        Error::InvalidOperation {
            operator: self,
            left: lhs.ty(),
            right: rhs.ty(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;
    use crate::ecs::value::Type;

    #[test]
    fn symbols_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(Operator::from_symbol("="), None);
    }

    #[test]
    fn number_arithmetic() {
        let two = Value::Number(2.0);
        let three = Value::Number(3.0);
        assert_eq!(Operator::Add.apply(&two, &three), Ok(Value::Number(5.0)));
        assert_eq!(Operator::Mul.apply(&two, &three), Ok(Value::Number(6.0)));
        assert_eq!(Operator::Mod.apply(&three, &two), Ok(Value::Number(1.0)));
        assert_eq!(Operator::Lt.apply(&two, &three), Ok(Value::Boolean(true)));
    }

    #[test]
    fn integer_arithmetic_truncates() {
        assert_eq!(
            Operator::Div.apply(&Value::Integer(7), &Value::Integer(2)),
            Ok(Value::Integer(3))
        );
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(
            Operator::Div.apply(&Value::Integer(1), &Value::Integer(0)),
            Err(Error::DivisionByZero {
                operator: Operator::Div
            })
        );
        assert_eq!(
            Operator::Mod.apply(&Value::Number(1.0), &Value::Number(0.0)),
            Err(Error::DivisionByZero {
                operator: Operator::Mod
            })
        );
        assert!(
            Operator::Div
                .apply(&Value::Vec3(DVec3::ONE), &Value::Number(0.0))
                .is_err()
        );
    }

    #[test]
    fn vector_scaling() {
        let force = Value::Vec3(DVec3::new(0.0, -10.0, 0.0));
        let dt = Value::Number(0.5);
        assert_eq!(
            Operator::Mul.apply(&force, &dt),
            Ok(Value::Vec3(DVec3::new(0.0, -5.0, 0.0)))
        );
        assert_eq!(
            Operator::Mul.apply(&dt, &force),
            Ok(Value::Vec3(DVec3::new(0.0, -5.0, 0.0)))
        );
    }

    #[test]
    fn mixed_types_do_not_coerce() {
        let err = Operator::Add
            .apply(&Value::Integer(1), &Value::Number(1.0))
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidOperation {
                operator: Operator::Add,
                left: Type::INTEGER,
                right: Type::NUMBER,
            }
        );
        assert!(
            Operator::Eq
                .apply(&Value::from("1"), &Value::Integer(1))
                .is_err()
        );
    }

    #[test]
    fn equality_on_identical_types() {
        assert_eq!(
            Operator::Eq.apply(&Value::from("oui"), &Value::from("oui")),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            Operator::Ne.apply(&Value::Boolean(true), &Value::Boolean(false)),
            Ok(Value::Boolean(true))
        );
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            Operator::Add.apply(&Value::from("new"), &Value::from("Name")),
            Ok(Value::from("newName"))
        );
        assert!(
            Operator::Sub
                .apply(&Value::from("a"), &Value::from("b"))
                .is_err()
        );
    }

    #[test]
    fn logical_operators_need_booleans() {
        assert_eq!(
            Operator::And.apply(&Value::Boolean(true), &Value::Boolean(false)),
            Ok(Value::Boolean(false))
        );
        assert!(
            Operator::Or
                .apply(&Value::Boolean(true), &Value::Number(1.0))
                .is_err()
        );
    }
}
