//! Runtime values flowing through the tree-walking evaluator.

use std::fmt;

use crate::dsl::ast::{BinaryOp, Literal, Type};
use crate::engine::error::RenderErrorKind;

/// A runtime value. `Audio` carries a single sample; the distinction from
/// `Float` exists so arithmetic can propagate the audio rate through
/// expressions the way the type checker inferred it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f32),
    Str(String),
    Audio(f32),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Str(_) => Type::Str,
            Value::Audio(_) => Type::Audio,
        }
    }

    /// Integer payload. Only called on values the analyzer typed as `Int`.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(v) => *v,
            Value::Float(v) | Value::Audio(v) => *v as i64,
            Value::Str(_) => 0,
        }
    }

    /// Numeric payload widened to `f32`.
    pub fn as_f32(&self) -> f32 {
        match self {
            Value::Int(v) => *v as f32,
            Value::Float(v) | Value::Audio(v) => *v,
            Value::Str(_) => 0.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Value::Str(s) => s,
            _ => "",
        }
    }

    /// The audio sample this value contributes to an output channel.
    pub fn as_sample(&self) -> f32 {
        self.as_f32()
    }

    /// Adjust a value to the declared type of the slot receiving it,
    /// applying the same widenings the type checker accepts. A value that
    /// already matches the slot (or that the checker would have rejected)
    /// passes through unchanged.
    pub fn coerce(self, to: Type) -> Value {
        match (self, to) {
            (Value::Int(v), Type::Float) => Value::Float(v as f32),
            (Value::Int(v), Type::Audio) => Value::Audio(v as f32),
            (Value::Float(v), Type::Audio) => Value::Audio(v),
            (v, _) => v,
        }
    }

    /// Apply a binary arithmetic operator.
    ///
    /// Numeric promotion: Int op Int stays Int; anything involving a Float
    /// or Audio operand is computed in `f32`, and the result is Audio if
    /// either side is Audio. Division by zero is a runtime error for both
    /// integer and float operands.
    pub fn apply(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RenderErrorKind> {
        if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
            let v = match op {
                BinaryOp::Add => a.wrapping_add(*b),
                BinaryOp::Sub => a.wrapping_sub(*b),
                BinaryOp::Mul => a.wrapping_mul(*b),
                BinaryOp::Div => {
                    if *b == 0 {
                        return Err(RenderErrorKind::DivisionByZero);
                    }
                    a / b
                }
            };
            return Ok(Value::Int(v));
        }

        let a = lhs.as_f32();
        let b = rhs.as_f32();
        let v = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => {
                if b == 0.0 {
                    return Err(RenderErrorKind::DivisionByZero);
                }
                a / b
            }
        };
        if matches!(lhs, Value::Audio(_)) || matches!(rhs, Value::Audio(_)) {
            Ok(Value::Audio(v))
        } else {
            Ok(Value::Float(v))
        }
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Int(v) => Value::Int(*v),
            Literal::Float(v) => Value::Float(*v),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) | Value::Audio(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_arithmetic_stays_int() {
        let v = Value::apply(BinaryOp::Add, &Value::Int(2), &Value::Int(3)).unwrap();
        assert_eq!(v, Value::Int(5));
        let v = Value::apply(BinaryOp::Div, &Value::Int(7), &Value::Int(2)).unwrap();
        assert_eq!(v, Value::Int(3));
    }

    #[test]
    fn mixed_arithmetic_widens_to_float() {
        let v = Value::apply(BinaryOp::Mul, &Value::Int(2), &Value::Float(1.5)).unwrap();
        assert_eq!(v, Value::Float(3.0));
    }

    #[test]
    fn audio_operand_makes_audio_result() {
        let v = Value::apply(BinaryOp::Mul, &Value::Audio(0.5), &Value::Float(2.0)).unwrap();
        assert_eq!(v, Value::Audio(1.0));
        let v = Value::apply(BinaryOp::Add, &Value::Audio(0.25), &Value::Audio(0.25)).unwrap();
        assert_eq!(v, Value::Audio(0.5));
    }

    #[test]
    fn integer_division_by_zero() {
        let err = Value::apply(BinaryOp::Div, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err, RenderErrorKind::DivisionByZero);
    }

    #[test]
    fn float_division_by_zero() {
        let err = Value::apply(BinaryOp::Div, &Value::Float(1.0), &Value::Float(0.0)).unwrap_err();
        assert_eq!(err, RenderErrorKind::DivisionByZero);
    }

    #[test]
    fn coerce_widens_to_slot_type() {
        assert_eq!(Value::Int(3).coerce(Type::Float), Value::Float(3.0));
        assert_eq!(Value::Int(3).coerce(Type::Audio), Value::Audio(3.0));
        assert_eq!(Value::Float(0.5).coerce(Type::Audio), Value::Audio(0.5));
        assert_eq!(Value::Int(3).coerce(Type::Int), Value::Int(3));
        assert_eq!(Value::Float(0.5).coerce(Type::Float), Value::Float(0.5));
    }

    #[test]
    fn literal_conversion() {
        assert_eq!(Value::from(&Literal::Int(42)), Value::Int(42));
        assert_eq!(Value::from(&Literal::Float(0.5)), Value::Float(0.5));
        assert_eq!(
            Value::from(&Literal::Str("hi".to_string())),
            Value::Str("hi".to_string())
        );
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(Value::Str("x".to_string()).to_string(), "x");
    }

    #[test]
    fn type_tags() {
        assert_eq!(Value::Audio(0.0).ty(), Type::Audio);
        assert_eq!(Value::Float(0.0).ty(), Type::Float);
    }
}
