use alloc::string::{String, ToString};
use core::convert::TryFrom;
use core::fmt;

#[cfg(feature = "derive")]
use serde::Deserialize;

use crate::Error;

/// A resolved argument value. Defaults use the same type, and the variant of a default decides
/// how a stored token is converted.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "derive", derive(Deserialize), serde(untagged))]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

macro_rules! converters {
    ($x:ty, $into:ident) => {
        impl From<$x> for Value {
            fn from(val: $x) -> Self {
                Value::$into(val)
            }
        }

        impl TryFrom<Value> for $x {
            type Error = Error<'static>;

            fn try_from(val: Value) -> Result<$x, Self::Error> {
                match val {
                    Value::$into(b) => Ok(b),
                    e => Err(Error::WrongValueType(e)),
                }
            }
        }

        impl<'a> TryFrom<&'a Value> for &'a $x {
            type Error = Error<'static>;

            fn try_from(val: &'a Value) -> Result<&'a $x, Self::Error> {
                match val {
                    Value::$into(b) => Ok(b),
                    e => Err(Error::WrongValueType(e.clone())),
                }
            }
        }
    };
}

converters!(bool, Bool);
converters!(i64, Int);
converters!(f64, Float);
converters!(String, String);

impl<'a> TryFrom<&'a Value> for &'a str {
    type Error = Error<'static>;

    fn try_from(val: &'a Value) -> Result<&'a str, Self::Error> {
        match val {
            Value::String(b) => Ok(b),
            e => Err(Error::WrongValueType(e.clone())),
        }
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::Int(i64::from(val))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(d) => write!(f, "{}", d),
            Value::String(s) => f.write_str(s),
        }
    }
}

macro_rules! cast {
    ($name:ident, $val:ident, $x:ty) => {
        Value::from(
            $val.parse::<$x>()
                .map_err(|_| Error::WrongCastType($name, $val.to_string()))?,
        )
    };
}

/// Converts a raw token into a value of the same variant as `default`. Without a default, or
/// with a string default, the token is kept as is.
pub(crate) fn cast_token<'a>(name: &'a str, default: Option<&Value>, val: &str) -> Result<Value, Error<'a>> {
    Ok(match default {
        Some(Value::Bool(_)) => cast!(name, val, bool),
        Some(Value::Int(_)) => cast!(name, val, i64),
        Some(Value::Float(_)) => cast!(name, val, f64),
        Some(Value::String(_)) | None => Value::from(val),
    })
}

#[cfg(test)]
mod tests {
    use super::{cast_token, Value};
    use crate::Error;
    use pretty_assertions::assert_eq;
    use std::convert::TryFrom;

    #[test]
    fn test_cast_without_default_keeps_string() {
        assert_eq!(Ok(Value::from("42")), cast_token("arg", None, "42"));
    }

    #[test]
    fn test_cast_follows_default_type() {
        assert_eq!(Ok(Value::Int(-7)), cast_token("arg", Some(&Value::Int(3)), "-7"));
        assert_eq!(Ok(Value::Float(2.5)), cast_token("arg", Some(&Value::Float(0.0)), "2.5"));
        assert_eq!(Ok(Value::Bool(true)), cast_token("arg", Some(&Value::Bool(false)), "true"));
        assert_eq!(Ok(Value::from("x")), cast_token("arg", Some(&Value::from("y")), "x"));
    }

    #[test]
    fn test_cast_failure_names_the_arg() {
        assert_eq!(
            Err(Error::WrongCastType("count", "many".to_string())),
            cast_token("count", Some(&Value::Int(1)), "many")
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Ok(true), bool::try_from(Value::Bool(true)));
        assert_eq!(Ok("lol"), <&str>::try_from(&Value::from("lol")));
        assert_eq!(Err(Error::WrongValueType(Value::Int(1))), String::try_from(Value::from(1)));
    }

    #[test]
    fn test_display() {
        assert_eq!("result.txt", Value::from("result.txt").to_string());
        assert_eq!("false", Value::Bool(false).to_string());
        assert_eq!("12", Value::Int(12).to_string());
    }
}
