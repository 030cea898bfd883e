use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// A decoded JSON value queried by cassia path expressions.
///
/// Numbers are carried as [`rust_decimal::Decimal`] tokens so that literals
/// written in a query compare against document numbers by numeric value
/// rather than by floating-point representation. Conversion to `f64` happens
/// on demand at comparison sites.
///
/// # Examples
///
/// ```
/// use cassia::Value;
/// use rust_decimal::Decimal;
/// use std::collections::HashMap;
///
/// let null = Value::Null;
/// let boolean = Value::Boolean(true);
/// let number = Value::Number(Decimal::new(314, 2)); // 3.14
/// let string = Value::String("hello".to_string());
///
/// let array = Value::Array(vec![Value::Number(Decimal::from(1))]);
///
/// let mut obj = HashMap::new();
/// obj.insert("key".to_string(), Value::String("value".to_string()));
/// let object = Value::Object(obj);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON null
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Arbitrary-precision decimal number
    Number(Decimal),

    /// UTF-8 string
    String(String),

    /// Array of values (homogeneous or heterogeneous)
    Array(Vec<Value>),

    /// Object with string keys and value values
    Object(HashMap<String, Value>),
}

impl Value {
    /// Get as float, converting the decimal token on demand
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Get the underlying decimal token
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Structural deep equality over the closed value variants.
    ///
    /// Numbers compare by numeric value, so `1.0` equals `1.00`. Objects
    /// compare by key set and member values; key order never matters.
    pub fn deep_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.deep_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.deep_eq(w)))
            }
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                let d = if let Some(i) = n.as_i64() {
                    Decimal::from(i)
                } else if let Some(u) = n.as_u64() {
                    Decimal::from(u)
                } else {
                    // serde_json numbers are always finite; magnitudes
                    // beyond the decimal range saturate rather than
                    // collapse to zero
                    match n.as_f64() {
                        Some(f) => Decimal::from_f64(f).unwrap_or(if f < 0.0 {
                            Decimal::MIN
                        } else {
                            Decimal::MAX
                        }),
                        None => Decimal::ZERO,
                    }
                };
                Value::Number(d)
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Number(d) => match d.to_i64() {
                Some(i) if d.is_integer() => serde_json::Value::from(i),
                _ => serde_json::Number::from_f64(d.to_f64().unwrap_or_default())
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
