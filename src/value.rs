// value.rs - A single cell of a fixture row
//
// Rows are heterogeneous, so every cell is a `Value`. The Postgres executor
// binds each variant with its natural SQL type, except text, which follows
// the type of the placeholder it fills.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dynamically typed fixture value.
///
/// Deserialization is untagged and only produces the JSON-shaped variants
/// (`Null`, `Bool`, `Int`, `Float`, `Text`, `Json`); the richer variants are
/// built from Rust values through the `From` impls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    #[serde(skip_deserializing)]
    Bytes(Vec<u8>),
    #[serde(skip_deserializing)]
    Uuid(Uuid),
    #[serde(skip_deserializing)]
    Date(NaiveDate),
    #[serde(skip_deserializing)]
    Timestamp(NaiveDateTime),
    #[serde(skip_deserializing)]
    TimestampTz(DateTime<Utc>),
    #[serde(skip_deserializing)]
    Decimal(Decimal),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "'{}'", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v),
            Value::TimestampTz(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Decimal => Decimal,
    serde_json::Value => Json,
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Builds a `Vec<Value>` row from heterogeneous expressions.
///
/// ```
/// use pg_fixtures::{row, Value};
///
/// let r = row!["myid", "Elon", 42];
/// assert_eq!(r, vec![Value::from("myid"), Value::from("Elon"), Value::Int(42)]);
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::Value::from($value)),*]
    };
}
