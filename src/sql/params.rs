//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value that can be bound to a PostgreSQL query. Converts from serde_json::Value.
/// Each variant reports its own wire type; placeholders carry a cast to the column type.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Json(Value),
}

impl PgBindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PgBindValue::I64(i),
                None => PgBindValue::F64(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => PgBindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => PgBindValue::Json(v.clone()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            PgBindValue::Null => Ok(IsNull::Yes),
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf),
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::String(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf),
            PgBindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null | PgBindValue::String(_) => PgTypeInfo::with_name("text"),
            PgBindValue::Bool(_) => PgTypeInfo::with_name("bool"),
            PgBindValue::I64(_) => PgTypeInfo::with_name("int8"),
            PgBindValue::F64(_) => PgTypeInfo::with_name("float8"),
            PgBindValue::Json(_) => PgTypeInfo::with_name("jsonb"),
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("text")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_keep_integer_and_float_shapes() {
        assert_eq!(PgBindValue::from_json(&json!(42)), PgBindValue::I64(42));
        assert_eq!(PgBindValue::from_json(&json!(6.5)), PgBindValue::F64(6.5));
    }

    #[test]
    fn objects_and_arrays_bind_as_json() {
        let coords = json!({"lat": -8.76, "lng": -63.9});
        assert_eq!(PgBindValue::from_json(&coords), PgBindValue::Json(coords.clone()));
        assert!(matches!(PgBindValue::from_json(&json!(["a"])), PgBindValue::Json(_)));
        assert_eq!(PgBindValue::from_json(&Value::Null), PgBindValue::Null);
    }
}
