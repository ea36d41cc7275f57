// Lenient deserializers for the admin API's loosely-typed JSON.
//
// The backend serializes database rows directly, so ids and counters arrive
// as numbers or numeric strings and flags as `0/1`, `"0"/"1"` or booleans.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(u64::from(*b)),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(s.trim(), "" | "0" | "false"),
        _ => false,
    }
}

/// Record id: number or numeric string.
pub(crate) fn id<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(d)?;
    number(&value).ok_or_else(|| serde::de::Error::custom(format!("invalid id: {value}")))
}

/// Optional id; `null`, `""` and `0` all mean "unset".
pub(crate) fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(number).filter(|n| *n != 0))
}

/// Counter that defaults to zero on anything unparseable.
pub(crate) fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(number).unwrap_or(0))
}

/// Optional counter (`total`, `totalPages`).
pub(crate) fn opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(number))
}

/// Activity and visibility flags.
pub(crate) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().is_some_and(truthy))
}

/// Flag that defaults to `true` when absent or null.
pub(crate) fn flag_default_on<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        None | Some(Value::Null) => true,
        Some(v) => truthy(&v),
    })
}

/// String that may arrive as `null` or a number.
pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Optional string; empty strings collapse to `None`.
pub(crate) fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = text(d)?;
    Ok(Some(value).filter(|s| !s.is_empty()))
}

/// Wire encoding for boolean flags on payloads.
pub fn bit(value: bool) -> u8 {
    u8::from(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "id")]
        id: u64,
        #[serde(default, deserialize_with = "flag")]
        active: bool,
        #[serde(default, deserialize_with = "opt_id")]
        parent: Option<u64>,
        #[serde(default, deserialize_with = "opt_text")]
        note: Option<String>,
    }

    #[test]
    fn accepts_numeric_strings_and_int_flags() {
        let row: Row =
            serde_json::from_value(json!({"id": "42", "active": "1", "parent": 7})).unwrap();
        assert_eq!(row.id, 42);
        assert!(row.active);
        assert_eq!(row.parent, Some(7));
        assert!(row.note.is_none());
    }

    #[test]
    fn zero_parent_and_empty_note_are_unset() {
        let row: Row = serde_json::from_value(
            json!({"id": 1, "active": 0, "parent": "0", "note": ""}),
        )
        .unwrap();
        assert!(!row.active);
        assert_eq!(row.parent, None);
        assert_eq!(row.note, None);
    }

    #[test]
    fn rejects_non_numeric_id() {
        let result: Result<Row, _> = serde_json::from_value(json!({"id": "abc"}));
        assert!(result.is_err());
    }
}
