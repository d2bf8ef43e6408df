//! Serde helpers for loosely-typed form payloads.

use serde::{Deserialize, Deserializer, de::DeserializeOwned, de::Error};
use serde_json::Value;

/// Deserialize an optional field, treating `""` (and whitespace-only strings)
/// the same as `null` or an absent key.
///
/// Use together with `#[serde(default)]` so a missing key also becomes `None`.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(other) => T::deserialize(other).map(Some).map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::empty_string_as_none;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        name: Option<String>,
        #[serde(default, deserialize_with = "empty_string_as_none")]
        amount: Option<f64>,
    }

    #[test]
    fn blank_values_become_none() {
        let payload: Payload = serde_json::from_str(r#"{"name": "", "amount": ""}"#).unwrap();
        assert_eq!(payload.name, None);
        assert_eq!(payload.amount, None);

        let payload: Payload = serde_json::from_str(r#"{"name": "  ", "amount": null}"#).unwrap();
        assert_eq!(payload.name, None);
        assert_eq!(payload.amount, None);

        let payload: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.name, None);
        assert_eq!(payload.amount, None);
    }

    #[test]
    fn present_values_pass_through() {
        let payload: Payload =
            serde_json::from_str(r#"{"name": "PED-1", "amount": 12.5}"#).unwrap();
        assert_eq!(payload.name.as_deref(), Some("PED-1"));
        assert_eq!(payload.amount, Some(12.5));
    }

    #[test]
    fn wrong_type_is_an_error() {
        let result: Result<Payload, _> = serde_json::from_str(r#"{"amount": "abc"}"#);
        assert!(result.is_err());
    }
}
