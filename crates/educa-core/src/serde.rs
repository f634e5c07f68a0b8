//! Deserialization helpers for query strings.
//!
//! Browsers and form libraries routinely send empty strings for unset filters
//! (`?class_id=&year=`). These helpers treat an empty value as `None` and parse
//! everything else from its string form, which also makes them safe to use on
//! `#[serde(flatten)]`ed query structs.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

fn deserialize_optional_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse::<T>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_parsed(deserializer)
}

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_parsed(deserializer)
}

pub fn deserialize_optional_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_parsed(deserializer)
}

pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_parsed(deserializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Filters {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_i32")]
        year: Option<i32>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        graded: Option<bool>,
    }

    #[test]
    fn test_empty_strings_are_none() {
        let f: Filters = serde_json::from_str(r#"{"id":"","year":"","graded":""}"#).unwrap();
        assert!(f.id.is_none());
        assert!(f.year.is_none());
        assert!(f.graded.is_none());
    }

    #[test]
    fn test_values_are_parsed() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"id":"{}","year":"2025","graded":"true"}}"#, id);
        let f: Filters = serde_json::from_str(&json).unwrap();
        assert_eq!(f.id, Some(id));
        assert_eq!(f.year, Some(2025));
        assert_eq!(f.graded, Some(true));
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let f: Filters = serde_json::from_str("{}").unwrap();
        assert!(f.id.is_none() && f.year.is_none() && f.graded.is_none());
    }

    #[test]
    fn test_invalid_value_errors() {
        let result: Result<Filters, _> = serde_json::from_str(r#"{"year":"abc"}"#);
        assert!(result.is_err());
    }
}
