use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Query strings deliver numbers as text (and flattened structs cannot
/// deserialize them natively), so years arrive through this helper.
pub fn deserialize_optional_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i32>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        class_id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_i32")]
        year: Option<i32>,
    }

    #[test]
    fn test_empty_strings_are_none() {
        let q: Query = serde_json::from_str(r#"{"class_id":"","year":""}"#).unwrap();
        assert!(q.class_id.is_none());
        assert!(q.year.is_none());
    }

    #[test]
    fn test_values_are_parsed() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"class_id":"{}","year":"2024"}}"#, id);
        let q: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(q.class_id, Some(id));
        assert_eq!(q.year, Some(2024));
    }

    #[test]
    fn test_invalid_uuid_is_rejected() {
        assert!(serde_json::from_str::<Query>(r#"{"class_id":"nope"}"#).is_err());
    }
}
