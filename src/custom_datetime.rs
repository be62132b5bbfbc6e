use chrono::{DateTime, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;
use std::result::Result;

use crate::util::{api_to_timestamp, timestamp_to_api};

// Timestamps arrive either as RFC 3339 strings or as {"seconds": .., "nanos": ..} objects.
fn from_value<E: Error>(doc: Value) -> Result<DateTime<Utc>, E> {
    match doc {
        Value::String(s) => api_to_timestamp(&s).map_err(E::custom),
        Value::Object(o) => {
            let seconds = match o.get("seconds") {
                Some(Value::String(s)) => s.parse::<i64>().map_err(E::custom)?,
                Some(Value::Number(n)) => n
                    .as_i64()
                    .ok_or_else(|| E::custom("seconds out of range"))?,
                None => 0,
                Some(other) => return Err(E::custom(format!("unexpected seconds {}", other)))
            };
            let nanos = o
                .get("nanos")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, nanos as u32)
                .ok_or_else(|| E::custom("timestamp out of range"))
        }
        other => Err(E::custom(format!(
            "expected string or object for datetime, got {}",
            other
        )))
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>
{
    let doc = Value::deserialize(deserializer)?;
    from_value(doc)
}

pub fn serialize<S>(source: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer
{
    serializer.serialize_str(&timestamp_to_api(*source))
}

/// Same encoding for optional fields; `null` and a missing field both map to `None`.
pub mod option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(doc) => from_value(doc).map(Some)
        }
    }

    pub fn serialize<S>(source: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        match source {
            Some(ts) => serializer.serialize_str(&timestamp_to_api(*ts)),
            None => serializer.serialize_none()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "crate::custom_datetime")]
        time: DateTime<Utc>,
        #[serde(default, with = "crate::custom_datetime::option")]
        first: Option<DateTime<Utc>>
    }

    #[test]
    fn test_string_and_object_forms() {
        let from_str: Stamped =
            serde_json::from_str(r#"{"time": "2023-04-18T07:00:00Z"}"#).unwrap();
        assert_eq!(from_str.time, Utc.with_ymd_and_hms(2023, 4, 18, 7, 0, 0).unwrap());
        assert_eq!(from_str.first, None);

        let from_obj: Stamped = serde_json::from_str(
            r#"{"time": {"seconds": "1681801200", "nanos": 0}, "first": null}"#
        )
        .unwrap();
        assert_eq!(from_obj.time, Utc.with_ymd_and_hms(2023, 4, 18, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_serialize() {
        let value = Stamped {
            time: Utc.with_ymd_and_hms(2023, 4, 18, 7, 0, 0).unwrap(),
            first: Some(Utc.with_ymd_and_hms(2000, 1, 4, 0, 0, 0).unwrap())
        };
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"time":"2023-04-18T07:00:00Z","first":"2000-01-04T00:00:00Z"}"#
        );
    }

    #[test]
    fn test_rejects_numbers() {
        assert!(serde_json::from_str::<Stamped>(r#"{"time": 5}"#).is_err());
    }
}
