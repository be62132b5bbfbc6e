use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Convert a chrono timestamp to the gateway's RFC 3339 format (UTC, `Z` suffix)
///
/// # Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use rust_invest::util::timestamp_to_api;
///
/// let ts = Utc.with_ymd_and_hms(2023, 4, 18, 0, 0, 0).unwrap();
/// assert_eq!(timestamp_to_api(ts), "2023-04-18T00:00:00Z");
/// ```
pub fn timestamp_to_api(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a gateway timestamp string into a UTC chrono timestamp
pub fn api_to_timestamp(ts: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(ts).map(|ts| ts.with_timezone(&Utc))
}

/// Serialize an `i64` as a decimal string, the way the gateway encodes 64-bit integers
pub fn serialize_i64_str<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer
{
    serializer.serialize_str(&value.to_string())
}

/// Deserialize an `i64` sent either as a decimal string or as a plain JSON number
pub fn deserialize_i64_str<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>
{
    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error
        {
            i64::try_from(value).map_err(E::custom)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error
        {
            value.parse::<i64>().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(I64Visitor)
}
