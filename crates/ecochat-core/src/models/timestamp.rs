use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Current time truncated to whole milliseconds.
///
/// Everything stored in a `Store` goes through this so that a value survives
/// the RFC 3339 round trip in `rfc3339_millis` unchanged.
pub fn now() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(at.timestamp_millis())
        .single()
        .unwrap_or(at)
}

/// Explicit timestamp encoding for persisted snapshots.
///
/// Serializes as `2025-03-01T12:00:00.123Z` and parses any RFC 3339 string back
/// into `DateTime<Utc>`. Anything else is a deserialization error rather than a
/// silently kept string.
pub mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| super::truncate_to_millis(at.with_timezone(&Utc)))
            .map_err(|e| D::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}

/// Second-precision UTC rendering used by front ends.
pub fn display(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
