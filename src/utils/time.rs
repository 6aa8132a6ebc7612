//! Millisecond-precision timestamps.
//!
//! Conversations are stored with ISO-8601 UTC strings carrying exactly three
//! fractional digits (`2024-05-01T09:30:00.125Z`), so everything held in
//! memory is truncated to the millisecond to survive a save/load round trip
//! unchanged.

use chrono::{DateTime, SecondsFormat, Utc};

pub type Timestamp = DateTime<Utc>;

/// Current time truncated to whole milliseconds.
pub fn now_millis() -> Timestamp {
    truncate_to_millis(Utc::now())
}

pub fn truncate_to_millis(value: Timestamp) -> Timestamp {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}

/// A timestamp that is `now` unless that would not move past `previous`,
/// in which case it is one millisecond after `previous`.
pub fn strictly_after(previous: Timestamp) -> Timestamp {
    let now = now_millis();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::milliseconds(1)
    }
}

pub fn format_iso(value: &Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for required timestamps.
pub mod iso_millis {
    use super::{format_iso, truncate_to_millis, Timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| truncate_to_millis(parsed.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional timestamps; unparseable values load as `None`.
pub mod iso_millis_option {
    use super::{format_iso, truncate_to_millis, Timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Timestamp>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&format_iso(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .ok()
                .map(|parsed| truncate_to_millis(parsed.with_timezone(&Utc)))
        }))
    }
}
