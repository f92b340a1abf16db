//! Custom serde helpers for the exchange's wire formats.

use chrono::{DateTime, Utc};

/// Converts fractional Unix seconds into a UTC timestamp with microsecond precision.
///
/// Returns `None` for non-finite or out-of-range input.
pub fn from_unix_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let mut micros = ((secs - whole) * 1_000_000.0).round() as i64;
    let mut whole = whole as i64;
    if micros >= 1_000_000 {
        whole += 1;
        micros -= 1_000_000;
    }
    DateTime::<Utc>::from_timestamp(whole, (micros * 1_000) as u32)
}

/// Deserializes fractional Unix seconds (`1688667796.8802`) into `DateTime<Utc>`.
///
/// Both ledger and trade history entries carry their `time` this way.
pub mod unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        super::from_unix_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", secs)))
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let secs = ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_micros()) / 1_000_000.0;
        serializer.serialize_f64(secs)
    }
}
