use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

const FALLBACK_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 1) {
    Some(date) => date,
    None => panic!("invalid fallback date"),
};

/// The instant used when no usable watermark is stored: 2025-01-01T00:00:00Z.
pub fn fallback_last_run() -> DateTime<Utc> {
    FALLBACK_DATE.and_time(NaiveTime::MIN).and_utc()
}

/// Last successful processing run of a data source.
///
/// `processed_count` and `status` are `None` on the fallback watermark, or
/// when the stored values were missing or mistyped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    pub last_run: DateTime<Utc>,
    pub processed_count: Option<u64>,
    pub status: Option<String>,
}

impl Watermark {
    pub fn fallback() -> Self {
        Self {
            last_run: fallback_last_run(),
            processed_count: None,
            status: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

/// Stored shape, as read. Every field may be absent.
///
/// Only `last_run` decides whether the document is usable. A `processed_count`
/// that is not a non-negative integer, or a `status` that is not a string,
/// reads as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredWatermark {
    pub last_run: Option<String>,
    #[serde(default, deserialize_with = "count_or_none")]
    pub processed_count: Option<u64>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub status: Option<String>,
}

fn count_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_u64())
}

fn text_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_str().map(str::to_string))
}

/// Stored shape, as written.
#[derive(Debug, Clone, Serialize)]
pub struct WatermarkDocument<'a> {
    pub last_run: String,
    pub processed_count: u64,
    pub status: &'a str,
}
