//! Durations are written the human way in config files: `30s`, `24h`, `0s`.

use serde::{
    de::Error as _,
    Deserialize,
    Deserializer,
    Serializer,
};
use std::time::Duration;

pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*duration))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let value = String::deserialize(deserializer)?;
    humantime::parse_duration(value.trim()).map_err(|e| D::Error::custom(format!("invalid duration {value:?}: {e}")))
}
