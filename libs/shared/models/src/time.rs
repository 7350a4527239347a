use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid time '{0}', expected HH:MM")]
pub struct InvalidClockTime(pub String);

/// Time of day with minute precision, exchanged as `"HH:MM"`.
///
/// Parsing also accepts `"HH:MM:SS"` (with optional fraction) because that is
/// how PostgreSQL renders `time` columns; seconds are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::new(minutes / 60, minutes % 60)
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        Self(time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time))
    }
}

impl FromStr for ClockTime {
    type Err = InvalidClockTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S%.f"))
            .map(ClockTime::from)
            .map_err(|_| InvalidClockTime(s.to_string()))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_hour_minute() {
        let time: ClockTime = "09:20".parse().unwrap();
        assert_eq!(time.to_string(), "09:20");
        assert_eq!(time.minutes_since_midnight(), 560);
    }

    #[test]
    fn accepts_postgres_time_columns() {
        let time: ClockTime = "14:40:00".parse().unwrap();
        assert_eq!(time, ClockTime::new(14, 40).unwrap());

        let with_fraction: ClockTime = "14:40:59.5".parse().unwrap();
        assert_eq!(with_fraction.to_string(), "14:40");
    }

    #[test]
    fn rejects_garbage() {
        assert!("25:00".parse::<ClockTime>().is_err());
        assert!("noon".parse::<ClockTime>().is_err());
        assert!("".parse::<ClockTime>().is_err());
    }

    #[test]
    fn from_minutes_stays_within_the_day() {
        assert_eq!(ClockTime::from_minutes(600), ClockTime::new(10, 0));
        assert_eq!(ClockTime::from_minutes(24 * 60), None);
    }

    #[test]
    fn serde_uses_hh_mm_strings() {
        let time = ClockTime::new(8, 5).unwrap();
        assert_eq!(serde_json::to_string(&time).unwrap(), "\"08:05\"");

        let back: ClockTime = serde_json::from_str("\"08:05:00\"").unwrap();
        assert_eq!(back, time);
    }
}
