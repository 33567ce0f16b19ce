use chrono::Weekday;

use crate::time_rule::{parse_weekday, ClockTime, MalformedTimeError};

/// Slot exactly as read off the scheduling page, before any parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSlot {
    pub identifier: String,
    /// Day-of-week label, e.g. "Mon"
    pub day: String,
    /// 24-hour "HHMM"
    pub start_time: String,
    /// 24-hour "HHMM"
    pub end_time: String,
    pub instructor: String,
}

impl RawSlot {
    /// Build from the site's attributes, taking the day from the identifier
    ///
    /// Identifiers look like "Mon, Jan 6, 2025 4:00 PM - 5:00 PM"; the day is the
    /// text before the first comma.
    pub fn from_site(
        identifier: &str,
        start_time: &str,
        end_time: &str,
        instructor: &str,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            day: day_from_identifier(identifier).to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            instructor: instructor.to_string(),
        }
    }

    /// Normalize into a typed record
    pub fn parse(&self) -> Result<SlotRecord, MalformedTimeError> {
        Ok(SlotRecord {
            identifier: self.identifier.clone(),
            day: parse_weekday(&self.day)?,
            start_time: ClockTime::from_hhmm(&self.start_time)?,
            end_time: ClockTime::from_hhmm(&self.end_time)?,
            instructor: self.instructor.clone(),
        })
    }
}

pub fn day_from_identifier(identifier: &str) -> &str {
    identifier.split(',').next().unwrap_or("").trim()
}

/// A parsed appointment opening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub identifier: String,
    pub day: Weekday,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub instructor: String,
}

/// A row of the seen-set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenSlot {
    pub identifier: String,
    /// 12-hour text, e.g. "4:30 PM"
    pub start_time: String,
    pub end_time: String,
    pub instructor: String,
    pub notified: bool,
    pub first_seen_at_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_from_identifier() {
        assert_eq!(day_from_identifier("Sat, Feb 1, 2025 9:00 AM"), "Sat");
        assert_eq!(day_from_identifier("Mon"), "Mon");
        assert_eq!(day_from_identifier(""), "");
    }

    #[test]
    fn test_parse_reports_bad_field() {
        let raw = RawSlot::from_site("Tue, Mar 4, 2025", "1730", "18x0", "Pat");
        let err = raw.parse().unwrap_err();
        assert_eq!(err.input, "18x0");

        let raw = RawSlot::from_site("Someday, Mar 4", "1730", "1830", "Pat");
        assert!(raw.parse().is_err());
    }

    #[test]
    fn test_parse_ok() {
        let raw = RawSlot::from_site("Tue, Mar 4, 2025", "1730", "1830", "Pat");
        let rec = raw.parse().unwrap();
        assert_eq!(rec.day, Weekday::Tue);
        assert_eq!(rec.start_time.to_string(), "5:30 PM");
        assert_eq!(rec.end_time.to_string(), "6:30 PM");
        assert_eq!(rec.instructor, "Pat");
    }
}
