use chrono::Weekday;
use std::error::Error as StdError;
use std::fmt;

/// A time value that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTimeError {
    /// The raw input as received
    pub input: String,
    /// Why it was rejected
    pub reason: &'static str,
}

impl MalformedTimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl fmt::Display for MalformedTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed time '{}': {}", self.input, self.reason)
    }
}

impl StdError for MalformedTimeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => write!(f, "AM"),
            Meridiem::Pm => write!(f, "PM"),
        }
    }
}

/// Wall-clock time of day with minute resolution
///
/// Stored as 24-hour fields so the derived ordering is plain time-of-day order.
/// Displays in 12-hour form, e.g. `3:30 PM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u32,
    minute: u32,
}

impl ClockTime {
    /// Build from 24-hour fields, rejecting out-of-range values
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Parse the site's 24-hour "HHMM" representation (e.g. "1530")
    pub fn from_hhmm(raw: &str) -> Result<Self, MalformedTimeError> {
        let s = raw.trim();
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MalformedTimeError::new(raw, "expected four digits HHMM"));
        }
        let hour: u32 = s[..2].parse().map_err(|_| MalformedTimeError::new(raw, "invalid hour"))?;
        let minute: u32 = s[2..]
            .parse()
            .map_err(|_| MalformedTimeError::new(raw, "invalid minute"))?;
        if hour >= 24 {
            return Err(MalformedTimeError::new(raw, "hour out of range"));
        }
        if minute >= 60 {
            return Err(MalformedTimeError::new(raw, "minute out of range"));
        }
        Ok(Self { hour, minute })
    }

    /// Parse a 12-hour "hh:mm AM" value (e.g. "04:30 PM", "9:00 am")
    pub fn parse_12hr(raw: &str) -> Result<Self, MalformedTimeError> {
        let s = raw.trim();
        let (clock, period) = s
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| MalformedTimeError::new(raw, "expected 'hh:mm AM' or 'hh:mm PM'"))?;
        let meridiem = match period.to_ascii_uppercase().as_str() {
            "AM" => Meridiem::Am,
            "PM" => Meridiem::Pm,
            _ => return Err(MalformedTimeError::new(raw, "meridiem must be AM or PM")),
        };
        let (hour, minute) = split_hh_mm(raw, clock.trim())?;
        if !(1..=12).contains(&hour) {
            return Err(MalformedTimeError::new(raw, "12-hour clock hour must be 1-12"));
        }
        if minute >= 60 {
            return Err(MalformedTimeError::new(raw, "minute out of range"));
        }
        let hour = match (meridiem, hour) {
            (Meridiem::Am, 12) => 0,
            (Meridiem::Am, h) => h,
            (Meridiem::Pm, 12) => 12,
            (Meridiem::Pm, h) => h + 12,
        };
        Ok(Self { hour, minute })
    }

    /// Parse a configured threshold: "hh:mm AM|PM" or 24-hour "HH:MM"
    pub fn parse_threshold(raw: &str) -> Result<Self, MalformedTimeError> {
        let upper = raw.trim().to_ascii_uppercase();
        if upper.ends_with("AM") || upper.ends_with("PM") {
            return Self::parse_12hr(raw);
        }
        let (hour, minute) = split_hh_mm(raw, raw.trim())?;
        Self::new(hour, minute).ok_or_else(|| MalformedTimeError::new(raw, "time out of range"))
    }

    /// 12-hour clock fields
    ///
    /// Hour 0 maps to 12 AM and hour 12 to 12 PM; 1-11 are AM as-is, 13-23 are PM minus 12.
    pub fn to_12hr(&self) -> (u32, u32, Meridiem) {
        let (hour, meridiem) = match self.hour {
            0 => (12, Meridiem::Am),
            1..=11 => (self.hour, Meridiem::Am),
            12 => (12, Meridiem::Pm),
            h => (h - 12, Meridiem::Pm),
        };
        (hour, self.minute, meridiem)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour, minute, meridiem) = self.to_12hr();
        write!(f, "{}:{:02} {}", hour, minute, meridiem)
    }
}

fn split_hh_mm(raw: &str, clock: &str) -> Result<(u32, u32), MalformedTimeError> {
    let (h, m) = clock
        .split_once(':')
        .ok_or_else(|| MalformedTimeError::new(raw, "expected hh:mm"))?;
    if h.is_empty() || h.len() > 2 || !h.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedTimeError::new(raw, "hour must be one or two digits"));
    }
    if m.len() != 2 || !m.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedTimeError::new(raw, "minutes must be two digits"));
    }
    let hour: u32 = h
        .parse()
        .map_err(|_| MalformedTimeError::new(raw, "invalid hour"))?;
    let minute: u32 = m
        .parse()
        .map_err(|_| MalformedTimeError::new(raw, "invalid minute"))?;
    Ok((hour, minute))
}

/// Convert a 24-hour "HHMM" string to 12-hour text, e.g. "1530" -> "3:30 PM"
pub fn convert_24hr_to_12hr(raw: &str) -> Result<String, MalformedTimeError> {
    ClockTime::from_hhmm(raw).map(|t| t.to_string())
}

/// Parse a day label such as "Mon" or "Saturday"
pub fn parse_weekday(raw: &str) -> Result<Weekday, MalformedTimeError> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| MalformedTimeError::new(raw, "unknown day of week"))
}

pub fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Earliest acceptable start times per day type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdConfig {
    pub weekday: ClockTime,
    pub weekend: ClockTime,
}

impl ThresholdConfig {
    pub fn for_day(&self, day: Weekday) -> ClockTime {
        if is_weekend(day) {
            self.weekend
        } else {
            self.weekday
        }
    }
}

/// Is `time` at or after `threshold`, comparing time of day only
pub fn is_time_greater_or_equal(time: ClockTime, threshold: ClockTime) -> bool {
    time >= threshold
}

/// Does a slot starting at `start` on `day` pass the configured thresholds
pub fn accepts(day: Weekday, start: ClockTime, thresholds: &ThresholdConfig) -> bool {
    is_time_greater_or_equal(start, thresholds.for_day(day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hhmm: &str) -> ClockTime {
        ClockTime::from_hhmm(hhmm).unwrap()
    }

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig {
            weekday: ClockTime::parse_12hr("04:30 PM").unwrap(),
            weekend: ClockTime::parse_12hr("09:00 AM").unwrap(),
        }
    }

    #[test]
    fn test_convert_boundary_hours() {
        assert_eq!(convert_24hr_to_12hr("0000").unwrap(), "12:00 AM");
        assert_eq!(convert_24hr_to_12hr("1200").unwrap(), "12:00 PM");
        assert_eq!(convert_24hr_to_12hr("1530").unwrap(), "3:30 PM");
        assert_eq!(convert_24hr_to_12hr("0930").unwrap(), "9:30 AM");
        assert_eq!(convert_24hr_to_12hr("0059").unwrap(), "12:59 AM");
        assert_eq!(convert_24hr_to_12hr("1259").unwrap(), "12:59 PM");
        assert_eq!(convert_24hr_to_12hr("1100").unwrap(), "11:00 AM");
        assert_eq!(convert_24hr_to_12hr("1300").unwrap(), "1:00 PM");
        assert_eq!(convert_24hr_to_12hr("2345").unwrap(), "11:45 PM");
    }

    #[test]
    fn test_hhmm_rejects_malformed() {
        for raw in ["", "930", "12345", "2400", "1260", "ab30", "12:30", "-130"] {
            let err = ClockTime::from_hhmm(raw).unwrap_err();
            assert_eq!(err.input, raw);
        }
    }

    #[test]
    fn test_parse_12hr() {
        assert_eq!(ClockTime::parse_12hr("12:00 AM").unwrap(), t("0000"));
        assert_eq!(ClockTime::parse_12hr("12:00 PM").unwrap(), t("1200"));
        assert_eq!(ClockTime::parse_12hr("04:30 PM").unwrap(), t("1630"));
        assert_eq!(ClockTime::parse_12hr("9:00 am").unwrap(), t("0900"));
        assert!(ClockTime::parse_12hr("13:00 PM").is_err());
        assert!(ClockTime::parse_12hr("0:30 AM").is_err());
        assert!(ClockTime::parse_12hr("4:30").is_err());
        assert!(ClockTime::parse_12hr("4:30 XM").is_err());
        assert!(ClockTime::parse_12hr("4:3 PM").is_err());
        // Sign characters and extra hour digits are not times
        assert!(ClockTime::parse_12hr("04:+5 PM").is_err());
        assert!(ClockTime::parse_12hr("+4:30 PM").is_err());
        assert!(ClockTime::parse_12hr("004:30 PM").is_err());
        assert!(ClockTime::parse_12hr(":30 PM").is_err());
    }

    #[test]
    fn test_parse_threshold_accepts_24hr() {
        assert_eq!(ClockTime::parse_threshold("16:30").unwrap(), t("1630"));
        assert_eq!(ClockTime::parse_threshold("04:30 PM").unwrap(), t("1630"));
        assert!(ClockTime::parse_threshold("24:00").is_err());
        assert!(ClockTime::parse_threshold("noon").is_err());
        assert!(ClockTime::parse_threshold("9:30").is_ok());
        assert!(ClockTime::parse_threshold("+16:30").is_err());
        assert!(ClockTime::parse_threshold("004:30").is_err());
        assert!(ClockTime::parse_threshold("16:+5").is_err());
        assert!(ClockTime::parse_threshold("04:+5 PM").is_err());
        assert!(ClockTime::parse_threshold("004:30 PM").is_err());
    }

    #[test]
    fn test_display_round_trips_through_12hr_parser() {
        let time = t("0005");
        assert_eq!(time.to_string(), "12:05 AM");
        assert_eq!(ClockTime::parse_12hr(&time.to_string()).unwrap(), time);
    }

    #[test]
    fn test_compare_greater_equal_and_less() {
        assert!(is_time_greater_or_equal(t("1530"), t("1500")));
        assert!(is_time_greater_or_equal(t("1500"), t("1500")));
        assert!(!is_time_greater_or_equal(t("1459"), t("1500")));
        // Noon sorts after every morning time, midnight before all
        assert!(is_time_greater_or_equal(t("1200"), t("1159")));
        assert!(!is_time_greater_or_equal(t("0000"), t("0001")));
    }

    #[test]
    fn test_accepts_uses_day_type() {
        let th = thresholds();
        assert!(accepts(Weekday::Mon, t("1630"), &th));
        assert!(!accepts(Weekday::Fri, t("1600"), &th));
        assert!(!accepts(Weekday::Sat, t("0800"), &th));
        assert!(accepts(Weekday::Sun, t("1000"), &th));
        assert!(accepts(Weekday::Sat, t("0900"), &th));
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Mon").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday(" Saturday ").unwrap(), Weekday::Sat);
        assert!(parse_weekday("Funday").is_err());
    }
}
