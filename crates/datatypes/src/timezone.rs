//! Timezone offsets for the dynamic context.

use crate::DatatypeError;
use std::fmt;

/// A fixed timezone offset in minutes from UTC, within ±14:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timezone {
    offset_minutes: i32,
}

impl Timezone {
    pub const UTC: Timezone = Timezone { offset_minutes: 0 };

    pub fn from_minutes(offset_minutes: i32) -> Result<Self, DatatypeError> {
        if offset_minutes.abs() > 14 * 60 {
            return Err(DatatypeError::InvalidTimezone(format!(
                "{} minutes",
                offset_minutes
            )));
        }
        Ok(Self { offset_minutes })
    }

    /// Parses `Z` or `±HH:MM`.
    pub fn from_lexical(text: &str) -> Result<Self, DatatypeError> {
        let invalid = || DatatypeError::InvalidTimezone(text.to_string());
        if text == "Z" {
            return Ok(Self::UTC);
        }
        let (sign, rest) = match text.split_at_checked(1) {
            Some(("+", rest)) => (1, rest),
            Some(("-", rest)) => (-1, rest),
            _ => return Err(invalid()),
        };
        let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
        if hours.len() != 2 || minutes.len() != 2 {
            return Err(invalid());
        }
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }
        Self::from_minutes(sign * (hours * 60 + minutes)).map_err(|_| invalid())
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset_minutes == 0 {
            return write!(f, "Z");
        }
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let abs = self.offset_minutes.abs();
        write!(f, "{}{:02}:{:02}", sign, abs / 60, abs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_round_trip() {
        assert_eq!(Timezone::from_lexical("Z").unwrap(), Timezone::UTC);
        assert_eq!(Timezone::from_lexical("+05:30").unwrap().offset_minutes(), 330);
        assert_eq!(Timezone::from_lexical("-08:00").unwrap().to_string(), "-08:00");
        assert_eq!(Timezone::UTC.to_string(), "Z");
    }

    #[test]
    fn test_invalid_offsets() {
        for bad in ["", "05:30", "+5:30", "+05:61", "+15:00", "+0530"] {
            assert!(Timezone::from_lexical(bad).is_err(), "'{}'", bad);
        }
    }
}
