//! Conversion from the compact `YYYY-MM-DD.HH:MM.±ZZ` literal to XMLTV
//! timestamps (`YYYYMMDDHHMMSS ±HHMM`).

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::TimeFormatError;

/// Largest accepted UTC offset, in whole hours.
const MAX_OFFSET_HOURS: i16 = 23;

/// Regex for the compact input literal.
#[allow(clippy::expect_used)]
static LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{1,2}-\d{1,2})\.(\d{1,2}:\d{1,2})\.([+-]?\d+)$")
        .expect("failed to compile time literal regex")
});

/// Regex for the canonical XMLTV timestamp.
#[allow(clippy::expect_used)]
static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{14}) ([+-])(\d{2})(\d{2})$")
        .expect("failed to compile canonical timestamp regex")
});

/// A programme boundary: local wall-clock time plus its UTC offset.
///
/// Values order exactly as their canonical strings compare: wall-clock time
/// first, then the offset as rendered text (`+` before `-`, then the
/// `HHMM` digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpgTime {
    local: NaiveDateTime,
    offset_minutes: i16,
}

impl EpgTime {
    /// Builds a timestamp from its parts.
    #[must_use]
    pub const fn new(local: NaiveDateTime, offset_minutes: i16) -> Self {
        Self {
            local,
            offset_minutes,
        }
    }

    /// Wall-clock date and time, without the offset.
    #[must_use]
    pub const fn local(&self) -> NaiveDateTime {
        self.local
    }

    /// UTC offset in minutes.
    #[must_use]
    pub const fn offset_minutes(&self) -> i16 {
        self.offset_minutes
    }

    /// Offset key that sorts like the rendered `±HHMM` suffix.
    const fn offset_key(&self) -> (bool, u16) {
        (self.offset_minutes < 0, self.offset_minutes.unsigned_abs())
    }

    /// Parses a canonical `YYYYMMDDHHMMSS ±HHMM` timestamp.
    ///
    /// # Errors
    ///
    /// Returns `TimeFormatError` if the value is not in canonical form or
    /// names an impossible date.
    pub fn parse_canonical(value: &str) -> Result<Self, TimeFormatError> {
        let caps = CANONICAL_RE
            .captures(value)
            .ok_or_else(|| TimeFormatError::new(value, "expected 'YYYYMMDDHHMMSS +HHMM'"))?;
        let (Some(date_time), Some(sign), Some(hours), Some(minutes)) =
            (caps.get(1), caps.get(2), caps.get(3), caps.get(4))
        else {
            return Err(TimeFormatError::new(value, "missing timestamp component"));
        };

        let local = NaiveDateTime::parse_from_str(date_time.as_str(), "%Y%m%d%H%M%S")
            .map_err(|e| TimeFormatError::new(value, e.to_string()))?;

        let hours: i16 = hours
            .as_str()
            .parse()
            .map_err(|_| TimeFormatError::new(value, "invalid offset hours"))?;
        let minutes: i16 = minutes
            .as_str()
            .parse()
            .map_err(|_| TimeFormatError::new(value, "invalid offset minutes"))?;
        if hours > MAX_OFFSET_HOURS || minutes >= 60 {
            return Err(TimeFormatError::new(value, "offset out of range"));
        }

        let magnitude = hours.saturating_mul(60).saturating_add(minutes);
        let offset_minutes = if sign.as_str() == "-" {
            magnitude.saturating_neg()
        } else {
            magnitude
        };

        Ok(Self::new(local, offset_minutes))
    }
}

impl Ord for EpgTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.local
            .cmp(&other.local)
            .then_with(|| self.offset_key().cmp(&other.offset_key()))
    }
}

impl PartialOrd for EpgTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EpgTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let magnitude = self.offset_minutes.unsigned_abs();
        write!(
            f,
            "{} {sign}{:02}{:02}",
            self.local.format("%Y%m%d%H%M%S"),
            magnitude / 60,
            magnitude % 60
        )
    }
}

/// Converts a `YYYY-MM-DD.HH:MM.±ZZ` literal into an [`EpgTime`].
///
/// Seconds are always zero. The offset is a signed whole number of hours;
/// the sign may be omitted for positive offsets.
///
/// # Examples
///
/// ```
/// use epgmgr_core::convert;
///
/// let time = convert("2024-08-17.12:00.+3").unwrap();
/// assert_eq!(time.to_string(), "20240817120000 +0300");
/// ```
///
/// # Errors
///
/// Returns `TimeFormatError` if the literal is not three dot-separated
/// parts, the date or time does not parse, or the offset is outside
/// ±23 hours.
pub fn convert(literal: &str) -> Result<EpgTime, TimeFormatError> {
    let caps = LITERAL_RE.captures(literal).ok_or_else(|| {
        TimeFormatError::new(literal, "expected 'YYYY-MM-DD.HH:MM.+00'")
    })?;
    let (Some(date), Some(time), Some(offset)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return Err(TimeFormatError::new(literal, "missing time component"));
    };

    let local = NaiveDateTime::parse_from_str(
        &format!("{} {}", date.as_str(), time.as_str()),
        "%Y-%m-%d %H:%M",
    )
    .map_err(|e| TimeFormatError::new(literal, e.to_string()))?;

    let hours: i16 = offset
        .as_str()
        .parse()
        .map_err(|_| TimeFormatError::new(literal, "invalid offset"))?;
    if !(-MAX_OFFSET_HOURS..=MAX_OFFSET_HOURS).contains(&hours) {
        return Err(TimeFormatError::new(literal, "offset out of range"));
    }

    Ok(EpgTime::new(local, hours.saturating_mul(60)))
}

/// Converts a `YYYY-MM-DD.HH:MM.±ZZ` literal straight to its canonical
/// `YYYYMMDDHHMMSS ±HHMM` string.
///
/// # Errors
///
/// Same as [`convert`].
pub fn convert_to_epg_time(literal: &str) -> Result<String, TimeFormatError> {
    convert(literal).map(|time| time.to_string())
}
