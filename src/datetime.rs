use core::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::Error;

/// Years the clock chip and the rest of the device agree on.
const YEARS: core::ops::RangeInclusive<u16> = 1970..=2099;

/// Calendar timestamp as kept by a DS3231 style real-time clock. The clock runs on UTC.
///
/// This is the plain register view of the chip. Calendar arithmetic goes through `chrono`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Validating constructor, e.g. for values typed in by the operator.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, Error> {
        let datetime = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        datetime.validate()?;
        Ok(datetime)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.to_naive().map(|_| ())
    }

    /// Seconds since 1970-01-01T00:00:00Z. Fails for readings that are no calendar date or
    /// fall outside 1970..=2099.
    pub fn unix_timestamp(&self) -> Result<u64, Error> {
        let seconds = self.to_naive()?.and_utc().timestamp();
        u64::try_from(seconds).map_err(|_| Error::InvalidDateTime)
    }

    pub fn from_unix(timestamp: u64) -> Result<Self, Error> {
        let seconds = i64::try_from(timestamp).map_err(|_| Error::InvalidDateTime)?;
        let utc = chrono::DateTime::from_timestamp(seconds, 0).ok_or(Error::InvalidDateTime)?;
        let year = u16::try_from(utc.year()).map_err(|_| Error::InvalidDateTime)?;
        if !YEARS.contains(&year) {
            return Err(Error::InvalidDateTime);
        }
        Ok(Self {
            year,
            month: utc.month() as u8,
            day: utc.day() as u8,
            hour: utc.hour() as u8,
            minute: utc.minute() as u8,
            second: utc.second() as u8,
        })
    }

    /// `YYYY-MM-DD`
    pub fn date(&self) -> DateText<'_> {
        DateText(self)
    }

    /// `HH:MM:SS`
    pub fn time(&self) -> TimeText<'_> {
        TimeText(self)
    }

    fn to_naive(self) -> Result<NaiveDateTime, Error> {
        if !YEARS.contains(&self.year) {
            return Err(Error::InvalidDateTime);
        }
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .and_then(|date| {
                date.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
            })
            .ok_or(Error::InvalidDateTime)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date(), self.time())
    }
}

pub struct DateText<'a>(&'a DateTime);

impl fmt::Display for DateText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year, self.0.month, self.0.day)
    }
}

pub struct TimeText<'a>(&'a DateTime);

impl fmt::Display for TimeText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0.hour, self.0.minute, self.0.second
        )
    }
}
