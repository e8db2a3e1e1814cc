//! Calendar day keys.
//!
//! A [`DayKey`] names one calendar day as `YYYY-MM-DD`. Keys derived from any
//! two instants inside the same local day are equal, and the string form sorts
//! in calendar order.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

const FORMAT: &str = "%Y-%m-%d";

/// Canonical identifier of a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
  /// The calendar day containing `instant`, observed in the instant's own
  /// timezone.
  pub fn from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
    Self(instant.date_naive())
  }

  /// Today's key for an owner observing `offset`.
  pub fn today(offset: FixedOffset) -> Self {
    Self::from_instant(&Utc::now().with_timezone(&offset))
  }

  pub fn from_date(date: NaiveDate) -> Self { Self(date) }

  pub fn date(&self) -> NaiveDate { self.0 }

  /// 1-indexed day of the year, `1..=366`.
  pub fn day_of_year(&self) -> u32 { self.0.ordinal() }
}

impl fmt::Display for DayKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(FORMAT))
  }
}

impl FromStr for DayKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    // chrono accepts signs and unpadded fields; the canonical form does not.
    let canonical = s.len() == 10
      && s.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
      });
    if !canonical {
      return Err(Error::InvalidDayKey(s.to_owned()));
    }
    NaiveDate::parse_from_str(s, FORMAT)
      .map(Self)
      .map_err(|_| Error::InvalidDayKey(s.to_owned()))
  }
}

impl Serialize for DayKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for DayKey {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}
