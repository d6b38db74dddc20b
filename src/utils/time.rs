use anyhow::Result;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Canonical `YYYY-MM-DD` key of a local calendar day.
///
/// The string is always zero-padded, so the derived lexical ordering agrees
/// with chronological ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(String);

impl DateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn date(&self) -> NaiveDate {
        // The constructor only accepts strings that parse with the same format.
        NaiveDate::parse_from_str(&self.0, DATE_KEY_FORMAT).unwrap_or(NaiveDate::MIN)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        DateKey(date.format(DATE_KEY_FORMAT).to_string())
    }
}

impl FromStr for DateKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let date = NaiveDate::parse_from_str(trimmed, DATE_KEY_FORMAT)
            .map_err(|_| anyhow::anyhow!("Invalid date {trimmed:?}. Use YYYY-MM-DD"))?;
        let key = DateKey::from(date);
        if key.0 != trimmed {
            return Err(anyhow::anyhow!(
                "Invalid date {trimmed:?}. Use zero-padded YYYY-MM-DD"
            ));
        }
        Ok(key)
    }
}

impl TryFrom<String> for DateKey {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of the calendar day `datetime` falls on, in its own offset.
pub fn to_date_key<Z: TimeZone>(datetime: &DateTime<Z>) -> DateKey {
    DateKey::from(datetime.date_naive())
}

/// Local midnight of the day identified by `key`.
pub fn parse_date_key(key: &DateKey) -> NaiveDateTime {
    key.date().and_time(NaiveTime::MIN)
}

/// Monday on or before `date`, at midnight.
pub fn start_of_week(date: NaiveDate) -> NaiveDateTime {
    monday_of(date).and_time(NaiveTime::MIN)
}

/// Sunday following `start_of_week(date)`, at 23:59:59.999.
pub fn end_of_week(date: NaiveDate) -> NaiveDateTime {
    let sunday = monday_of(date)
        .checked_add_days(Days::new(6))
        .unwrap_or(date);
    let last_millisecond =
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    sunday.and_time(last_millisecond)
}

/// The seven days of the Monday-to-Sunday week containing `date`.
pub fn list_week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let monday = monday_of(date);
    std::array::from_fn(|index| {
        monday
            .checked_add_days(Days::new(index as u64))
            .unwrap_or(monday)
    })
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    let days_since_monday = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(days_since_monday))
        .unwrap_or(date)
}

pub fn local_now(timezone: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&timezone)
}

pub fn local_today(timezone: Tz) -> NaiveDate {
    local_now(timezone).date_naive()
}

pub fn parse_time_string(time_str: &str) -> Result<NaiveTime> {
    let time_str = time_str.trim();

    if let Ok(time) = NaiveTime::parse_from_str(time_str, "%H:%M") {
        return Ok(time);
    }

    Err(anyhow::anyhow!("Invalid time format. Use HH:MM (24-hour)"))
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn format_datetime<Z: TimeZone>(datetime: &DateTime<Z>) -> String
where
    Z::Offset: fmt::Display,
{
    datetime.format("%Y-%m-%d %H:%M %Z").to_string()
}
