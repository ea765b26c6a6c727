//! Fuzzy dates.
//!
//! A date may be fully known, known to the month or year only, or known only to within a range
//! of years (a decade, typically). It arrives either as a structured object:
//!
//! ```text
//! {"year": 1990, "month": 5, "day": 21, "range": {"years": 10}}
//! ```
//!
//! as loose ISO text (`1990`, `1990-05`, `1990-05-21`, `1990s`, `1990s-03`), or as a calendar
//! date. Older clients send `{"decade": "1990s"}`, which is read as year 1990 with a range of
//! ten years.

use crate::json;
use chrono::{Datelike, NaiveDate};
use serde_json::{json, Map, Value};
use std::fmt;

const DECADE_YEARS: u32 = 10;

/// A date known to some precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PhenoTipsDate {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    range_years: Option<u32>,
}

impl PhenoTipsDate {
    /// A date with no known component.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a date from components, discarding out-of-range month and day values.
    pub fn new(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Self {
        Self {
            year,
            month: month.filter(|m| (1..=12).contains(m)),
            day: day.filter(|d| (1..=31).contains(d)),
            range_years: None,
        }
    }

    /// Attaches a range of years; zero means no range.
    pub fn with_range(mut self, years: u32) -> Self {
        self.range_years = (years > 0).then_some(years);
        self
    }

    /// A fully known date, or an empty one.
    pub fn from_date(date: Option<NaiveDate>) -> Self {
        match date {
            Some(date) => Self::new(Some(date.year()), Some(date.month()), Some(date.day())),
            None => Self::empty(),
        }
    }

    /// Reads a structured date object, or loose text when given a string.
    ///
    /// Anything else reads as an empty date.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(obj) => Self::from_object(obj),
            Value::String(s) => Self::parse(s),
            _ => Self::empty(),
        }
    }

    /// Reads the stored (JSON text) form of a date. Text that is not JSON is parsed loosely.
    pub fn from_json_string(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_json(&value),
            Err(_) => Self::parse(text),
        }
    }

    /// Parses loose ISO text: `1990`, `1990-05`, `1990-05-21`, `1990s`, `1990s-03-01`.
    ///
    /// Components that are not numbers or are out of range read as absent.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.trim().splitn(3, '-');
        let (year, decade) = parts.next().map(parse_year).unwrap_or((None, false));
        let month = parts.next().and_then(parse_component);
        let day = parts.next().and_then(parse_component);

        let date = Self::new(year, month, day);
        if decade && year.is_some() {
            date.with_range(DECADE_YEARS)
        } else {
            date
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let (mut year, mut decade) = match obj.get("year") {
            Some(Value::String(s)) => parse_year(s),
            Some(other) => (json::integer(other).and_then(to_i32), false),
            None => (None, false),
        };

        if year.is_none() {
            if let Some(legacy) = obj.get("decade").and_then(Value::as_str) {
                (year, decade) = parse_year(legacy);
                decade = decade && year.is_some();
            }
        }

        let month = obj
            .get("month")
            .and_then(json::integer)
            .and_then(|m| u32::try_from(m).ok());
        let day = obj
            .get("day")
            .and_then(json::integer)
            .and_then(|d| u32::try_from(d).ok());
        let range = obj
            .get("range")
            .and_then(Value::as_object)
            .and_then(|r| r.get("years"))
            .and_then(json::integer)
            .and_then(|y| u32::try_from(y).ok())
            .filter(|y| *y > 0);

        let date = Self::new(year, month, day);
        match range {
            Some(years) => date.with_range(years),
            None if decade => date.with_range(DECADE_YEARS),
            None => date,
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn day(&self) -> Option<u32> {
        self.day
    }

    pub fn range_years(&self) -> Option<u32> {
        self.range_years
    }

    /// True if the year is only known to the decade.
    pub fn is_decade(&self) -> bool {
        self.range_years == Some(DECADE_YEARS)
    }

    /// True if any component is known.
    pub fn is_set(&self) -> bool {
        self.year.is_some() || self.month.is_some() || self.day.is_some()
    }

    /// The earliest calendar date consistent with what is known.
    ///
    /// Returns `None` without a year. A missing month reads as the first of January, whatever
    /// the day says. A missing day reads as the first, and a day that does not exist in its
    /// month (February 30) falls back to the first.
    pub fn to_earliest_possible_iso_date(&self) -> Option<NaiveDate> {
        let year = self.year?;
        let month = self.month.unwrap_or(1);
        let day = self.month.and(self.day).unwrap_or(1);
        NaiveDate::from_ymd_opt(year, month, day)
            .or_else(|| NaiveDate::from_ymd_opt(year, month, 1))
    }

    /// The structured form, carrying only the known components.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(year) = self.year {
            obj.insert("year".into(), json!(year));
        }
        if let Some(month) = self.month {
            obj.insert("month".into(), json!(month));
        }
        if let Some(day) = self.day {
            obj.insert("day".into(), json!(day));
        }
        if let Some(years) = self.range_years {
            obj.insert("range".into(), json!({ "years": years }));
        }
        Value::Object(obj)
    }
}

impl From<NaiveDate> for PhenoTipsDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(Some(date))
    }
}

impl fmt::Display for PhenoTipsDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(year) = self.year else {
            return Ok(());
        };
        write!(f, "{year:04}")?;
        if self.is_decade() {
            f.write_str("s")?;
        }
        if let Some(month) = self.month {
            write!(f, "-{month:02}")?;
            if let Some(day) = self.day {
                write!(f, "-{day:02}")?;
            }
        }
        Ok(())
    }
}

/// Year text with an optional trailing `s` marking decade precision.
fn parse_year(text: &str) -> (Option<i32>, bool) {
    let text = text.trim();
    let (digits, decade) = match text.strip_suffix('s') {
        Some(digits) => (digits, true),
        None => (text, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return (None, false);
    }
    (digits.parse().ok(), decade)
}

fn parse_component(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn to_i32(value: i64) -> Option<i32> {
    i32::try_from(value).ok()
}
