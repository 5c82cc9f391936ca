//! Calendar-month periods used to scope aggregation.
//!
//! Filtering is a typed half-open date range `[first_day, next_first_day)`,
//! never a prefix match on date text.

use anyhow::{Result, anyhow, bail};
use chrono::{Datelike, Days, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, e.g. `2025-07`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period {
    start: NaiveDate,
}

impl Period {
    /// Build a period from a year and a 1-based month
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("invalid month {month}: must be between 1 and 12");
        }
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| anyhow!("year out of range: {year}"))?;
        Ok(Self { start })
    }

    /// The month containing `date`
    pub fn of(date: NaiveDate) -> Self {
        Self {
            start: date - Days::new(u64::from(date.day0())),
        }
    }

    /// The month containing today's local date
    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start
    }

    /// First day of the following month; `None` only at the end of the calendar
    pub fn next_first_day(&self) -> Option<NaiveDate> {
        self.start.checked_add_months(Months::new(1))
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next_first_day()
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.next_first_day().is_none_or(|end| date < end)
    }

    pub fn previous(&self) -> Option<Self> {
        self.start
            .checked_sub_months(Months::new(1))
            .map(|start| Self { start })
    }

    pub fn next(&self) -> Option<Self> {
        self.next_first_day().map(|start| Self { start })
    }

    /// Human label, e.g. "July 2025"
    pub fn label(&self) -> String {
        self.start.format("%B %Y").to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("invalid period '{s}': expected YYYY-MM"))?;
        if y.len() != 4 || m.is_empty() || m.len() > 2 {
            bail!("invalid period '{s}': expected YYYY-MM");
        }
        let year: i32 = y
            .parse()
            .map_err(|e| anyhow!("invalid year in period '{s}': {e}"))?;
        let month: u32 = m
            .parse()
            .map_err(|e| anyhow!("invalid month in period '{s}': {e}"))?;
        Self::new(year, month)
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let p: Period = "2025-07".parse().unwrap();
        assert_eq!(p.year(), 2025);
        assert_eq!(p.month(), 7);
        assert_eq!(p.to_string(), "2025-07");
        assert_eq!(p.label(), "July 2025");

        let p: Period = "2025-7".parse().unwrap();
        assert_eq!(p.to_string(), "2025-07");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("2025-13".parse::<Period>().is_err());
        assert!("2025-00".parse::<Period>().is_err());
        assert!("July".parse::<Period>().is_err());
        assert!("25-07".parse::<Period>().is_err());
        assert!("2025-07-01".parse::<Period>().is_err());
    }

    #[test]
    fn test_contains_is_half_open() {
        let p: Period = "2025-07".parse().unwrap();
        assert!(p.contains(d(2025, 7, 1)));
        assert!(p.contains(d(2025, 7, 31)));
        assert!(!p.contains(d(2025, 6, 30)));
        assert!(!p.contains(d(2025, 8, 1)));
    }

    #[test]
    fn test_december_rolls_over() {
        let p = Period::new(2024, 12).unwrap();
        assert_eq!(p.next_first_day(), Some(d(2025, 1, 1)));
        assert_eq!(p.last_day(), d(2024, 12, 31));
        assert!(p.contains(d(2024, 12, 31)));
        assert_eq!(p.next().unwrap().to_string(), "2025-01");
    }

    #[test]
    fn test_leap_february() {
        let p = Period::new(2024, 2).unwrap();
        assert_eq!(p.last_day(), d(2024, 2, 29));
        assert_eq!(p.previous().unwrap().to_string(), "2024-01");
    }

    #[test]
    fn test_of_date() {
        assert_eq!(Period::of(d(2025, 7, 19)).to_string(), "2025-07");
        assert_eq!(Period::of(d(2025, 7, 19)).first_day(), d(2025, 7, 1));
    }

    #[test]
    fn test_serde_as_string() {
        let p: Period = "2025-07".parse().unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"2025-07\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<Period>("\"2025-99\"").is_err());
    }
}
