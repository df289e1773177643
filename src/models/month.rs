use std::sync::OnceLock;

use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// A calendar month, formatted as `YYYY-MM`.
///
/// Field order matters: the derived `Ord` compares year first, then month,
/// which is chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct MonthKey {
    year: i32,
    month: u32,
}

fn is_month_key(s: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

impl MonthKey {
    pub(crate) fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub(crate) fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if !is_month_key(s) {
            bail!("Invalid month '{s}' (expected YYYY-MM)");
        }
        let year: i32 = s[..4].parse()?;
        let month: u32 = s[5..].parse()?;
        Self::new(year, month).ok_or_else(|| anyhow::anyhow!("Invalid month '{s}'"))
    }

    /// The current month in local time.
    pub(crate) fn current() -> Self {
        Self::of_date(chrono::Local::now().date_naive())
    }

    pub(crate) fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub(crate) fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub(crate) fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub(crate) fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Number of days in this month.
    pub(crate) fn days(&self) -> u32 {
        match (self.first_day(), self.next().first_day()) {
            (Some(start), Some(end)) => (end - start).num_days() as u32,
            _ => 0,
        }
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        Self::of_date(date) == *self
    }

    /// Every month from `start` to `end` inclusive, oldest first.
    /// Empty when `start` is after `end`.
    pub(crate) fn range_inclusive(start: Self, end: Self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut cur = start;
        while cur <= end {
            out.push(cur);
            cur = cur.next();
        }
        out
    }

    /// The `count` months ending at `end`, oldest first.
    pub(crate) fn last_n(end: Self, count: usize) -> Vec<Self> {
        let mut out = Vec::new();
        let mut cur = end;
        for _ in 0..count {
            out.push(cur);
            cur = cur.prev();
        }
        out.reverse();
        out
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
