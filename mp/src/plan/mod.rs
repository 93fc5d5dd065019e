//! Health plan calendar
//!
//! Turns the free-text multi-day plan returned by the backend into a
//! calendar keyed by date.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

mod parser;

pub use parser::parse_plan;

/// Date format used when showing a plan day ("Mon Jan 06 2025")
pub const DAY_FORMAT: &str = "%a %b %d %Y";

/// Plan text per calendar day, contiguous from the start date
///
/// Built once per plan generation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanCalendar {
    start: NaiveDate,
    days: BTreeMap<NaiveDate, String>,
}

impl PlanCalendar {
    pub(crate) fn from_days(start: NaiveDate, days: impl IntoIterator<Item = (NaiveDate, String)>) -> Self {
        Self {
            start,
            days: days.into_iter().collect(),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Last day with a plan entry
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&str> {
        self.days.get(date).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &str)> {
        self.days.iter().map(|(date, text)| (date, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl fmt::Display for PlanCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (date, text)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{} Plan:", date.format(DAY_FORMAT))?;
            writeln!(f, "{}", text)?;
        }
        Ok(())
    }
}
