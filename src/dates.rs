use chrono::{NaiveDate, NaiveDateTime};
use enum_dispatch::enum_dispatch;

/// Timestamp layout used by the till report, e.g. `01-Jan-2024 10.00.00 AM`.
pub const TILL_REPORT_FORMAT: &str = "%d-%b-%Y %I.%M.%S %p";

// Every two-digit year pattern precedes its four-digit twin: `%Y` would happily
// read "24" as the year 24, while `%y` rejects "2024".
const DAY_FIRST_DATETIMES: &[&str] = &[
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d/%m/%Y %H:%M",
    "%d/%m/%y %I:%M:%S %p",
    "%d/%m/%Y %I:%M:%S %p",
    "%d/%m/%y %I:%M %p",
    "%d/%m/%Y %I:%M %p",
    "%d-%m-%y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%y %H:%M",
    "%d-%m-%Y %H:%M",
    "%d.%m.%y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d-%b-%y %I.%M.%S %p",
    "%d-%b-%Y %I.%M.%S %p",
    "%d-%b-%y %H:%M:%S",
    "%d-%b-%Y %H:%M:%S",
    "%d %b %y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DAY_FIRST_DATES: &[&str] = &[
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%d %b %y",
    "%d %b %Y",
    "%d %B %y",
    "%d %B %Y",
    "%Y-%m-%d",
];

#[enum_dispatch]
pub trait DateParser {
    /// Calendar date of `text`, time of day discarded. `None` when nothing matches.
    fn parse_date(&self, text: &str) -> Option<NaiveDate>;
}

#[enum_dispatch(DateParser)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFormat {
    Exact,
    DayFirst,
}

/// A single chrono pattern, matched strictly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exact {
    pattern: String,
}

impl Exact {
    pub fn new(pattern: impl Into<String>) -> Exact {
        Exact { pattern: pattern.into() }
    }

    pub fn till_report() -> Exact {
        Exact::new(TILL_REPORT_FORMAT)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl DateParser for Exact {
    fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        parse_with(text.trim(), &self.pattern)
    }
}

/// Locale heuristic where the day precedes the month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayFirst;

impl DateParser for DayFirst {
    fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();

        DAY_FIRST_DATETIMES
            .iter()
            .find_map(|pattern| NaiveDateTime::parse_from_str(text, pattern).ok())
            .map(|dt| dt.date())
            .or_else(|| DAY_FIRST_DATES.iter().find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok()))
    }
}

fn parse_with(text: &str, pattern: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(text, pattern)
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(text, pattern))
        .ok()
}
