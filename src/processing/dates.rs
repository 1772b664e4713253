//! Date-range and duration detection
//!
//! Each range matcher looks for one textual shape and either returns a raw
//! match or nothing. [`scan_line`] tries them in priority order and turns the
//! first hit into a [`Period`], so a strange line can never abort extraction.

use crate::model::cv::{month_index, Period, PeriodEnd};
use crate::model::WarningKind;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const MONTHS: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";
const OPEN_ENDS: &str = "present|current|now|today|ongoing|date";
const SEPARATOR: &str = r"\s*(?:-|to|until|till)\s*";

static MONTH_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)\b(?P<sm>{m})[a-z]*\.?,?\s+(?P<sy>\d{{4}}){sep}(?:(?P<em>{m})[a-z]*\.?,?\s+(?P<ey>\d{{4}})|(?P<eyo>\d{{4}})|(?P<open>{o}))\b",
        m = MONTHS,
        o = OPEN_ENDS,
        sep = SEPARATOR
    );
    Regex::new(&pattern).expect("Invalid month range regex")
});

static NUMERIC_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)\b(?P<sm>0?[1-9]|1[0-2])[/.](?P<sy>\d{{4}}){sep}(?:(?P<em>0?[1-9]|1[0-2])[/.](?P<ey>\d{{4}})|(?P<open>{o}))\b",
        o = OPEN_ENDS,
        sep = SEPARATOR
    );
    Regex::new(&pattern).expect("Invalid numeric range regex")
});

static YEAR_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)\b(?P<sy>\d{{4}}){sep}(?:(?P<ey>\d{{4}})|(?P<open>{o}))\b",
        o = OPEN_ENDS,
        sep = SEPARATOR
    );
    Regex::new(&pattern).expect("Invalid year range regex")
});

static LONE_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19[5-9]\d|20\d{2})\b").expect("Invalid year regex"));

static YEARS_FIGURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\b").expect("Invalid years figure regex")
});

const MIN_YEAR: i32 = 1950;
const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Endpoint {
    year: i32,
    month: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawEnd {
    At(Endpoint),
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawRange {
    start: Endpoint,
    end: RawEnd,
    span: (usize, usize),
}

/// Outcome of scanning one line for a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateScan {
    Range { period: Period, span: (usize, usize) },
    /// Looks dated but can't be turned into a valid period
    Ambiguous { kind: WarningKind, span: (usize, usize) },
    NoDate,
}

type RangeMatcher = fn(&str) -> Option<RawRange>;

const RANGE_MATCHERS: &[RangeMatcher] = &[month_range, numeric_range, year_range];

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .split('|')
        .position(|m| lower.starts_with(m))
        .map(|idx| idx as u32 + 1)
}

fn year_of(caps: &Captures<'_>, group: &str) -> Option<i32> {
    let year: i32 = caps.name(group)?.as_str().parse().ok()?;
    (MIN_YEAR..=MAX_YEAR).contains(&year).then_some(year)
}

fn span_of(caps: &Captures<'_>) -> (usize, usize) {
    caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0))
}

fn month_range(line: &str) -> Option<RawRange> {
    let caps = MONTH_RANGE_RE.captures(line)?;
    let start = Endpoint {
        year: year_of(&caps, "sy")?,
        month: Some(month_number(caps.name("sm")?.as_str())?),
    };
    let end = if caps.name("open").is_some() {
        RawEnd::Open
    } else if caps.name("eyo").is_some() {
        RawEnd::At(Endpoint { year: year_of(&caps, "eyo")?, month: None })
    } else {
        RawEnd::At(Endpoint {
            year: year_of(&caps, "ey")?,
            month: Some(month_number(caps.name("em")?.as_str())?),
        })
    };
    Some(RawRange { start, end, span: span_of(&caps) })
}

fn numeric_range(line: &str) -> Option<RawRange> {
    let caps = NUMERIC_RANGE_RE.captures(line)?;
    let start = Endpoint {
        year: year_of(&caps, "sy")?,
        month: caps.name("sm")?.as_str().parse().ok(),
    };
    let end = if caps.name("open").is_some() {
        RawEnd::Open
    } else {
        RawEnd::At(Endpoint {
            year: year_of(&caps, "ey")?,
            month: caps.name("em")?.as_str().parse().ok(),
        })
    };
    Some(RawRange { start, end, span: span_of(&caps) })
}

fn year_range(line: &str) -> Option<RawRange> {
    let caps = YEAR_RANGE_RE.captures(line)?;
    let start = Endpoint { year: year_of(&caps, "sy")?, month: None };
    let end = if caps.name("open").is_some() {
        RawEnd::Open
    } else {
        RawEnd::At(Endpoint { year: year_of(&caps, "ey")?, month: None })
    };
    Some(RawRange { start, end, span: span_of(&caps) })
}

/// Month arithmetic: precise months are inclusive, a year-only start is
/// January, a year-only end is exclusive at January unless the range stays
/// inside one year.
fn to_period(raw: &RawRange) -> Option<Period> {
    let start = month_index(raw.start.year, raw.start.month.unwrap_or(1));
    let end = match raw.end {
        RawEnd::Open => PeriodEnd::Open,
        RawEnd::At(Endpoint { year, month: Some(month) }) => PeriodEnd::Closed(month_index(year, month) + 1),
        RawEnd::At(Endpoint { year, month: None }) if year == raw.start.year => {
            PeriodEnd::Closed(month_index(year + 1, 1))
        }
        RawEnd::At(Endpoint { year, month: None }) => PeriodEnd::Closed(month_index(year, 1)),
    };
    Period::new(start, end)
}

/// Find the employment period on a line, if any.
pub fn scan_line(line: &str) -> DateScan {
    if let Some(raw) = RANGE_MATCHERS.iter().find_map(|matcher| matcher(line)) {
        return match to_period(&raw) {
            Some(period) => DateScan::Range { period, span: raw.span },
            None => DateScan::Ambiguous {
                kind: WarningKind::InvertedDateRange,
                span: raw.span,
            },
        };
    }

    match LONE_YEAR_RE.find(line) {
        Some(m) => DateScan::Ambiguous {
            kind: WarningKind::UnparseableDateRange,
            span: (m.start(), m.end()),
        },
        None => DateScan::NoDate,
    }
}

/// Every "N years" / "N+ yrs" figure on a line, with its byte position.
pub fn years_figures(text: &str) -> Vec<(usize, f32)> {
    YEARS_FIGURE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let value: f32 = caps.get(1)?.as_str().parse().ok()?;
            (value > 0.0 && value <= 50.0).then_some((whole.start(), value))
        })
        .collect()
}

/// The figure closest before `position`, else the closest after it.
pub fn nearest_years(figures: &[(usize, f32)], position: usize) -> Option<f32> {
    figures
        .iter()
        .filter(|(pos, _)| *pos <= position)
        .max_by_key(|(pos, _)| *pos)
        .or_else(|| figures.iter().filter(|(pos, _)| *pos > position).min_by_key(|(pos, _)| *pos))
        .map(|(_, years)| *years)
}
