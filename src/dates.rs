//! Date-range extraction from free text.
//!
//! Extraction runs an ordered list of [`DateStrategy`] implementations and
//! keeps the first hit. When every strategy misses, the range falls back to
//! `(today, today + 1 day)`, so [`DateRangeExtractor::extract`] never fails.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MONTH_PATTERN: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b\.?";

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?ix)
        \b\d{{4}}[-/]\d{{1,2}}[-/]\d{{1,2}}\b
        | \b\d{{1,2}}/\d{{1,2}}(?:/\d{{2,4}})?\b
        | \b{m}\s+\d{{1,2}}(?:st|nd|rd|th)?\b(?:,?\s+\d{{4}}\b)?
        | \b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?{m}(?:,?\s+\d{{4}}\b)?
        | \b(?:today|tomorrow|yesterday)\b
        | \b(?:(?:next|this|on)\s+)?(?:mon|tues|wednes|thurs|fri|satur|sun)day\b
        ",
        m = MONTH_PATTERN
    );
    Regex::new(&pattern).expect("date entity pattern compiles")
});

static NAMED_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?P<m1>[a-z]+)\.?\s+(?P<d1>\d{1,2})(?:st|nd|rd|th)?|(?P<d2>\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<m2>[a-z]+)\.?)(?:,?\s+(?P<y>\d{4}))?$")
        .expect("named date pattern compiles")
});

/// Which extraction tier produced a [`DateRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    Entity,
    Fuzzy,
    Default,
    /// Dates supplied by the user rather than extracted.
    Provided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub source: DateSource,
}

impl DateRange {
    /// Builds a range, swapping the bounds if `end` precedes `start`.
    pub fn ordered(start: NaiveDate, end: NaiveDate, source: DateSource) -> Self {
        if end < start {
            tracing::debug!(%start, %end, "extracted end precedes start; swapping");
            Self {
                start: end,
                end: start,
                source,
            }
        } else {
            Self { start, end, source }
        }
    }

    pub fn fallback(today: NaiveDate) -> Self {
        Self {
            start: today,
            end: next_day(today),
            source: DateSource::Default,
        }
    }
}

/// A date-like span found in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateEntity {
    pub text: String,
    pub offset: usize,
}

pub trait DateStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, text: &str, today: NaiveDate) -> Option<DateRange>;
}

/// Recognises date entities and turns the first and last into a range.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityStrategy;

impl DateStrategy for EntityStrategy {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn extract(&self, text: &str, today: NaiveDate) -> Option<DateRange> {
        let entities = recognize_date_entities(text);
        let first = entities.first()?;
        let last = entities.last()?;
        let start = parse_date_entity(&first.text, today);
        let end = parse_date_entity(&last.text, today);
        match (start, end) {
            (Some(start), Some(end)) => Some(DateRange::ordered(start, end, DateSource::Entity)),
            _ => {
                tracing::debug!(
                    first = %first.text,
                    last = %last.text,
                    "discarding unparseable date entities"
                );
                None
            }
        }
    }
}

/// Reads the whole input as one loosely written date, skipping any token
/// that is not a month name, a day number or a year. A bare number is not
/// enough: the text needs a month name or an ordinal day ("22nd").
#[derive(Debug, Default, Clone, Copy)]
pub struct FuzzyStrategy;

impl DateStrategy for FuzzyStrategy {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn extract(&self, text: &str, today: NaiveDate) -> Option<DateRange> {
        let start = parse_fuzzy_date(text, today)?;
        Some(DateRange {
            start,
            end: next_day(start),
            source: DateSource::Fuzzy,
        })
    }
}

pub struct DateRangeExtractor {
    strategies: Vec<Box<dyn DateStrategy>>,
}

impl Default for DateRangeExtractor {
    fn default() -> Self {
        Self::new(vec![Box::new(EntityStrategy), Box::new(FuzzyStrategy)])
    }
}

impl DateRangeExtractor {
    pub fn new(strategies: Vec<Box<dyn DateStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn extract(&self, text: &str, today: NaiveDate) -> DateRange {
        for strategy in &self.strategies {
            if let Some(range) = strategy.extract(text, today) {
                tracing::debug!(strategy = strategy.name(), start = %range.start, end = %range.end, "date range extracted");
                return range;
            }
        }
        DateRange::fallback(today)
    }
}

/// Shorthand for the default entity → fuzzy → today pipeline.
pub fn extract_date_range(text: &str, today: NaiveDate) -> DateRange {
    DateRangeExtractor::default().extract(text, today)
}

pub fn recognize_date_entities(text: &str) -> Vec<DateEntity> {
    ENTITY_RE
        .find_iter(text)
        .map(|m| DateEntity {
            text: m.as_str().trim().to_string(),
            offset: m.start(),
        })
        .collect()
}

/// Resolve a single recognised span to a calendar date. Spans without a
/// year take `today`'s year; relative words resolve against `today`.
pub fn parse_date_entity(span: &str, today: NaiveDate) -> Option<NaiveDate> {
    let span = span.trim();
    let lower = span.to_ascii_lowercase();

    match lower.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.checked_add_signed(Duration::days(1)),
        "yesterday" => return today.checked_sub_signed(Duration::days(1)),
        _ => {}
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(span, format) {
            return Some(date);
        }
    }

    if lower.contains('/') {
        return parse_slash_date(&lower, today);
    }

    if let Some(date) = parse_weekday_phrase(&lower, today) {
        return Some(date);
    }

    let caps = NAMED_DATE_RE.captures(span)?;
    let month_word = caps.name("m1").or_else(|| caps.name("m2"))?.as_str();
    let day_word = caps.name("d1").or_else(|| caps.name("d2"))?.as_str();
    let month = month_from_name(month_word)?;
    let day: u32 = day_word.parse().ok()?;
    let year = match caps.name("y") {
        Some(y) => y.as_str().parse().ok()?,
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_slash_date(span: &str, today: NaiveDate) -> Option<NaiveDate> {
    let parts: Vec<&str> = span.split('/').collect();
    let month: u32 = parts.first()?.parse().ok()?;
    let day: u32 = parts.get(1)?.parse().ok()?;
    let year = match parts.get(2) {
        Some(y) if y.len() == 2 => 2000 + y.parse::<i32>().ok()?,
        Some(y) => y.parse().ok()?,
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_weekday_phrase(span: &str, today: NaiveDate) -> Option<NaiveDate> {
    let mut words = span.split_whitespace();
    let first = words.next()?;
    let (modifier, day_word) = match words.next() {
        Some(second) => (Some(first), second),
        None => (None, first),
    };
    let weekday = weekday_from_name(day_word)?;
    let mut date = today;
    if modifier == Some("next") {
        date = date.checked_add_signed(Duration::days(1))?;
    }
    while date.weekday() != weekday {
        date = date.checked_add_signed(Duration::days(1))?;
    }
    Some(date)
}

fn parse_fuzzy_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let mut year: Option<i32> = None;
    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;
    let mut ordinal_day = false;

    for token in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let lower = token.to_ascii_lowercase();
        if month.is_none() {
            if let Some(m) = month_from_token(&lower) {
                month = Some(m);
                continue;
            }
        }
        let digits = strip_ordinal(&lower);
        let Ok(value) = digits.parse::<u32>() else {
            continue;
        };
        if digits.len() == 4 && year.is_none() {
            year = Some(value as i32);
        } else if (1..=31).contains(&value) && day.is_none() {
            day = Some(value);
            ordinal_day = digits.len() < lower.len();
        }
    }

    if month.is_none() && !ordinal_day {
        return None;
    }

    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());
    match day {
        Some(day) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let day = today.day().min(days_in_month(year, month)?);
            NaiveDate::from_ymd_opt(year, month, day)
        }
    }
}

fn strip_ordinal(token: &str) -> &str {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(stripped) = token.strip_suffix(suffix) {
            if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
                return stripped;
            }
        }
    }
    token
}

fn month_from_name(word: &str) -> Option<u32> {
    let lower = word.trim_end_matches('.').to_ascii_lowercase();
    month_from_token(&lower)
}

fn month_from_token(lower: &str) -> Option<u32> {
    const MONTHS: [(&str, &str); 12] = [
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("may", "may"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];
    if lower == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|(short, long)| lower == *short || lower == *long)
        .map(|idx| idx as u32 + 1)
}

fn weekday_from_name(word: &str) -> Option<Weekday> {
    match word {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}
