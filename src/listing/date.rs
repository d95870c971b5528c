use chrono::{Datelike, Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

pub const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Weekday tokens from Monday on; Thursday is written `thr` in the lists
pub const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thr", "fri", "sat", "sun"];

/// Years tried after the current one before a month/day is declared impossible
const MAX_YEARS_AHEAD: i32 = 8;

lazy_static! {
    pub static ref HEADER_REGEX: Regex = Regex::new(
        r"(?i)^(?P<mon>jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\s{1,2}(?P<day>\d{1,2})\s+(?P<dow>sun|mon|tue|wed|thr|fri|sat)\b"
    )
    .unwrap();
    static ref TIME_TOKEN_REGEX: Regex =
        Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*([ap])m").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub month: u32,
    pub day: u32,
    pub weekday: String,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn is_header(line: &str) -> bool {
    HEADER_REGEX.is_match(line.trim())
}

pub fn parse_header(line: &str) -> Option<Header> {
    let captures = HEADER_REGEX.captures(line.trim())?;

    Some(Header {
        month: month_index(&captures["mon"])?,
        day: captures["day"].parse().ok()?,
        weekday: captures["dow"].to_lowercase(),
    })
}

/// 1-based month for a three letter abbreviation
pub fn month_index(token: &str) -> Option<u32> {
    let token = token.to_lowercase();

    MONTHS
        .iter()
        .position(|month| *month == token)
        .map(|index| index as u32 + 1)
}

pub fn weekday_token(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

/// Next occurrence of `month`/`day` on or after `today`.
///
/// Years are tried one at a time, so Feb 29 lands on the next leap year.
/// Days that never exist in the month give `None`.
pub fn resolve_date(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    if !(1..=31).contains(&day) {
        return None;
    }

    (today.year()..=today.year() + MAX_YEARS_AHEAD)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date >= today)
}

/// Date a listing most likely refers to, using its weekday token.
///
/// Prefers whichever of this year's or next year's date falls on the listed
/// weekday, otherwise the next upcoming occurrence. Best effort only: a
/// wrong weekday token still yields a date.
pub fn intended_date(
    month: u32,
    day: u32,
    listed_weekday: &str,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let listed_weekday = match listed_weekday.to_lowercase().as_str() {
        "thu" => "thr".to_string(),
        other => other.to_string(),
    };
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    let next_year = NaiveDate::from_ymd_opt(today.year() + 1, month, day);

    let on_listed_weekday = |date: &NaiveDate| weekday_token(*date) == listed_weekday;

    if let Some(date) = this_year.filter(on_listed_weekday) {
        return Some(date);
    }
    if let Some(date) = next_year.filter(on_listed_weekday) {
        return Some(date);
    }

    match this_year {
        Some(date) if date >= today => Some(date),
        _ => next_year.or(this_year),
    }
}

/// `mon dd dow` header for the next occurrence of `month`/`day`
pub fn format_header(month: u32, day: u32, today: NaiveDate) -> Option<String> {
    let date = resolve_date(month, day, today)?;

    Some(format!(
        "{} {:>2} {}",
        MONTHS[month as usize - 1],
        day,
        weekday_token(date)
    ))
}

/// Minutes past midnight of the first `h[:mm]am|pm` token in `text`
pub fn first_time_minutes(text: &str) -> Option<u32> {
    let captures = TIME_TOKEN_REGEX.captures(text)?;

    let hour: u32 = captures[1].parse().ok()?;
    let minute: u32 = captures
        .get(2)
        .map_or(Some(0), |minute| minute.as_str().parse().ok())?;
    let is_pm = captures[3].eq_ignore_ascii_case("p");

    Some(to_minutes(hour, minute, is_pm))
}

fn to_minutes(hour: u32, minute: u32, is_pm: bool) -> u32 {
    let hour = if hour == 12 { 0 } else { hour };
    let hour = if is_pm { hour + 12 } else { hour };

    hour * 60 + minute
}
