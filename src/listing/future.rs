use super::date::{intended_date, month_index};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

lazy_static! {
    /// Looser than the reconciliation header: any three letter weekday
    static ref LOOSE_HEADER_REGEX: Regex =
        Regex::new(r"(?i)^([a-z]{3})\s+(\d{1,2})\s+([a-z]{3})\b").unwrap();
}

/// Groups non-blank lines into pairs. An odd trailing line is its own block.
pub fn two_line_blocks(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect::<Vec<String>>()
        .chunks(2)
        .map(<[String]>::to_vec)
        .collect()
}

/// Drops blocks whose date has passed. Blocks whose date can't be worked
/// out are kept.
pub fn filter_future_only(text: &str, today: NaiveDate) -> Vec<Vec<String>> {
    two_line_blocks(text)
        .into_iter()
        .filter(|block| match listed_date(&block[0], today) {
            Some(date) if date < today => {
                info!("Dropping past listing: {}", block[0]);
                false
            }
            _ => true,
        })
        .collect()
}

fn listed_date(header: &str, today: NaiveDate) -> Option<NaiveDate> {
    let captures = LOOSE_HEADER_REGEX.captures(header.trim())?;
    let month = month_index(&captures[1])?;
    let day: u32 = captures[2].parse().ok()?;

    intended_date(month, day, &captures[3], today)
}
