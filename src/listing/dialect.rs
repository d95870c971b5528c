use super::date::{first_time_minutes, is_header, parse_header, resolve_date};
use super::model::{Block, EventRecord};
use super::venue::{normalize_text, venue_norm_of};
use chrono::NaiveDate;
use tracing::{debug, trace};

/// A text layout event lists are written in
pub trait Dialect {
    fn name(&self) -> &'static str;

    /// Splits raw text into the blocks describing one event each
    fn segment(&self, text: &str) -> Vec<Block>;

    /// `None` when the block does not describe a usable event
    fn extract(&self, block: &Block) -> Option<EventRecord>;
}

/// The scraped listing: free-form blocks that start at a date header and run
/// until the next one, blank lines included.
pub struct LiveDialect {
    today: NaiveDate,
}

impl LiveDialect {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Dialect for LiveDialect {
    fn name(&self) -> &'static str {
        "live"
    }

    fn segment(&self, text: &str) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for line in text.lines() {
            if is_header(line) && !current.is_empty() {
                blocks.push(Block::new(std::mem::take(&mut current)));
            }
            current.push(line.to_string());
        }

        if !current.is_empty() {
            blocks.push(Block::new(current));
        }

        blocks
    }

    fn extract(&self, block: &Block) -> Option<EventRecord> {
        let record = extract_record(block, self.today)?;

        if record.venue_norm.is_none() {
            trace!("Dropping live block without venue: {}", record.full_text);
            return None;
        }

        Some(record)
    }
}

/// The curated list: a header line followed by one detail line.
pub struct MineDialect {
    today: NaiveDate,
}

impl MineDialect {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Dialect for MineDialect {
    fn name(&self) -> &'static str {
        "mine"
    }

    fn segment(&self, text: &str) -> Vec<Block> {
        let lines: Vec<&str> = text.lines().collect();
        let mut blocks = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            if !is_header(lines[index]) {
                if !lines[index].trim().is_empty() {
                    debug!("Skipping line outside of a record: {}", lines[index]);
                }
                index += 1;
                continue;
            }

            let mut block = vec![lines[index].to_string()];
            if let Some(detail) = lines.get(index + 1).filter(|line| !line.trim().is_empty()) {
                block.push(detail.to_string());
            }
            blocks.push(Block::new(block));
            index += 2;
        }

        blocks
    }

    fn extract(&self, block: &Block) -> Option<EventRecord> {
        extract_record(block, self.today)
    }
}

fn extract_record(block: &Block, today: NaiveDate) -> Option<EventRecord> {
    let header = parse_header(block.first_non_blank()?)?;
    let date_key = resolve_date(header.month, header.day, today)?;

    let block_text = normalize_text(&block.lines.join(" "));

    Some(EventRecord::new(
        date_key,
        venue_norm_of(&block_text),
        first_time_minutes(&block_text),
        block.text(),
    ))
}

pub fn parse_listing(dialect: &dyn Dialect, text: &str) -> Vec<EventRecord> {
    let blocks = dialect.segment(text);
    let records: Vec<EventRecord> = blocks
        .iter()
        .filter_map(|block| dialect.extract(block))
        .collect();

    debug!(
        "{} dialect: {} blocks, {} records",
        dialect.name(),
        blocks.len(),
        records.len()
    );

    records
}
