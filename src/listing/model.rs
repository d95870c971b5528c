use chrono::NaiveDate;

/// One parsed event block.
///
/// `date_key`, `venue_norm` and `time_min` are derived from `full_text` and
/// only used for comparison; `full_text` is what gets shown and written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub date_key: NaiveDate,
    pub venue_norm: Option<String>,
    pub time_min: Option<u32>,
    pub full_text: String,
}

impl EventRecord {
    pub fn new(
        date_key: NaiveDate,
        venue_norm: Option<String>,
        time_min: Option<u32>,
        full_text: String,
    ) -> Self {
        Self {
            date_key,
            venue_norm,
            time_min,
            full_text,
        }
    }

    /// `YYYY-MM-DD`
    pub fn date_key_string(&self) -> String {
        self.date_key.format("%Y-%m-%d").to_string()
    }

    pub fn with_text(&self, full_text: String) -> Self {
        Self {
            full_text,
            ..self.clone()
        }
    }
}

/// Raw lines believed to describe one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub lines: Vec<String>,
}

impl Block {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn first_non_blank(&self) -> Option<&str> {
        self.lines
            .iter()
            .map(|line| line.trim())
            .find(|line| !line.is_empty())
    }

    /// The block as written, minus leading and trailing blank lines
    pub fn text(&self) -> String {
        let start = self.lines.iter().position(|line| !line.trim().is_empty());
        let end = self.lines.iter().rposition(|line| !line.trim().is_empty());

        match (start, end) {
            (Some(start), Some(end)) => self.lines[start..=end].join("\n"),
            _ => String::new(),
        }
    }
}
