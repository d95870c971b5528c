const VENUE_MARKER: &str = " at ";
const DETAIL_SPACER: &str = "\t       at ";

/// The two lines a kept record is written as.
///
/// Records that already span two lines keep them as they are. A single line
/// is split at its first ` at `; with no marker it stays one line.
pub fn two_lines(full_text: &str) -> Vec<String> {
    let lines: Vec<&str> = full_text.lines().collect();

    if lines.len() >= 2 {
        return vec![lines[0].to_string(), lines[1].to_string()];
    }

    match full_text.split_once(VENUE_MARKER) {
        Some((head, venue)) => vec![
            head.trim().to_string(),
            format!("{}{}", DETAIL_SPACER, venue.trim()),
        ],
        None => vec![full_text.to_string()],
    }
}

/// First two lines as written, for recovery dumps
pub fn raw_lines(full_text: &str) -> Vec<String> {
    let lines: Vec<&str> = full_text.lines().collect();

    if lines.len() >= 2 {
        vec![lines[0].to_string(), lines[1].to_string()]
    } else {
        vec![full_text.to_string()]
    }
}

pub fn render(texts: &[String]) -> String {
    texts
        .iter()
        .flat_map(|text| two_lines(text))
        .map(|line| line + "\n")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn two_line_records_should_round_trip_byte_identical() {
        let text = "mar 14 fri  Band A, Band B \n\t       at Bowery Ballroom 21+ $20 9pm  ";

        let lines = two_lines(text);

        assert_eq!(lines.join("\n"), text);
    }

    #[test_log::test]
    fn single_line_record_should_be_split_at_first_marker() {
        let lines = two_lines("mar 14 fri Live at Leeds at Bowery Ballroom 9pm  (moved)");

        assert_eq!(
            lines,
            vec![
                "mar 14 fri Live".to_string(),
                "\t       at Leeds at Bowery Ballroom 9pm  (moved)".to_string()
            ]
        );
    }

    #[test_log::test]
    fn single_line_without_marker_should_stay_as_is() {
        assert_eq!(two_lines("mar 14 fri Band"), vec!["mar 14 fri Band".to_string()]);
    }

    #[test_log::test]
    fn extra_lines_should_be_dropped() {
        assert_eq!(two_lines("a\nb\nc"), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(raw_lines("a\nb\nc"), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(raw_lines("a at b"), vec!["a at b".to_string()]);
    }

    #[test_log::test]
    fn should_render_each_record_on_its_own_lines() {
        let rendered = render(&[
            "mar 14 fri A\n\t       at X".to_string(),
            "mar 15 sat B at Y 9pm".to_string(),
        ]);

        assert_eq!(
            rendered,
            "mar 14 fri A\n\t       at X\nmar 15 sat B\n\t       at Y 9pm\n"
        );
    }
}
