use crate::listing::model::EventRecord;
use chrono::NaiveDate;
use itertools::Itertools;
use std::collections::HashMap;

/// How far apart two start times can be and still be the same show
pub const TIME_TOLERANCE_MIN: u32 = 60;

type MatchKey = (NaiveDate, String);

/// Whether two records probably describe the same show.
///
/// Date and venue must match exactly; a missing time on either side can't
/// rule a duplicate out.
pub fn likely_dupe(a: &EventRecord, b: &EventRecord) -> bool {
    if a.date_key != b.date_key {
        return false;
    }

    match (&a.venue_norm, &b.venue_norm) {
        (Some(venue_a), Some(venue_b)) if venue_a == venue_b => {}
        _ => return false,
    }

    match (a.time_min, b.time_min) {
        (Some(time_a), Some(time_b)) => time_a.abs_diff(time_b) <= TIME_TOLERANCE_MIN,
        _ => true,
    }
}

/// Live records grouped by date and venue
#[derive(Debug, Default)]
pub struct LiveIndex {
    by_key: HashMap<MatchKey, Vec<EventRecord>>,
}

impl LiveIndex {
    pub fn new(live: Vec<EventRecord>) -> Self {
        let by_key = live
            .into_iter()
            .filter_map(|record| {
                let key = (record.date_key, record.venue_norm.clone()?);
                Some((key, record))
            })
            .into_group_map();

        Self { by_key }
    }

    pub fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Live records sharing the local record's date and venue
    pub fn candidates(&self, local: &EventRecord) -> &[EventRecord] {
        local
            .venue_norm
            .as_ref()
            .and_then(|venue| self.by_key.get(&(local.date_key, venue.clone())))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Candidates that are likely duplicates, in live list order
    pub fn dupes_for(&self, local: &EventRecord) -> Vec<&EventRecord> {
        self.candidates(local)
            .iter()
            .filter(|live| likely_dupe(local, live))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, venue: Option<&str>, time_min: Option<u32>) -> EventRecord {
        EventRecord::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            venue.map(str::to_string),
            time_min,
            format!("{date} at {venue:?}"),
        )
    }

    #[test_log::test]
    fn when_times_are_thirty_minutes_apart_should_be_dupe() {
        let local = record("2025-03-14", Some("bowery ballroom"), Some(1260));
        let live = record("2025-03-14", Some("bowery ballroom"), Some(1230));

        assert!(likely_dupe(&local, &live));
    }

    #[test_log::test]
    fn when_times_are_two_hours_apart_should_not_be_dupe() {
        let local = record("2025-03-14", Some("bowery ballroom"), Some(1260));
        let live = record("2025-03-14", Some("bowery ballroom"), Some(1140));

        assert!(!likely_dupe(&local, &live));
    }

    #[test_log::test]
    fn tolerance_should_include_exactly_one_hour() {
        let local = record("2025-03-14", Some("bowery ballroom"), Some(1260));

        assert!(likely_dupe(&local, &record("2025-03-14", Some("bowery ballroom"), Some(1200))));
        assert!(!likely_dupe(&local, &record("2025-03-14", Some("bowery ballroom"), Some(1199))));
    }

    #[test_log::test]
    fn when_a_time_is_unknown_should_be_dupe() {
        let local = record("2025-03-14", Some("bowery ballroom"), None);
        let live = record("2025-03-14", Some("bowery ballroom"), Some(600));

        assert!(likely_dupe(&local, &live));
        assert!(likely_dupe(&live, &local));
    }

    #[test_log::test]
    fn when_date_or_venue_differ_should_never_be_dupe() {
        let base = record("2025-03-14", Some("bowery ballroom"), None);
        let others = [
            record("2025-03-15", Some("bowery ballroom"), None),
            record("2025-03-14", Some("bowery electric"), None),
            record("2025-03-14", None, None),
        ];

        for other in &others {
            assert!(!likely_dupe(&base, other));
            assert!(!likely_dupe(other, &base));
        }
        assert!(!likely_dupe(&others[2], &others[2]));
    }

    #[test_log::test]
    fn likely_dupe_should_be_symmetric() {
        let dates = ["2025-03-14", "2025-03-15"];
        let venues = [Some("bowery ballroom"), Some("dna lounge"), None];
        let times = [None, Some(1140), Some(1200), Some(1230), Some(1260), Some(1321)];

        let records: Vec<EventRecord> = dates
            .iter()
            .flat_map(|date| venues.iter().map(move |venue| (date, venue)))
            .flat_map(|(date, venue)| times.iter().map(move |time| record(date, *venue, *time)))
            .collect();

        for a in &records {
            for b in &records {
                assert_eq!(likely_dupe(a, b), likely_dupe(b, a), "{a:?} / {b:?}");
            }
        }
    }

    #[test_log::test]
    fn index_should_only_offer_same_date_and_venue() {
        let index = LiveIndex::new(vec![
            record("2025-03-14", Some("bowery ballroom"), Some(1140)),
            record("2025-03-14", Some("bowery ballroom"), Some(1230)),
            record("2025-03-14", Some("dna lounge"), Some(1260)),
            record("2025-03-15", Some("bowery ballroom"), Some(1260)),
            record("2025-03-14", None, Some(1260)),
        ]);
        let local = record("2025-03-14", Some("bowery ballroom"), Some(1260));

        assert_eq!(index.len(), 4);
        assert_eq!(index.candidates(&local).len(), 2);

        let dupes = index.dupes_for(&local);
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes[0].time_min, Some(1230));
    }

    #[test_log::test]
    fn local_without_venue_should_have_no_candidates() {
        let index = LiveIndex::new(vec![record("2025-03-14", Some("bowery ballroom"), None)]);

        assert!(index
            .dupes_for(&record("2025-03-14", None, None))
            .is_empty());
    }
}
