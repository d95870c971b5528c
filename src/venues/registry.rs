use super::xml::{parse_document, write_document, Element};
use crate::error::{Result, SlistError};
use crate::listing::venue::normalize_venue;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const PLACEHOLDER_ID: u32 = 0;
const VENUE_TAG: &str = "venue";

/// Which venues routinely host more than one show a night
pub trait VenueRegistry {
    fn lookup(&self, venue_norm: &str) -> bool;

    /// Returns whether the flag changed. Never turns a flag off.
    fn set_multiple_true(&mut self, venue_norm: &str) -> bool;
}

impl VenueRegistry for HashMap<String, bool> {
    fn lookup(&self, venue_norm: &str) -> bool {
        self.get(venue_norm).copied().unwrap_or(false)
    }

    fn set_multiple_true(&mut self, venue_norm: &str) -> bool {
        !self.insert(venue_norm.to_string(), true).unwrap_or(false)
    }
}

fn is_truthy(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

/// A `<venue id="..">` element: `pn` short name, `ln` long name, optional
/// `multiple`, and whatever else the color and add scripts put there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueEntry {
    element: Element,
}

impl VenueEntry {
    pub fn new(pn: &str, ln: &str) -> Self {
        let mut element = Element::new(VENUE_TAG);
        element.children.push(Element::with_text("pn", pn));
        element.children.push(Element::with_text("ln", ln));

        Self { element }
    }

    pub fn id(&self) -> Option<u32> {
        self.element.attribute("id")?.trim().parse().ok()
    }

    fn set_id(&mut self, id: u32) {
        self.element.set_attribute("id", &id.to_string());
    }

    pub fn pn(&self) -> &str {
        self.field("pn").unwrap_or_default()
    }

    pub fn ln(&self) -> &str {
        self.field("ln").unwrap_or_default()
    }

    /// Trimmed text of any child element, e.g. `color`
    pub fn field(&self, name: &str) -> Option<&str> {
        self.element.child_text(name)
    }

    pub fn is_multiple(&self) -> bool {
        self.field("multiple").is_some_and(is_truthy)
    }

    /// Returns whether the flag changed
    pub fn mark_multiple(&mut self) -> bool {
        if self.is_multiple() {
            return false;
        }

        self.element.child_or_insert("multiple").text = "true".to_string();
        true
    }

    pub fn venue_norm(&self) -> Option<String> {
        let name = if self.ln().is_empty() {
            self.pn()
        } else {
            self.ln()
        };

        normalize_venue(name)
    }
}

/// The whole `venues.xml` document. Children other than `<venue>` are kept
/// and written back ahead of the venues.
#[derive(Debug, Clone)]
pub struct VenueStore {
    root: Element,
    pub venues: Vec<VenueEntry>,
}

impl VenueStore {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut root = parse_document(xml)?;

        let (venues, others): (Vec<Element>, Vec<Element>) = root
            .children
            .drain(..)
            .partition(|child| child.name == VENUE_TAG);
        root.children = others;

        Ok(Self {
            root,
            venues: venues
                .into_iter()
                .map(|element| VenueEntry { element })
                .collect(),
        })
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut root = self.root.clone();
        root.children
            .extend(self.venues.iter().map(|venue| venue.element.clone()));

        write_document(&root)
    }
}

pub fn read_store(path: &Path) -> Result<VenueStore> {
    VenueStore::parse(&fs::read_to_string(path)?)
}

pub fn write_store(path: &Path, store: &VenueStore) -> Result<()> {
    fs::write(path, store.to_xml()?)?;
    Ok(())
}

/// Registry backed by `venues.xml`.
///
/// The file is read once on load; every newly marked venue is written back
/// right away with a whole-file read-modify-write.
#[derive(Debug, Default)]
pub struct XmlVenueRegistry {
    path: Option<PathBuf>,
    flags: HashMap<String, bool>,
}

impl XmlVenueRegistry {
    /// A missing or unreadable file leaves every venue unflagged
    #[instrument]
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            debug!("No venue registry found, no venue is known as multiple");
            return Self {
                path: Some(path.to_path_buf()),
                flags: HashMap::new(),
            };
        }

        let flags = match read_store(path) {
            Ok(store) => store
                .venues
                .iter()
                .filter_map(|venue| {
                    venue
                        .venue_norm()
                        .map(|norm| (norm, venue.is_multiple()))
                })
                .collect(),
            Err(err) => {
                warn!("Could not parse venue registry: {}", err);
                HashMap::new()
            }
        };

        debug!("Loaded {} venues", flags.len());

        Self {
            path: Some(path.to_path_buf()),
            flags,
        }
    }

    fn persist_multiple(&self, venue_norm: &str) -> Result<bool> {
        let Some(path) = self.path.as_deref().filter(|path| path.exists()) else {
            return Ok(false);
        };

        let mut store = read_store(path)?;
        let Some(venue) = store
            .venues
            .iter_mut()
            .find(|venue| venue.venue_norm().as_deref() == Some(venue_norm))
        else {
            return Ok(false);
        };

        if !venue.mark_multiple() {
            return Ok(false);
        }

        write_store(path, &store)?;

        Ok(true)
    }
}

impl VenueRegistry for XmlVenueRegistry {
    fn lookup(&self, venue_norm: &str) -> bool {
        self.flags.lookup(venue_norm)
    }

    fn set_multiple_true(&mut self, venue_norm: &str) -> bool {
        if !self.flags.set_multiple_true(venue_norm) {
            return false;
        }

        match self.persist_multiple(venue_norm) {
            Ok(true) => info!("Marked '{}' as multiple in the venue registry", venue_norm),
            Ok(false) => warn!(
                "'{}' is not in the venue registry, marked as multiple for this run only",
                venue_norm
            ),
            Err(err) => warn!("Could not write venue registry multiple flag: {}", err),
        }

        true
    }
}

/// Adds a venue and re-numbers the store, ordered by short name.
/// The placeholder entry (id 0) stays first.
#[instrument]
pub fn add_venue(path: &Path, ln: &str, pn: &str) -> Result<VenueEntry> {
    if !path.is_file() {
        return Err(SlistError::Registry(format!(
            "venue registry not found at {}",
            path.display()
        )));
    }

    let mut store = read_store(path)?;
    let (placeholder, venues): (Vec<VenueEntry>, Vec<VenueEntry>) = store
        .venues
        .drain(..)
        .partition(|venue| venue.id() == Some(PLACEHOLDER_ID));

    let mut venues: Vec<(bool, VenueEntry)> = venues
        .into_iter()
        .map(|venue| (false, venue))
        .chain([(true, VenueEntry::new(pn, ln))])
        .collect();
    venues.sort_by_key(|(_, venue)| venue.pn().to_lowercase());

    let mut added = None;
    for (index, (is_new, venue)) in venues.iter_mut().enumerate() {
        venue.set_id(index as u32 + 1);
        if *is_new {
            added = Some(venue.clone());
        }
    }

    store.venues = placeholder
        .into_iter()
        .chain(venues.into_iter().map(|(_, venue)| venue))
        .collect();
    write_store(path, &store)?;

    info!("Added venue: '{}' (short: '{}')", ln, pn);

    added.ok_or_else(|| SlistError::Registry("added venue went missing".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const STORE: &str = r#"<?xml version='1.0' encoding='utf-8'?>
<venues>
  <venue id="0"><pn></pn><ln></ln></venue>
  <venue id="1"><pn>Bottom</pn><ln>Bottom of the Hill, S.F.</ln><color>blue</color></venue>
  <venue id="2"><pn>DNA</pn><ln>DNA Lounge</ln><multiple>yes</multiple></venue>
  <venue id="3"><pn>Fillmore</pn><ln>The Fillmore</ln><multiple>false</multiple></venue>
  <venue id="4"><pn>Hemlock</pn><ln></ln><multiple>1</multiple></venue>
</venues>
"#;

    fn store_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("venues.xml");
        fs::write(&path, STORE).unwrap();
        path
    }

    #[test_log::test]
    fn in_memory_registry_should_only_report_first_change() {
        let mut registry: HashMap<String, bool> = HashMap::new();

        assert!(!registry.lookup("dna lounge"));
        assert!(registry.set_multiple_true("dna lounge"));
        assert!(!registry.set_multiple_true("dna lounge"));
        assert!(registry.lookup("dna lounge"));
    }

    #[test_log::test]
    fn multiple_should_accept_the_usual_truthy_spellings() {
        for (text, expected) in [
            ("true", true),
            (" TRUE ", true),
            ("1", true),
            ("yes", true),
            ("Y", true),
            ("false", false),
            ("0", false),
            ("", false),
        ] {
            assert_eq!(is_truthy(text), expected, "{text:?}");
        }
    }

    #[test_log::test]
    fn should_load_flags_by_normalized_long_name() {
        let dir = TempDir::new().unwrap();
        let registry = XmlVenueRegistry::load(Some(&store_file(&dir)));

        assert!(registry.lookup("dna lounge"));
        assert!(!registry.lookup("fillmore"));
        assert!(!registry.lookup("bottom of the hill sf"));
        assert!(!registry.lookup("unknown venue"));
    }

    #[test_log::test]
    fn when_long_name_is_empty_should_key_by_short_name() {
        let dir = TempDir::new().unwrap();
        let registry = XmlVenueRegistry::load(Some(&store_file(&dir)));

        assert!(registry.lookup("hemlock"));
    }

    #[test_log::test]
    fn when_file_is_missing_should_know_no_venue() {
        let dir = TempDir::new().unwrap();
        let registry = XmlVenueRegistry::load(Some(&dir.path().join("nope.xml")));

        assert!(!registry.lookup("dna lounge"));
    }

    #[test_log::test]
    fn when_file_is_corrupt_should_know_no_venue() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("venues.xml");
        fs::write(&path, "<venues><venue id=\"2\"><ln>DNA Lounge</venue>").unwrap();

        let registry = XmlVenueRegistry::load(Some(&path));

        assert!(!registry.lookup("dna lounge"));
    }

    #[test_log::test]
    fn marking_multiple_should_write_through_and_keep_other_tags() {
        let dir = TempDir::new().unwrap();
        let path = store_file(&dir);
        let mut registry = XmlVenueRegistry::load(Some(&path));

        assert!(registry.set_multiple_true("bottom of the hill sf"));
        assert!(registry.lookup("bottom of the hill sf"));

        let store = read_store(&path).unwrap();
        let bottom = &store.venues[1];
        assert!(bottom.is_multiple());
        assert_eq!(bottom.field("multiple"), Some("true"));
        assert_eq!(bottom.field("color"), Some("blue"));
        assert_eq!(store.venues.len(), 5);

        let reloaded = XmlVenueRegistry::load(Some(&path));
        assert!(reloaded.lookup("bottom of the hill sf"));
        assert!(reloaded.lookup("dna lounge"));
    }

    #[test_log::test]
    fn marking_a_venue_flagged_false_should_overwrite_the_flag() {
        let dir = TempDir::new().unwrap();
        let path = store_file(&dir);
        let mut registry = XmlVenueRegistry::load(Some(&path));

        assert!(registry.set_multiple_true("fillmore"));

        let store = read_store(&path).unwrap();
        assert_eq!(store.venues[3].field("multiple"), Some("true"));
    }

    #[test_log::test]
    fn marking_an_already_multiple_venue_should_change_nothing() {
        let dir = TempDir::new().unwrap();
        let path = store_file(&dir);
        let mut registry = XmlVenueRegistry::load(Some(&path));

        assert!(!registry.set_multiple_true("dna lounge"));
        assert_eq!(fs::read_to_string(&path).unwrap(), STORE);
    }

    #[test_log::test]
    fn marking_an_unknown_venue_should_last_for_the_run() {
        let dir = TempDir::new().unwrap();
        let path = store_file(&dir);
        let mut registry = XmlVenueRegistry::load(Some(&path));

        assert!(registry.set_multiple_true("cafe du nord"));
        assert!(registry.lookup("cafe du nord"));
        assert_eq!(fs::read_to_string(&path).unwrap(), STORE);
    }

    #[test_log::test]
    fn add_venue_should_sort_by_short_name_and_renumber() {
        let dir = TempDir::new().unwrap();
        let path = store_file(&dir);

        let added = add_venue(&path, "Cafe du Nord", "Cafe").unwrap();

        assert_eq!(added.id(), Some(2));
        assert_eq!(added.ln(), "Cafe du Nord");

        let store = read_store(&path).unwrap();
        let names: Vec<(Option<u32>, &str)> = store
            .venues
            .iter()
            .map(|venue| (venue.id(), venue.pn()))
            .collect();
        assert_eq!(
            names,
            vec![
                (Some(0), ""),
                (Some(1), "Bottom"),
                (Some(2), "Cafe"),
                (Some(3), "DNA"),
                (Some(4), "Fillmore"),
                (Some(5), "Hemlock")
            ]
        );
        assert!(store.venues[3].is_multiple());
        assert_eq!(store.venues[1].field("color"), Some("blue"));
    }

    #[test_log::test]
    fn add_venue_without_registry_should_fail() {
        let dir = TempDir::new().unwrap();

        let result = add_venue(&dir.path().join("venues.xml"), "Cafe du Nord", "Cafe");

        assert!(matches!(result, Err(SlistError::Registry(_))));
    }
}
