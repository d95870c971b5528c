use super::prompt::{Decision, Prompter};
use super::recovery::SharedRecovery;
use crate::dupes::matcher::LiveIndex;
use crate::listing::model::EventRecord;
use crate::venues::registry::VenueRegistry;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Set from the Ctrl-C handler, polled between records
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A local record awaiting a verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    record: EventRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Kept(EventRecord),
    Omitted(EventRecord),
}

impl Pending {
    pub fn new(record: EventRecord) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &EventRecord {
        &self.record
    }

    /// Blank text leaves the record as it was
    pub fn edit(self, text: &str) -> Pending {
        if text.trim().is_empty() {
            return self;
        }

        Pending::new(self.record.with_text(text.to_string()))
    }

    pub fn annotate(self, note: &str) -> Pending {
        let note = note.trim();
        if note.is_empty() {
            return self;
        }

        let text = format!("{}  {}", self.record.full_text, note);
        Pending::new(self.record.with_text(text))
    }

    pub fn keep(self) -> Verdict {
        Verdict::Kept(self.record)
    }

    pub fn omit(self) -> Verdict {
        Verdict::Omitted(self.record)
    }
}

impl Verdict {
    pub fn record(&self) -> &EventRecord {
        match self {
            Verdict::Kept(record) | Verdict::Omitted(record) => record,
        }
    }

    pub fn is_kept(&self) -> bool {
        matches!(self, Verdict::Kept(_))
    }
}

/// Process status of a run stopped by Ctrl-C
pub const INTERRUPTED_STATUS: u8 = 130;

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Texts of the kept records, in local list order
    Completed { kept: Vec<String>, omitted: usize },
    Interrupted {
        processed: usize,
        recovery_file: Option<PathBuf>,
    },
}

impl Outcome {
    pub fn exit_status(&self) -> u8 {
        match self {
            Outcome::Completed { .. } => 0,
            Outcome::Interrupted { .. } => INTERRUPTED_STATUS,
        }
    }
}

pub struct Reconciler<'a> {
    index: &'a LiveIndex,
    registry: &'a mut dyn VenueRegistry,
    /// `None` runs without asking: every record is kept
    prompter: Option<&'a mut dyn Prompter>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        index: &'a LiveIndex,
        registry: &'a mut dyn VenueRegistry,
        prompter: Option<&'a mut dyn Prompter>,
    ) -> Self {
        Self {
            index,
            registry,
            prompter,
        }
    }

    pub fn review(&mut self, pending: Pending) -> Verdict {
        let index = self.index;
        let record = pending.record();

        let Some(venue) = record.venue_norm.clone() else {
            return pending.keep();
        };

        if self.registry.lookup(&venue) {
            return pending.keep();
        }

        let dupes = index.dupes_for(record);
        let Some(live) = dupes.first() else {
            return pending.keep();
        };

        debug!(
            "{} has {} possible duplicate(s) at {}",
            record.date_key_string(),
            dupes.len(),
            venue
        );

        let Some(prompter) = self.prompter.as_deref_mut() else {
            return pending.keep();
        };

        match prompter.ask(record, live) {
            Decision::Omit => pending.omit(),
            Decision::Keep => pending.keep(),
            Decision::Edit(text) => pending.edit(&text).keep(),
            Decision::Annotate(note) => pending.annotate(&note).keep(),
            Decision::MarkMultiple => {
                self.registry.set_multiple_true(&venue);
                pending.keep()
            }
        }
    }

    /// Reviews every local record in order.
    ///
    /// If `cancel` fires, the records processed so far, decided or not, are
    /// written to a recovery file in `recovery_dir`.
    pub fn run(
        &mut self,
        local: Vec<EventRecord>,
        cancel: &CancelToken,
        recovery_dir: &Path,
    ) -> Outcome {
        self.run_with_recovery(local, cancel, &SharedRecovery::arm(recovery_dir))
    }

    /// Same as [`Reconciler::run`], tracking records in a guard the caller
    /// can also flush.
    pub fn run_with_recovery(
        &mut self,
        local: Vec<EventRecord>,
        cancel: &CancelToken,
        recovery: &SharedRecovery,
    ) -> Outcome {
        let total = local.len();
        let mut kept = Vec::new();
        let mut omitted = 0;

        for (position, record) in local.into_iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            info!("Checking {}/{}", position + 1, total);

            recovery.track(&record.full_text);
            let verdict = self.review(Pending::new(record));
            recovery.update_last(&verdict.record().full_text);

            match verdict {
                Verdict::Kept(record) => kept.push(record.full_text),
                Verdict::Omitted(_) => omitted += 1,
            }

            if cancel.is_cancelled() {
                break;
            }
        }

        if cancel.is_cancelled() {
            let processed = recovery.processed();
            warn!("Interrupted after {} of {} listings", processed, total);

            return Outcome::Interrupted {
                processed,
                recovery_file: recovery.flush(),
            };
        }

        recovery.disarm();
        info!("Kept {} listings, omitted {} duplicates", kept.len(), omitted);

        Outcome::Completed { kept, omitted }
    }
}
