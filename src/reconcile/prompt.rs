use crate::listing::model::EventRecord;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::str::FromStr;
use tracing::{debug, warn};

const TTY_PATH: &str = "/dev/tty";

/// What the operator wants done with a contested record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// It is a duplicate, leave it out
    Omit,
    Keep,
    /// Replace the text; blank keeps the original
    Edit(String),
    /// Append a note; blank adds nothing
    Annotate(String),
    /// The venue hosts several shows a night, stop asking about it
    MarkMultiple,
}

pub trait Prompter {
    fn ask(&mut self, local: &EventRecord, live: &EventRecord) -> Decision;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(ascii_case_insensitive)]
enum Choice {
    #[strum(serialize = "y")]
    Omit,
    #[strum(serialize = "n")]
    Keep,
    #[strum(serialize = "e")]
    Edit,
    #[strum(serialize = "u")]
    Annotate,
    #[strum(serialize = "m")]
    MarkMultiple,
}

/// Asks over a line-based terminal
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

pub type TtyPrompter = TerminalPrompter<Box<dyn BufRead + Send>, Box<dyn Write + Send>>;

impl TtyPrompter {
    /// Prefers the controlling terminal so prompts work with stdout
    /// redirected. `None` when there is no terminal at all.
    pub fn open() -> Option<Self> {
        match open_tty() {
            Ok((input, output)) => {
                return Some(TerminalPrompter::new(
                    Box::new(BufReader::new(input)),
                    Box::new(output),
                ))
            }
            Err(err) => debug!("Could not open {}: {}", TTY_PATH, err),
        }

        if io::stdin().is_terminal() && io::stderr().is_terminal() {
            return Some(TerminalPrompter::new(
                Box::new(BufReader::new(io::stdin())),
                Box::new(io::stderr()),
            ));
        }

        None
    }
}

fn open_tty() -> io::Result<(File, File)> {
    let input = File::open(TTY_PATH)?;
    let output = OpenOptions::new().write(true).open(TTY_PATH)?;

    Ok((input, output))
}

/// Writes a line to the controlling terminal, where prompts are shown
pub fn notify_tty(message: &str) -> io::Result<()> {
    let mut tty = OpenOptions::new().write(true).open(TTY_PATH)?;
    writeln!(tty, "\n{}", message)?;
    tty.flush()
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self) -> io::Result<String> {
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;

        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }

    fn try_ask(&mut self, local: &EventRecord, live: &EventRecord) -> io::Result<Decision> {
        write!(
            self.output,
            "\nPossible duplicate found:\n  YOUR: {}\n  LIVE: {}\n\
             Duplicate? [y=omit / n=keep / e=edit / u=update-note / m=mark-venue-multiple] > ",
            local.full_text, live.full_text
        )?;
        self.output.flush()?;

        let answer = self.read_answer()?;
        let choice = Choice::from_str(answer.trim()).unwrap_or(Choice::Keep);

        Ok(match choice {
            Choice::Omit => Decision::Omit,
            Choice::Keep => Decision::Keep,
            Choice::Edit => {
                write!(
                    self.output,
                    "Edit your listing, then press Enter (blank = keep as-is):\n{}\n",
                    local.full_text
                )?;
                self.output.flush()?;
                Decision::Edit(self.read_answer()?)
            }
            Choice::Annotate => {
                writeln!(
                    self.output,
                    "Type an update note (e.g. lineup/time/venue change), then Enter (blank = skip):"
                )?;
                self.output.flush()?;
                Decision::Annotate(self.read_answer()?)
            }
            Choice::MarkMultiple => {
                writeln!(self.output, "  Marking venue as multiple; keeping this listing.")?;
                self.output.flush()?;
                Decision::MarkMultiple
            }
        })
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn ask(&mut self, local: &EventRecord, live: &EventRecord) -> Decision {
        self.try_ask(local, live).unwrap_or_else(|err| {
            warn!("Prompt failed ({}), keeping the listing", err);
            Decision::Keep
        })
    }
}

/// Answers from a fixed list, keeping anything once the list runs out
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    decisions: VecDeque<Decision>,
    pub asked: Vec<(String, String)>,
}

impl ScriptedPrompter {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, local: &EventRecord, live: &EventRecord) -> Decision {
        self.asked
            .push((local.full_text.clone(), live.full_text.clone()));

        self.decisions.pop_front().unwrap_or(Decision::Keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn records() -> (EventRecord, EventRecord) {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let venue = Some("bowery ballroom".to_string());

        (
            EventRecord::new(date, venue.clone(), Some(1260), "mine\n\t       at Bowery".to_string()),
            EventRecord::new(date, venue, Some(1230), "live at Bowery".to_string()),
        )
    }

    fn ask_with(input: &str) -> (Decision, String) {
        let (local, live) = records();
        let mut prompter = TerminalPrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());

        let decision = prompter.ask(&local, &live);
        let output = String::from_utf8(prompter.into_output()).unwrap();

        (decision, output)
    }

    #[test_log::test]
    fn should_show_both_listings() {
        let (_, output) = ask_with("n\n");

        assert!(output.contains("YOUR: mine\n\t       at Bowery"));
        assert!(output.contains("LIVE: live at Bowery"));
    }

    #[test_log::test]
    fn should_map_single_letter_choices() {
        assert_eq!(ask_with("y\n").0, Decision::Omit);
        assert_eq!(ask_with("Y\n").0, Decision::Omit);
        assert_eq!(ask_with("n\n").0, Decision::Keep);
        assert_eq!(ask_with("m\n").0, Decision::MarkMultiple);
    }

    #[test_log::test]
    fn when_answer_is_blank_or_unknown_should_keep() {
        assert_eq!(ask_with("\n").0, Decision::Keep);
        assert_eq!(ask_with("what\n").0, Decision::Keep);
        assert_eq!(ask_with("").0, Decision::Keep);
    }

    #[test_log::test]
    fn edit_should_read_the_replacement_line() {
        let (decision, output) = ask_with("e\nmar 14 fri Band at Bowery 10pm\n");

        assert_eq!(
            decision,
            Decision::Edit("mar 14 fri Band at Bowery 10pm".to_string())
        );
        assert!(output.contains("Edit your listing"));
    }

    #[test_log::test]
    fn update_note_should_read_the_note() {
        let (decision, _) = ask_with("u\nnow 21+\n");

        assert_eq!(decision, Decision::Annotate("now 21+".to_string()));
    }

    #[test_log::test]
    fn scripted_prompter_should_keep_once_exhausted() {
        let (local, live) = records();
        let mut prompter = ScriptedPrompter::new([Decision::Omit]);

        assert_eq!(prompter.ask(&local, &live), Decision::Omit);
        assert_eq!(prompter.ask(&local, &live), Decision::Keep);
        assert_eq!(prompter.asked.len(), 2);
    }
}
