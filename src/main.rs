use clap::{ArgGroup, Parser, Subcommand};
use slist::config::env_loader::load_config;
use slist::config::model::Config;
use slist::dupes::matcher::LiveIndex;
use slist::error::{Result, SlistError};
use slist::listing::date::{format_header, today};
use slist::listing::dialect::{parse_listing, LiveDialect, MineDialect};
use slist::listing::future::filter_future_only;
use slist::live::api::{LiveListAPI, LiveSource};
use slist::logging::setup_logging;
use slist::reconcile::driver::{CancelToken, Outcome, Reconciler, INTERRUPTED_STATUS};
use slist::reconcile::output::render;
use slist::reconcile::prompt::{notify_tty, Prompter, TtyPrompter};
use slist::reconcile::recovery::SharedRecovery;
use slist::venues::registry::{add_venue, XmlVenueRegistry};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::signal;
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "slist")]
#[command(about = "Show list maintenance tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check your list against the live list and weed out duplicates
    Dupes(DupesArgs),
    /// Print a two-line list without the listings that already happened
    Future {
        /// Two-line list to filter
        path: PathBuf,
    },
    /// Print the list header (e.g. `mar 14 fri`) for a MM/DD date
    Date {
        /// Month and day, e.g. 3/14
        date: String,
    },
    /// Add a venue to the venue registry
    AddVenue {
        /// Full venue name
        ln: String,
        /// Short venue name, defaults to the full name
        pn: Option<String>,
        #[arg(long, env = "SLIST_VENUES")]
        venues: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("live").required(true).args(["live_cache", "live_url"])))]
struct DupesArgs {
    /// Your list, two lines per listing
    #[arg(long)]
    mylist: PathBuf,

    /// Live list saved to a file
    #[arg(long)]
    live_cache: Option<PathBuf>,

    /// Live list URL
    #[arg(long)]
    live_url: Option<String>,

    /// Venue registry, used for the `multiple` flag
    #[arg(long, env = "SLIST_VENUES")]
    venues: Option<PathBuf>,

    /// Do not prompt; keep every listing (still honors `multiple`)
    #[arg(long)]
    non_interactive: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_config();
    let debug = config.as_ref().map(|config| config.debug).unwrap_or(false);

    let loki = setup_logging(debug).await;

    let result = match config {
        Ok(config) => run(cli.command, config).await,
        Err(err) => Err(err),
    };

    let code = result.unwrap_or_else(|err| {
        error!("{}", err);
        ExitCode::FAILURE
    });

    if let Some((controller, handle)) = loki {
        controller.shutdown().await;
        let _ = handle.await;
    }

    code
}

async fn run(command: Command, config: Config) -> Result<ExitCode> {
    match command {
        Command::Dupes(args) => run_dupes(args, config).await,
        Command::Future { path } => run_future(&path).await,
        Command::Date { date } => Ok(run_date(&date)),
        Command::AddVenue { ln, pn, venues } => {
            let pn = pn.filter(|pn| !pn.trim().is_empty()).unwrap_or_else(|| ln.clone());
            add_venue(&venues, &ln, &pn)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn read_local(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SlistError::LocalUnreadable {
            path: path.to_path_buf(),
            source,
        })
}

async fn run_dupes(args: DupesArgs, config: Config) -> Result<ExitCode> {
    let live_source = match (args.live_cache, args.live_url) {
        (Some(path), _) => LiveSource::Cache(path),
        (None, Some(url)) => LiveSource::Url(url),
        (None, None) => {
            return Err(SlistError::Config {
                name: "live".to_string(),
                reason: "Provide --live-cache or --live-url".to_string(),
            })
        }
    };
    let today = today();

    info!("Parsing live list…");
    let live_text = LiveListAPI::fetch(&live_source, config.fetch_timeout).await?;
    let live = parse_listing(&LiveDialect::new(today), &live_text);
    info!("Parsed {} live entries.", live.len());

    info!("Parsing mylist…");
    let my_text = read_local(&args.mylist).await?;
    let local = parse_listing(&MineDialect::new(today), &my_text);
    info!("Parsed {} local entries.", local.len());

    let mut registry = XmlVenueRegistry::load(args.venues.as_deref());
    let index = LiveIndex::new(live);

    let mut prompter = if args.non_interactive {
        None
    } else {
        let prompter = TtyPrompter::open();
        if prompter.is_none() {
            warn!("No TTY available; running non-interactive.");
        }
        prompter
    };

    let cancel = CancelToken::new();
    let recovery = SharedRecovery::arm(&config.recovery_dir);
    tokio::spawn(watch_interrupts(cancel.clone(), recovery.clone()));

    let outcome = tokio::task::spawn_blocking(move || {
        let prompter = prompter
            .as_mut()
            .map(|prompter| prompter as &mut dyn Prompter);

        Reconciler::new(&index, &mut registry, prompter).run_with_recovery(local, &cancel, &recovery)
    })
    .await
    .map_err(|err| SlistError::Io(io::Error::other(err)))?;

    let status = outcome.exit_status();
    match outcome {
        Outcome::Completed { kept, .. } => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(render(&kept).as_bytes())?;
            stdout.flush()?;
        }
        Outcome::Interrupted { recovery_file, .. } => report_recovery(recovery_file),
    }

    Ok(ExitCode::from(status))
}

fn report_recovery(recovery_file: Option<PathBuf>) {
    match recovery_file {
        Some(path) => warn!("Partial list written to {}", path.display()),
        None => error!("Interrupted and no partial list could be written"),
    }
}

/// First Ctrl-C stops the loop after the current listing. A second one, e.g.
/// while a prompt is still waiting, writes the recovery file and exits.
async fn watch_interrupts(cancel: CancelToken, recovery: SharedRecovery) {
    if signal::ctrl_c().await.is_err() {
        return;
    }

    let hint = "Interrupted. Finishing the current listing (press Enter if a prompt is waiting, Ctrl-C again to quit now)";
    warn!("{}", hint);
    if let Err(err) = notify_tty(hint) {
        debug!("Could not write to the terminal: {}", err);
    }
    cancel.cancel();

    if signal::ctrl_c().await.is_err() {
        return;
    }

    report_recovery(recovery.flush());
    std::process::exit(INTERRUPTED_STATUS.into());
}

async fn run_future(path: &Path) -> Result<ExitCode> {
    let text = read_local(path).await?;

    let lines: Vec<String> = filter_future_only(&text, today())
        .into_iter()
        .flatten()
        .collect();

    let mut stdout = io::stdout().lock();
    for line in lines {
        writeln!(stdout, "{}", line)?;
    }
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}

fn run_date(date: &str) -> ExitCode {
    let header = date.split_once('/').and_then(|(month, day)| {
        let month: u32 = month.trim().parse().ok()?;
        let day: u32 = day.trim().parse().ok()?;

        format_header(month, day, today())
    });

    match header {
        Some(header) => {
            print!("{}", header);
            let _ = io::stdout().flush();
            ExitCode::SUCCESS
        }
        None => {
            error!("Invalid date input");
            ExitCode::FAILURE
        }
    }
}
