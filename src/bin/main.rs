/// CLI tool for the daily verse engine
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use daily_verse::config::{self, ConfigOverrides, VerseConfig};
use daily_verse::loader::{FileSource, LoadOrigin, VerseLoader, VerseSource};
use daily_verse::{diagnostic, share, FileStore, PolicyMode, VerseCollection, VerseError};
use daily_verse::{VerseRecord, VerseSession};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing_subscriber::EnvFilter;

const NO_VERSES_MESSAGE: &str =
    "Could not load verses. Check the verse file path or configure a fallback payload.";

#[derive(Debug, Parser)]
#[command(name = "verse", version, about = "Show the verse of the day")]
struct Cli {
    /// Additional configuration file (must exist)
    #[arg(long = "config", global = true)]
    config: Vec<PathBuf>,

    /// Skip the default configuration files
    #[arg(long, global = true)]
    no_config: bool,

    /// Primary verse payload (JSON array)
    #[arg(long, global = true)]
    verses: Option<PathBuf>,

    /// Fallback verse payload used when the primary cannot be read
    #[arg(long, global = true)]
    embedded: Option<PathBuf>,

    /// State file holding settings and shuffle progress
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Evaluate as of this UTC date (YYYY-MM-DD) instead of now
    #[arg(long, global = true, value_parser = parse_date)]
    date: Option<OffsetDateTime>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the verse picked by the stored policy (default)
    Today,
    /// Show the verse after the one `today` would pick; nothing is stored
    Next {
        /// How many verses to step forward
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Store a new policy mode and show its pick
    Mode {
        /// rotation, seeded, random, shuffle or yearly
        mode: String,
    },
    /// Show or toggle the stored theme
    Theme {
        #[arg(long)]
        toggle: bool,
    },
    /// Print the verse `today` would pick as share text; nothing is stored
    Share {
        /// Print a WhatsApp share link instead
        #[arg(long)]
        url: bool,
    },
    /// Forget the shuffle order so the next shuffle starts fresh
    ShuffleReset,
    /// Print the effective configuration
    Config,
}

fn parse_date(value: &str) -> Result<OffsetDateTime, String> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("VERSE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_verse(verse: &VerseRecord) {
    println!("{}", verse.text);
    println!("— {}", verse.reference);
    if !verse.reflection.is_empty() {
        println!();
        println!("{}", verse.reflection);
    }
}

/// Print an annotated report for a payload file that failed to parse
fn explain_payload(path: &Path) {
    let Ok(source) = std::fs::read_to_string(path) else {
        return;
    };
    if let Err(e) = VerseCollection::from_json(&source) {
        let name = path.display().to_string();
        eprint!("{}", diagnostic::report_load_error(&name, &source, &e));
    }
}

async fn open_session(config: &VerseConfig) -> Result<VerseSession<FileStore, StdRng>> {
    let mut loader = VerseLoader::new(Arc::new(FileSource::new(config.verses.clone())));
    if let Some(embedded) = &config.embedded {
        let fallback: Arc<dyn VerseSource> = Arc::new(FileSource::new(embedded.clone()));
        loader = loader.with_fallback(fallback);
    }

    let outcome = match loader.load().await {
        Ok(outcome) => outcome,
        Err(VerseError::NoVerses) => {
            explain_payload(&config.verses);
            if let Some(embedded) = &config.embedded {
                explain_payload(embedded);
            }
            eprintln!("{}", NO_VERSES_MESSAGE);
            process::exit(1);
        }
        Err(e) => bail!(e),
    };
    if let LoadOrigin::Fallback(reason) = &outcome.origin {
        eprintln!("warning: {}; using fallback verses", reason);
        explain_payload(&config.verses);
    }

    let store = FileStore::new(config.state.clone());
    Ok(VerseSession::new(
        outcome.verses,
        store,
        StdRng::from_entropy(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        config_files: cli.config.clone(),
        no_config: cli.no_config,
        verses: cli.verses.clone(),
        embedded: cli.embedded.clone(),
        state: cli.state.clone(),
    };
    let config = config::load(&overrides)?;
    let now = cli.date.unwrap_or_else(OffsetDateTime::now_utc);

    let command = cli.command.unwrap_or(Command::Today);
    if let Command::Config = command {
        config.print_summary();
        return Ok(());
    }

    let mut session = open_session(&config).await?;
    match command {
        Command::Today => {
            session.select(now)?;
            print_verse(session.current());
        }
        Command::Next { count } => {
            session.peek(now)?;
            for _ in 0..count {
                session.next();
            }
            print_verse(session.current());
        }
        Command::Mode { mode } => {
            let mode = PolicyMode::from(mode);
            if let PolicyMode::Other(name) = &mode {
                eprintln!("warning: unknown mode '{}', it behaves like rotation", name);
            }
            session.change_mode(mode, now)?;
            print_verse(session.current());
        }
        Command::Theme { toggle } => {
            let theme = if toggle {
                session
                    .toggle_theme()
                    .context("failed to store the theme")?
            } else {
                session.settings().theme
            };
            println!("{}", theme);
        }
        Command::Share { url } => {
            session.peek(now)?;
            if url {
                println!("{}", share::whatsapp_url(session.current())?);
            } else {
                println!("{}", share::share_text(session.current()));
            }
        }
        Command::ShuffleReset => {
            session
                .reset_shuffle()
                .context("failed to clear the shuffle order")?;
            println!("shuffle order cleared");
        }
        Command::Config => {}
    }

    Ok(())
}
