use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::tty::IsTty;
use spell_gym::{
    config::{CliOverrides, Config, ConfigStore, FileConfigStore, Settings},
    drill::Drill,
    error::DrillError,
    runtime::CrosstermKeySource,
    speech::SpeechOutput,
    word_source,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing_subscriber::EnvFilter;

/// spoken spelling drills in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Hear a word, type it without seeing it (every key is spoken back), and get scored. Backspace wipes your attempt and replays the word."
)]
pub struct Cli {
    /// number of words in the session (default 10)
    #[clap(allow_negative_numbers = true)]
    count: Option<String>,

    /// directory of .txt word lists, one word per line
    #[clap(short = 'l', long)]
    lists: Option<PathBuf>,

    /// run the drill without audio
    #[clap(long)]
    mute: bool,

    /// save the resolved settings as defaults and exit
    #[clap(long)]
    write_config: bool,

    /// log phase transitions and speech fallbacks
    #[clap(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            count: self.count.clone(),
            lists: self.lists.clone(),
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

/// Setup errors go through clap's formatter; anything later aborts the session.
fn fail(err: DrillError) -> ! {
    if !err.is_setup() {
        eprintln!("session aborted: {err}");
        process::exit(1);
    }
    let kind = match err {
        DrillError::NotInteractive => ErrorKind::Io,
        _ => ErrorKind::ValueValidation,
    };
    Cli::command().error(kind, err).exit()
}

/// Ctrl-C outside raw mode arrives as SIGINT; turn it into a flag the drill polls.
fn interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = flag.clone();
    if let Err(err) = ctrlc::set_handler(move || raised.store(true, Ordering::SeqCst)) {
        tracing::warn!("cannot install Ctrl-C handler: {err}");
    }
    flag
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = FileConfigStore::new();
    let settings = Settings::resolve(&cli.overrides(), |k| std::env::var(k).ok(), &store.load());
    tracing::debug!(?settings, "resolved settings");

    if cli.write_config {
        store.save(&Config::from(&settings))?;
        println!("wrote {}", store.path().display());
        return Ok(());
    }

    let words = word_source::sample(settings.rounds, &settings.lists_dir).unwrap_or_else(|err| fail(err));

    if !stdin().is_tty() {
        fail(DrillError::NotInteractive);
    }

    let speech = if cli.mute {
        SpeechOutput::silent()
    } else {
        SpeechOutput::init(&settings.speech)
    };

    let mut drill = Drill::new(CrosstermKeySource::new(), speech, io::stdout()).with_interrupt(interrupt_flag());
    let outcome = drill.run(&words).map(|_| ());

    match outcome {
        Ok(()) => Ok(()),
        Err(DrillError::Interrupted) => {
            drill.report_interrupted()?;
            Ok(())
        }
        Err(err) => fail(err),
    }
}
