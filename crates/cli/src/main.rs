//! Recite CLI: vocabulary drills, synonym pages and dictation.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use recite_core::audio::playback::Player;
use recite_core::clock;
use recite_core::config::{self, Properties};
use recite_core::dictation::Examiner;
use recite_core::lesson::{Lesson, Voice};
use recite_core::segment::Sentence;
use recite_core::synonym::{SynonymBook, SynonymDictionary, SynonymPage};
use recite_core::term::{self, Color, Console};
use recite_core::tts::{get_speaker, Speaker};

// ─── Top-level CLI ───────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "recite",
    about = "Vocabulary study drills and dictionary-page tools",
    version,
)]
struct Cli {
    /// Property file with paths and engine settings
    #[arg(long, global = true, default_value = "config.ini")]
    config: PathBuf,

    /// Show verbose output
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// RNG seed for reproducible drills
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pick a lesson and study or test it
    Lesson,
    /// Study synonym pages, or export them as JSON
    Synonym(SynonymArgs),
    /// Parse scanned synonym pages into chapter CSV files
    Parse(ParseArgs),
    /// Print how each line of a file splits into expression and explanation
    Refine(RefineArgs),
    /// Number and post-code dictation
    Spell,
}

#[derive(Parser, Debug)]
struct SynonymArgs {
    /// Write every chapter to this JSON file instead of studying
    save_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ParseArgs {
    /// Parse a single page (default: every changed page under synonym-path)
    path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RefineArgs {
    /// Text file to split (default: stdin)
    file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // Init logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Lesson => run_lesson(&cli.config, cli.seed),
        Command::Synonym(ref args) => run_synonym(&cli.config, cli.seed, args),
        Command::Parse(ref args) => run_parse(&cli.config, args),
        Command::Refine(ref args) => run_refine(args),
        Command::Spell => run_spell(&cli.config, cli.seed),
    };

    if let Err(e) = result {
        log::error!("Error occurs at {}: {:#}", clock::now_string(), e);
        std::process::exit(1);
    }
}

// ─── Shared helpers ──────────────────────────────────────────────

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn player(props: &Properties) -> Player {
    Player::from_name(props.get_or(config::PLAYER, ""))
}

/// Speech engine named by `tts-engine` (default `local`).
fn make_speaker(props: &Properties) -> Result<Box<dyn Speaker>> {
    let engine = props.get_or(config::TTS_ENGINE, "local");
    let tts_config = props.get(config::TTS_CONFIG).map(Path::new);
    let cache_dir = Path::new(props.get_or(config::OUTPUT_PATH, "data")).join("tts");
    log::debug!("TTS engine: {}", engine);
    get_speaker(engine, tts_config, player(props), &cache_dir)
}

fn greet() {
    term::clear_screen();
    term::show(Color::Green, format!("Now: {}", clock::now_string()));
}

// ─── Lesson ──────────────────────────────────────────────────────

fn run_lesson(config_path: &Path, seed: Option<u64>) -> Result<()> {
    let mut props = Properties::load(config_path)?;
    let source = props.require_path(config::SOURCE_PATH)?;
    let output = props.require_path(config::OUTPUT_PATH)?;

    let mut speaker = make_speaker(&props)?;
    let mut voice = Voice::new(speaker.as_mut(), player(&props));
    let console = Console::stdin();
    let mut rng = make_rng(seed);

    greet();
    Lesson::new(&source, &output, &console).start(&mut props, &mut voice, &mut rng)
}

// ─── Synonym ─────────────────────────────────────────────────────

fn run_synonym(config_path: &Path, seed: Option<u64>, args: &SynonymArgs) -> Result<()> {
    let props = Properties::load(config_path)?;
    let synonym_dir = props.require_path(config::SYNONYM_PATH)?;
    let book = SynonymBook::load(&synonym_dir)?;

    if let Some(save_path) = &args.save_path {
        let audio_dir = props.require_path(config::AUDIO_CONFIG_DIR)?;
        let index = audio_dir.join(props.require(config::AUDIO_CONFIG_FILE_NAME)?);
        return book
            .save_to_file(save_path, &audio_dir, &index)
            .with_context(|| format!("Failed to export {}", synonym_dir.display()));
    }

    let mut speaker = make_speaker(&props)?;
    let console = Console::stdin();
    greet();
    book.study(&console, speaker.as_mut(), make_rng(seed))
}

// ─── Parse / refine ──────────────────────────────────────────────

fn run_parse(config_path: &Path, args: &ParseArgs) -> Result<()> {
    term::show(Color::Green, format!("Now: {}", clock::now_string()));

    if let Some(path) = &args.path {
        SynonymPage::read(path, None)?;
        return Ok(());
    }

    let props = Properties::load(config_path)?;
    let synonym_dir = props.require_path(config::SYNONYM_PATH)?;
    let mut dictionary = SynonymDictionary::load(&synonym_dir)?;
    dictionary.parse()?;
    Ok(())
}

fn run_refine(args: &RefineArgs) -> Result<()> {
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    let sentence = Sentence::default();
    for line in text.lines() {
        let (expression, explanation) = sentence.refine(line);
        match explanation {
            Some(explanation) => println!("{:?}\t{:?}", expression, explanation),
            None => println!("{:?}", expression),
        }
    }
    Ok(())
}

// ─── Spell ───────────────────────────────────────────────────────

fn run_spell(config_path: &Path, seed: Option<u64>) -> Result<()> {
    let props = Properties::load(config_path)?;
    let mut speaker = make_speaker(&props)?;
    let console = Console::stdin();

    greet();
    Examiner::new(&console, speaker.as_mut(), make_rng(seed))?.run()?;
    Ok(())
}
