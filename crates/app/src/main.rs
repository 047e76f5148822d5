use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use lanebeat_core::{
    storage::slot_overview, FileSlots, GameConfig, InputScript, LanebeatError, PlaySession,
    PlayStatus, Recorder, RenderFrame, Renderer, SlotStorage,
};
use tracing_subscriber::EnvFilter;

fn main() -> lanebeat_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.storage.directory = dir;
    }
    let storage = FileSlots::new(&config.storage.directory, config.storage.slot_count);

    match cli.command {
        Commands::Record { slot, input } => run_record(&config, &storage, slot, &input),
        Commands::Play { slot, input } => run_play(&config, &storage, slot, &input),
        Commands::Scores => {
            show_scores(&storage);
            Ok(())
        }
    }
}

fn run_record(
    config: &GameConfig,
    storage: &FileSlots,
    slot: u8,
    input: &Path,
) -> lanebeat_core::Result<()> {
    let slot = storage.slot(slot)?;
    tracing::info!(%slot, ?input, "recording");

    let mut recorder = Recorder::new(config);
    // Capture has no natural end, so a script without an exit stops after
    // its last press.
    let mut source = load_script(input)?.exit_after_last_press().into_source();
    recorder.run(&mut source, &mut TraceRenderer)?;

    match recorder.save(storage, slot) {
        Ok(()) => println!(
            "Saved {} notes to slot {slot}, best score reset.",
            recorder.store().len()
        ),
        Err(err) => tracing::warn!(%slot, error = %err, "recording was not saved"),
    }
    Ok(())
}

fn run_play(
    config: &GameConfig,
    storage: &FileSlots,
    slot: u8,
    input: &Path,
) -> lanebeat_core::Result<()> {
    let slot = storage.slot(slot)?;
    let mut session = match PlaySession::load(storage, slot, config) {
        Ok(session) => session,
        Err(LanebeatError::SlotEmpty(slot)) => {
            println!("Slot {slot} is empty!");
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    tracing::info!(%slot, notes = session.store().len(), "playing");

    session.run(&mut load_script(input)?.into_source(), &mut TraceRenderer)?;
    let outcome = session.finish(storage);

    match outcome.status {
        PlayStatus::Cancelled => println!("Cancelled at score {}.", outcome.score),
        _ if outcome.new_record => println!("NEW HIGH SCORE! Final score: {}", outcome.score),
        _ => println!(
            "Song finished. Final score: {} (best {})",
            outcome.score, outcome.best_score
        ),
    }
    Ok(())
}

fn show_scores(storage: &FileSlots) {
    println!("--- HIGH SCORES ---");
    for summary in slot_overview(storage) {
        match summary.best_score {
            Some(score) => println!("Slot {}: {score}", summary.slot),
            None => println!("Slot {}: ---", summary.slot),
        }
    }
}

fn load_script(path: &Path) -> lanebeat_core::Result<InputScript> {
    let raw = std::fs::read_to_string(path)?;
    InputScript::from_json(&raw)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Headless display: one trace event per frame.
struct TraceRenderer;

impl Renderer for TraceRenderer {
    fn present(&mut self, frame: &RenderFrame<'_>) -> lanebeat_core::Result<()> {
        tracing::trace!(
            mode = ?frame.mode,
            clock = frame.clock,
            score = frame.score,
            best = frame.best_score,
            notes = frame.visible_notes().count(),
            effects = frame.effects().count(),
            status = frame.status,
            "frame"
        );
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Five-lane rhythm game", long_about = None)]
struct Cli {
    /// JSON file overriding the default game settings.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the song slots.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a new song into a slot from an input script.
    Record {
        #[arg(short, long)]
        slot: u8,
        /// Input script with the presses to record.
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Play a stored song against an input script.
    Play {
        #[arg(short, long)]
        slot: u8,
        #[arg(short, long)]
        input: PathBuf,
    },
    /// List the best score of every slot.
    Scores,
}
