//! moodtrack - train note models on MIDI files and generate mood-adaptive tracks
//!
//! Subcommands:
//! - `moodtrack inspect <dir>` - Summarize the MIDI files in a directory
//! - `moodtrack extract <dir> --out notes.json` - Dump the pitch corpus as JSON
//! - `moodtrack train --arch <note|conditioned|pitch>` - Train and save a model
//! - `moodtrack generate --arch <...> --mood <...>` - Generate a MIDI file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use moodtrack::midi::ParsedMidiFile;
use moodtrack::prelude::*;
use moodtrack::read_pitches_json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "moodtrack")]
#[command(about = "Mood-adaptive game music from LSTM note models")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Never use the GPU
    #[arg(long, global = true)]
    cpu: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the MIDI files in a directory
    Inspect {
        /// Directory of .mid/.midi files
        dir: PathBuf,
    },

    /// Write the melodic pitch corpus of a directory as a JSON array
    Extract {
        /// Directory of .mid/.midi files
        dir: PathBuf,

        #[arg(short, long, default_value = "notes.json")]
        out: PathBuf,
    },

    /// Train a model and save its checkpoint
    Train {
        #[arg(short, long, value_enum)]
        arch: Arch,

        /// MIDI directory (overrides data.midi_dir)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Pitch corpus JSON from `extract` (pitch model only)
        #[arg(long)]
        notes: Option<PathBuf>,

        /// Number of epochs (overrides train.epochs)
        #[arg(short, long)]
        epochs: Option<usize>,
    },

    /// Generate a MIDI file from a trained model
    Generate {
        #[arg(short, long, value_enum)]
        arch: Arch,

        /// calm, happy, tense, battle or exploration (overrides generate.mood)
        #[arg(short, long)]
        mood: Option<Mood>,

        /// Condition schedule for the conditioned model
        #[arg(long, value_enum, default_value = "mood")]
        schedule: Schedule,

        /// Number of generated steps (overrides generate.steps)
        #[arg(short, long)]
        steps: Option<usize>,

        /// Seed pitches come from this JSON corpus instead of data.midi_dir
        #[arg(long)]
        notes: Option<PathBuf>,

        /// Output file (default: <output_dir>/adaptive_<mood>.mid)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Arch {
    Note,
    Conditioned,
    Pitch,
}

#[derive(Clone, Copy, ValueEnum)]
enum Schedule {
    /// Hold the mood's condition vector for every step
    Mood,
    /// Calm, then battle, then exploration
    ThreeAct,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => MoodtrackConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MoodtrackConfig::default(),
    };

    match cli.command {
        Commands::Inspect { dir } => inspect(dir)?,
        Commands::Extract { dir, out } => {
            let corpus = Corpus::load(&dir)?;
            let count = corpus.write_pitches_json(&out)?;
            info!("Saved {} pitches to {}", count, out.display());
        }
        Commands::Train {
            arch,
            data,
            notes,
            epochs,
        } => {
            if let Some(dir) = data {
                config.data.midi_dir = dir;
            }
            if let Some(epochs) = epochs {
                config.train.epochs = epochs;
            }
            let session = session(config, cli.cpu)?;

            let report = match (arch, notes) {
                (Arch::Pitch, Some(path)) => {
                    session.train_pitch_lstm(&read_pitches_json(&path)?)?
                }
                (Arch::Pitch, None) => {
                    session.train_pitch_lstm(&session.load_corpus()?.pitches())?
                }
                (Arch::Note, _) => session.train_note_rnn(&session.load_corpus()?)?,
                (Arch::Conditioned, _) => session.train_conditioned(&session.load_corpus()?)?,
            };

            if let Some(loss) = report.final_loss() {
                info!("Final loss: {:.4}", loss);
            }
        }
        Commands::Generate {
            arch,
            mood,
            schedule,
            steps,
            notes,
            out,
        } => {
            if let Some(mood) = mood {
                config.generate.mood = mood;
            }
            if let Some(steps) = steps {
                config.generate.steps = steps;
            }
            let session = session(config, cli.cpu)?;
            let mood = session.mood();
            let out = out.unwrap_or_else(|| {
                session
                    .config()
                    .generate
                    .output_dir
                    .join(format!("adaptive_{mood}.mid"))
            });

            match arch {
                Arch::Note => {
                    let notes = session.generate_notes(None)?;
                    session.write_notes(&notes, &out)?;
                }
                Arch::Conditioned => {
                    let steps = session.config().generate.steps;
                    let schedule = match schedule {
                        Schedule::Mood => ConditionSchedule::constant(mood.condition(), steps),
                        Schedule::ThreeAct => ConditionSchedule::three_act(steps),
                    };
                    let notes = session.generate_conditioned(&schedule, None)?;
                    session.write_notes(&notes, &out)?;
                }
                Arch::Pitch => {
                    let seed = match notes {
                        Some(path) => read_pitches_json(&path)?,
                        None => session.load_corpus()?.pitches(),
                    };
                    let pitches = session.generate_pitches(&seed)?;
                    session.write_pitches(&pitches, &out)?;
                }
            }

            info!("Adaptive {} soundtrack saved as {}", mood, out.display());
        }
    }

    Ok(())
}

fn session(config: MoodtrackConfig, cpu: bool) -> Result<Session> {
    let mut builder = Session::builder().config(config);
    if cpu {
        builder = builder.placement(DevicePlacement::Cpu);
    }
    Ok(builder.build()?)
}

fn inspect(dir: PathBuf) -> Result<()> {
    let corpus = Corpus::load(&dir)?;

    for loaded in corpus.files() {
        let ParsedMidiFile {
            notes,
            tempo_bpm,
            duration_seconds,
            track_count,
            ..
        } = &loaded.file;
        println!(
            "{}: {} notes, {} tracks, {:.1} BPM, {:.1}s",
            loaded.path.display(),
            notes.len(),
            track_count,
            tempo_bpm,
            duration_seconds
        );
    }

    let vocab = corpus.vocabulary();
    println!(
        "{} files, {} melodic notes, {} distinct pitches",
        corpus.len(),
        corpus.note_count(),
        vocab.len()
    );
    if let (Some(low), Some(high)) = (vocab.pitches().first(), vocab.pitches().last()) {
        println!("Pitch range: {}-{}", low, high);
    }
    Ok(())
}
