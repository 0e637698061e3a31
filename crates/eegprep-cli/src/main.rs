//! eegprep - batch EEG dataset preparation
//!
//! Walks a subject directory tree, windows and labels every recording,
//! and turns the persisted slices into per-subject feature datasets.

mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eegprep", about = "EEG seizure dataset preparation pipeline")]
struct Cli {
    /// Optional pipeline configuration JSON (defaults are used otherwise)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Restrict processing to these subjects (default: all found)
    #[arg(long, global = true)]
    subject: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Window, label, and normalize raw recordings into slice files
    Preprocess {
        /// Directory tree with one sub-directory per subject
        #[arg(long)]
        data_dir: PathBuf,
        /// Where slice files are written
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Extract per-window features from persisted slices
    Features {
        /// Directory holding per-subject slice files
        #[arg(long)]
        slices_dir: PathBuf,
        /// Where feature datasets are written
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Preprocess then extract features in one pass
    Run {
        #[arg(long)]
        data_dir: PathBuf,
        /// Intermediate slice directory
        #[arg(long)]
        slices_dir: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Report shapes and label counts of persisted slices
    Inspect {
        #[arg(long)]
        slices_dir: PathBuf,
    },
    /// Write a synthetic subject tree for smoke testing
    Synth {
        #[arg(long)]
        out_dir: PathBuf,
        /// Subject identifier to create
        #[arg(long, default_value = "sim01")]
        subject: String,
        /// Recording duration in seconds
        #[arg(long, default_value_t = 600)]
        duration: u64,
        /// Channels to generate
        #[arg(long, default_value_t = 23)]
        channels: usize,
        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = run::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Preprocess { data_dir, out_dir } => {
            run::preprocess(&config, &data_dir, &out_dir, &cli.subject)?;
        }
        Command::Features {
            slices_dir,
            out_dir,
        } => {
            run::extract_features(&config, &slices_dir, &out_dir, &cli.subject)?;
        }
        Command::Run {
            data_dir,
            slices_dir,
            out_dir,
        } => {
            run::preprocess(&config, &data_dir, &slices_dir, &cli.subject)?;
            run::extract_features(&config, &slices_dir, &out_dir, &cli.subject)?;
        }
        Command::Inspect { slices_dir } => {
            run::inspect(&slices_dir, &cli.subject)?;
        }
        Command::Synth {
            out_dir,
            subject,
            duration,
            channels,
            seed,
        } => {
            run::synthesize_subject(&out_dir, &subject, duration, channels, seed)?;
        }
    }

    Ok(())
}
