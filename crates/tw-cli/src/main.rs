//! Headless command-line driver for the Tiefenwelt simulation kernel.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tw",
    about = "Tiefenwelt: layered tile-world simulation",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a world and run it for a number of ticks
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "100")]
        ticks: u64,

        /// RNG seed for deterministic generation and ticking
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Level edge length in tiles (default: 128)
        #[arg(long)]
        size: Option<i32>,

        /// Difficulty: Peaceful, Easy, Normal or Hard
        #[arg(short, long, default_value = "Normal")]
        difficulty: String,

        /// Depth the player starts on (2 = The Void, -4 = Dungeon)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        depth: i32,

        /// Write a snapshot of the player's level to this file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Show every event and debug logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Load a level snapshot and summarise it
    Inspect {
        /// Snapshot file written by `tw simulate --save`
        file: PathBuf,
    },

    /// Print the tile catalogue
    Tiles,
}

impl Commands {
    fn verbose(&self) -> bool {
        matches!(self, Commands::Simulate { verbose: true, .. })
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.command.verbose() { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let result = match cli.command {
        Commands::Simulate {
            ticks,
            seed,
            size,
            difficulty,
            depth,
            save,
            verbose,
        } => commands::simulate::run(&commands::simulate::Options {
            ticks,
            seed,
            size,
            difficulty,
            depth,
            save,
            verbose,
        }),
        Commands::Inspect { file } => commands::inspect::run(&file),
        Commands::Tiles => commands::tiles::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
