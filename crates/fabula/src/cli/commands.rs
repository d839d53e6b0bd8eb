//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fabula - turn a story prompt into a synchronized playback manifest
#[derive(Parser, Debug)]
#[command(name = "fabula")]
#[command(about = "Turn a story prompt into a synchronized playback manifest", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a story and write its manifest
    Generate {
        /// Story prompt
        prompt: String,

        /// User the story is generated for
        #[arg(long, default_value = "cli")]
        user: String,

        /// Configuration file (defaults to the layered fabula.toml lookup)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the manifest here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop failed scenes instead of failing the story
        #[arg(long)]
        best_effort: bool,
    },

    /// Print how a narrative text file splits into scenes
    Segment {
        /// Narrative text file
        narrative: PathBuf,

        /// Upper bound on scenes
        #[arg(long, default_value = "6")]
        max_scenes: usize,
    },

    /// Check a manifest file against the synchronization contract
    Validate {
        /// Manifest JSON file
        manifest: PathBuf,
    },

    /// Replay a manifest on the local device runtime
    Play {
        /// Manifest JSON file
        manifest: PathBuf,

        /// Configuration file (defaults to the layered fabula.toml lookup)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
