//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vocary")]
#[command(about = "Terminal client for the vocary voice-analysis service", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Mode,

    /// Override the analysis service base URL from the config file
    #[arg(long, value_name = "URL", global = true)]
    pub api_base: Option<String>,

    /// Disable the decorative background and alternate screen
    #[arg(long, global = true)]
    pub plain: bool,
}

/// One subcommand per analysis mode; each configures the same workflow
/// with a different slot layout and endpoint.
#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Compare your voice against a reference song
    Similarity {
        /// Reference song file
        #[arg(long, value_name = "FILE")]
        song: Option<PathBuf>,

        /// Your take (or record one with the microphone)
        #[arg(long, value_name = "FILE")]
        user: Option<PathBuf>,
    },
    /// Analyze pitch: contour, note distribution, vibrato
    Pitch {
        /// Audio to analyze (or record with the microphone)
        #[arg(long, value_name = "FILE")]
        audio: Option<PathBuf>,
    },
    /// Analyze timbre: formants, brightness, voice type
    Timbre {
        /// Audio to analyze (or record with the microphone)
        #[arg(long, value_name = "FILE")]
        audio: Option<PathBuf>,
    },
}
