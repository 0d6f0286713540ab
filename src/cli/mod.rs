//! CLI Module
//!
//! Command-line interface for the Arithmusic composition editor core.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Arithmusic - composition editor and synthesis driver
#[derive(Parser, Debug)]
#[command(name = "arithmusic")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a seed composition project file
    #[command(name = "demo")]
    Demo {
        /// Path for the new project file
        path: PathBuf,
    },

    /// Validate a project file's composition
    #[command(name = "validate")]
    Validate {
        /// Path to the project file
        path: PathBuf,
    },

    /// Render a project to a WAV file
    #[command(name = "render")]
    Render {
        /// Path to the project file
        path: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render spectral data for a project and print its shape
    #[command(name = "spectrogram")]
    Spectrogram {
        /// Path to the project file
        path: PathBuf,
    },

    /// Print a summary of a project file
    #[command(name = "info")]
    Info {
        /// Path to the project file
        path: PathBuf,
    },
}
