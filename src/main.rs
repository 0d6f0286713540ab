//! Arithmusic CLI - Composition Editor Core
//!
//! Command-line driver for the Arithmusic composition core and the
//! reference synthesis engine.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use arithmusic::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Exactly one logging backend registers with `log`. The tracing
    // subscriber forwards `log` records too, so installing both would
    // panic on the second registration.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("arithmusic=debug")
            .init();
    } else {
        env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    }

    info!("Arithmusic v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Arithmusic v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Demo { path } => commands::demo(&path)?,
        Commands::Validate { path } => commands::check(&path)?,
        Commands::Render { path, output } => commands::render(&path, &output)?,
        Commands::Spectrogram { path } => commands::spectrogram(&path)?,
        Commands::Info { path } => commands::show_info(&path)?,
    }
    Ok(())
}
