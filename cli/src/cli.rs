use clap::Parser;
use std::path::PathBuf;

/// Console front end for the FitCoach assistant
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// A single question to ask instead of starting an interactive session
    #[arg(index = 1)]
    pub prompt: Option<String>,

    /// Path to a previously saved conversation to resume
    #[arg(short, long)]
    pub session_file: Option<PathBuf>,

    /// Path to a config file (defaults to the per-user config location)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
