use clap::Parser;
use colored::*;
use dotenvy::dotenv;
use std::error::Error;

mod app;
mod cli;
mod logging;

use crate::cli::Args;
use crate::logging::{log_error, log_info};
use fitcoach_agent::CoachAgent;
use fitcoach_core::config::{get_default_config_file, CoachConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    // File config first, then environment overrides on top.
    let file_config = match &args.config {
        Some(path) => CoachConfig::load_from_file(path)?,
        None => match get_default_config_file("fitcoach") {
            Ok(path) if path.exists() => CoachConfig::load_from_file(&path)?,
            _ => CoachConfig::default(),
        },
    };
    let config = file_config.apply_env();

    if config.api_key.is_none() {
        eprintln!("{}", "❌ ERROR: OpenAI API key not found!".red().bold());
        eprintln!("\nPlease set up your API key:");
        eprintln!("1. Copy .env.example to .env");
        eprintln!("2. Get your API key from: https://platform.openai.com/api-keys");
        eprintln!("3. Add to .env file: OPENAI_API_KEY=sk-your-key-here");
        std::process::exit(1);
    }

    let mut agent = match CoachAgent::new(config) {
        Ok(agent) => agent,
        Err(e) => {
            log_error(&format!("failed to initialize the coach: {}", e));
            return Err(e.into());
        }
    };

    if let Some(path) = &args.session_file {
        agent.load_session(path)?;
        log_info(&format!("resumed session from {}", path.display()));
    }

    match args.prompt {
        Some(prompt) => app::run_single_query(&mut agent, prompt).await?,
        None => app::run_interactive(&mut agent).await?,
    }

    Ok(())
}
