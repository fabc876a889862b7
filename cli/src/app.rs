use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use fitcoach_agent::{CoachAgent, ProfileValue};

use crate::logging::{log_error, log_info};

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")
            .unwrap(),
    );
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

pub fn print_banner() {
    println!(
        "{}",
        "🏋️ FitCoach AI - Personal Fitness & Nutrition Assistant".bold()
    );
    println!("{}", "=".repeat(60));
    println!("Welcome! I'm your AI fitness coach.");
    println!("I can help you with:");
    println!("  • Body analysis (BMI, body fat %, measurements, transformation)");
    println!("  • Personalized meal plans and nutrition tracking");
    println!("  • Custom workout plans and progress analysis");
    println!("  • Running routes and gym locations");
    println!("  • Integration with Hevy, Strava, and health apps");
    println!("  • Export reports to PDF/Excel");
    println!("{}", "=".repeat(60));
    println!("\nType 'quit', 'exit', or 'bye' to end the conversation");
    println!("Type 'reset' to start a new conversation");
    println!("Type 'save' to save the current conversation");
    println!("{}", "-".repeat(60));
}

fn save_path(agent: &CoachAgent) -> PathBuf {
    let name = agent
        .session()
        .profile()
        .get("name")
        .and_then(|v| match v {
            ProfileValue::Str(s) => Some(s.as_str()),
            _ => None,
        })
        .unwrap_or("user");
    PathBuf::from(format!("data/users/conversation_{}.json", name))
}

/// Ask one question, print the answer, exit.
pub async fn run_single_query(agent: &mut CoachAgent, prompt: String) -> Result<()> {
    log_info(&format!("single query: {}", prompt));
    let spinner = spinner();
    match agent.handle(&prompt).await {
        Ok(response) => {
            spinner.finish_and_clear();
            println!("{}", response);
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            log_error(&format!("query failed: {}", e));
            Err(e).context("Failed to get a response from the coach")
        }
    }
}

/// The interactive conversation loop.
pub async fn run_interactive(agent: &mut CoachAgent) -> Result<()> {
    print_banner();

    loop {
        print!("\n{}: ", "You".green().bold());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }
        let input = input.trim();

        match input.to_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" | "bye" | "q" => {
                println!("\n👋 Goodbye! Keep crushing your fitness goals!");
                break;
            }
            "reset" => {
                agent.reset();
                println!("\n🔄 Conversation reset. Let's start fresh!");
                continue;
            }
            "save" => {
                let path = save_path(agent);
                match agent.save_session(&path) {
                    Ok(()) => println!("\n💾 Conversation saved to {}", path.display()),
                    Err(e) => log_error(&format!("save failed: {}", e)),
                }
                continue;
            }
            _ => {}
        }

        let spinner = spinner();
        match agent.handle(input).await {
            Ok(response) => {
                spinner.finish_and_clear();
                println!("\n{} {}", "🤖 FitCoach:".cyan().bold(), response);
            }
            Err(e) => {
                spinner.finish_and_clear();
                log_error(&format!("turn failed: {}", e));
                println!("Please try again or type 'quit' to exit");
            }
        }
    }

    Ok(())
}
