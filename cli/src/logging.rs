use colored::*;
use std::env;

// Simple logging functions layered over the console output.

pub fn log_info(message: &str) {
    if env::var("FITCOACH_DEBUG").is_ok() {
        eprintln!("{} {}", "[INFO]".cyan(), message);
    }
}

pub fn log_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
