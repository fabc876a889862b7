use clap::Parser;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod http;

use fitcoach_agent::CoachAgent;
use fitcoach_core::config::{get_default_config_file, CoachConfig};

#[derive(Parser, Debug)]
#[command(name = "fitcoach-server", about = "REST API server for the FitCoach assistant")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP server address
    #[arg(long, default_value = "127.0.0.1:8000")]
    http_addr: SocketAddr,

    /// Override the completion model
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => CoachConfig::load_from_file(path)?,
        None => match get_default_config_file("fitcoach") {
            Ok(path) if path.exists() => CoachConfig::load_from_file(&path)?,
            _ => CoachConfig::default(),
        },
    };
    let mut config = file_config.apply_env();
    if args.model.is_some() {
        config.model = args.model;
    }

    let agent = CoachAgent::new(config)?;
    info!("Agent initialized, model ready");

    http::run_server(agent, args.http_addr).await
}
