use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use rust_food_agent::api;
use rust_food_agent::commands::{CommandHandler, CommandOutcome};
use rust_food_agent::{build_analyzer, AppConfig, FoodAnalyzer};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run the HTTP API instead of the interactive prompt
    #[arg(long)]
    api: bool,

    /// Overrides PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let analyzer = Arc::new(build_analyzer(&config).context("Failed to build HTTP client")?);

    if args.api {
        run_api_server(config, analyzer).await
    } else {
        run_cli_mode(analyzer).await
    }
}

async fn run_cli_mode(analyzer: Arc<FoodAnalyzer>) -> anyhow::Result<()> {
    colored::control::set_override(true);

    let mut command_handler = CommandHandler::new(analyzer);
    if let Err(e) = command_handler.handle_command("help").await {
        println!("{}", e.red());
    }

    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        match rl.readline("👤 ") {
            Ok(line) => {
                let input = line.trim();
                let _ = rl.add_history_entry(input);

                match command_handler.handle_command(input).await {
                    Ok(CommandOutcome::Exit) => break,
                    Ok(CommandOutcome::Continue) => {}
                    Err(e) => println!("{}", e.red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

async fn run_api_server(config: AppConfig, analyzer: Arc<FoodAnalyzer>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let app = api::create_api(analyzer, &config);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server running on {}", addr);
    tracing::info!("Uploads stored transiently in {}", config.upload_dir.display());

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
