mod cli;
mod openai_client;

use std::env;
use std::io;
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use eyre::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::ChatContext;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_SYSTEM_PROMPT: &str = "Je bent een behulpzame assistent.";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model name, e.g. gpt-4o, gpt-4o-mini (defaults to $OPENAI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// System prompt for the conversation
    #[arg(short, long, default_value = DEFAULT_SYSTEM_PROMPT)]
    system: String,

    /// If set, do single-turn chats (stateless)
    #[arg(long)]
    no_memory: bool,

    /// Input to send to the chat, print the reply and exit
    #[arg(short, long)]
    input: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Starting ChatGPT CLI");

    let model = cli
        .model
        .or_else(|| env::var("OPENAI_MODEL").ok())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        cli.input,
        true,
        model,
        cli.system,
        !cli.no_memory,
    );
    chat_context.run().await
}
