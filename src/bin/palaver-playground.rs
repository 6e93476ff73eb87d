//! Streaming chat playground with adjustable model and sampling.
//!
//! Settings come from an optional YAML file, then command-line flags, and
//! can be changed mid-conversation with slash commands.  `/reset` appends the
//! conversation to a CSV archive and starts over.
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! palaver-playground --model gpt-4 --temperature 0.7
//!
//! # Defaults from a file, archive elsewhere
//! palaver-playground --config playground.yaml --archive ~/chats.csv
//! ```
//!
//! # Commands
//!
//! - `/reset` - Archive and clear the conversation
//! - `/model <name>` - Change the model
//! - `/temperature <v>`, `/max_tokens <n>`, `/top_p <v>`,
//!   `/presence_penalty <v>`, `/frequency_penalty <v>` - Adjust sampling
//! - `/config` - Show current configuration
//! - `/history` - Show the conversation so far
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use palaver::OpenAi;
use palaver::chat::{ChatArgs, ChatConfig, ChatSession, PlainTextRenderer};

/// Main entry point for the palaver-playground application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("palaver-playground [OPTIONS]");
    let config = ChatConfig::from_args(&args)?;
    let use_color = config.use_color;

    let client = OpenAi::new(None)?;
    let mut session = ChatSession::new(Arc::new(client), config);

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;
    let mut renderer = PlainTextRenderer::with_color(use_color).with_interrupt(interrupted.clone());

    println!("Chat playground");
    println!("{}", session.describe_config());
    println!("Type /help for commands, /quit to exit\n");

    palaver::chat::run(&mut session, &mut renderer, interrupted).await?;
    Ok(())
}
