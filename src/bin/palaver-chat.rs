//! Minimal streaming chat with a fixed model.
//!
//! This binary provides a streaming REPL for chatting with gpt-3.5-turbo
//! using the service's default sampling parameters.
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! palaver-chat
//!
//! # Disable colors (useful for piping output)
//! palaver-chat --no-color
//! ```
//!
//! # Commands
//!
//! - `/history` - Show the conversation so far
//! - `/stats` - Show session statistics
//! - `/help` - Show available commands
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use palaver::OpenAi;
use palaver::chat::{BasicChatArgs, ChatConfig, ChatSession, PlainTextRenderer};

/// Main entry point for the palaver-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (args, _) = BasicChatArgs::from_command_line_relaxed("palaver-chat [OPTIONS]");
    let config = ChatConfig::from_basic_args(&args)?;
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

    println!("Chat (model: {})", session.model());
    println!("Type /help for commands, /quit to exit\n");

    palaver::chat::run(&mut session, &mut renderer, interrupted).await?;
    Ok(())
}
