//! Chat application module for interactive conversations.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! palaver client library. It supports:
//!
//! - Streaming responses with a live cursor marker
//! - Slash commands for session control
//! - Configurable model and sampling parameters
//! - Reset with archival of the finished conversation
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: The turn state machine and API interaction
//! - [`commands`]: Slash command parsing
//! - [`repl`]: The interactive loop shared by both binaries

pub mod commands;
pub mod config;
pub mod repl;
pub mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{
    BasicChatArgs, ChatArgs, ChatConfig, ChatSettings, ChatVariant, DEFAULT_ARCHIVE_PATH,
};
pub use repl::{CommandOutcome, execute_command, format_stats, run};
pub use session::{
    ChatSession, ResetOutcome, SessionEvent, SessionStats, Transition, TurnState,
};
