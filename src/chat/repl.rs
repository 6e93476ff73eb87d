//! The interactive read-eval-print loop shared by both chat binaries.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::chat::commands::{ChatCommand, help_text, parse_command};
use crate::chat::session::{ChatSession, SessionStats};
use crate::error::{Error, Result};
use crate::render::Renderer;

/// Whether the loop should keep reading input after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Read the next line.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Carry out one slash command against the session.
///
/// Commands that change settings or history are refused by the basic chat
/// with an error message; the session is left unchanged.
pub fn execute_command(
    session: &mut ChatSession,
    command: ChatCommand,
    renderer: &mut dyn Renderer,
) -> CommandOutcome {
    let variant = session.config().variant;
    if command.requires_configurable() && !variant.is_configurable() {
        renderer.print_error("That command is not available in the basic chat. Type /help.");
        return CommandOutcome::Continue;
    }
    let applied = match command {
        ChatCommand::Quit => return CommandOutcome::Quit,
        ChatCommand::Help => {
            renderer.print_info(help_text(variant));
            Ok(())
        }
        ChatCommand::History => {
            if session.message_count() == 0 {
                renderer.print_info("No messages yet.");
            } else {
                session.render_history(renderer);
            }
            Ok(())
        }
        ChatCommand::Stats => {
            renderer.print_info(&format_stats(&session.stats()));
            Ok(())
        }
        ChatCommand::ShowConfig => {
            renderer.print_info(&session.describe_config());
            Ok(())
        }
        ChatCommand::Reset => session.reset().map(|outcome| {
            if outcome.archived {
                renderer.print_info("Conversation archived and cleared.");
            } else {
                renderer.print_info("Conversation cleared.");
            }
        }),
        ChatCommand::Model(model) => session
            .set_model(model)
            .map(|()| renderer.print_info(&format!("Model changed to: {model}"))),
        ChatCommand::Temperature(value) => session
            .set_temperature(value)
            .map(|()| renderer.print_info(&format!("temperature set to {value:.2}"))),
        ChatCommand::MaxTokens(value) => session
            .set_max_tokens(value)
            .map(|()| renderer.print_info(&format!("max_tokens set to {value}"))),
        ChatCommand::TopP(value) => session
            .set_top_p(value)
            .map(|()| renderer.print_info(&format!("top_p set to {value:.2}"))),
        ChatCommand::PresencePenalty(value) => session
            .set_presence_penalty(value)
            .map(|()| renderer.print_info(&format!("presence_penalty set to {value:.2}"))),
        ChatCommand::FrequencyPenalty(value) => session
            .set_frequency_penalty(value)
            .map(|()| renderer.print_info(&format!("frequency_penalty set to {value:.2}"))),
        ChatCommand::Invalid(message) => {
            renderer.print_error(&message);
            Ok(())
        }
    };
    if let Err(err) = applied {
        renderer.print_error(&err.to_string());
    }
    CommandOutcome::Continue
}

/// Format session statistics for display.
pub fn format_stats(stats: &SessionStats) -> String {
    let mut lines = vec![
        "Session Statistics:".to_string(),
        format!("  Model: {}", stats.model),
        format!(
            "  Messages: {} ({} turns)",
            stats.message_count, stats.turn_count
        ),
        format!(
            "  Responses: {} complete, {} truncated, {} failed",
            stats.completed_responses, stats.truncated_responses, stats.failed_turns
        ),
    ];
    if stats.variant.is_configurable() {
        lines.push(format!("  Resets: {}", stats.resets));
    }
    if let Some(max_turns) = stats.max_turns {
        lines.push(format!("  History cap: {max_turns} turns"));
    }
    if let Some(path) = &stats.archive_path {
        lines.push(format!("  Archive: {}", path.display()));
    }
    lines.join("\n")
}

/// Run the chat loop until the user quits or input ends.
///
/// `interrupted` is cleared before each prompt; setting it while a response
/// streams stops that response.
pub async fn run(
    session: &mut ChatSession,
    renderer: &mut dyn Renderer,
    interrupted: Arc<AtomicBool>,
) -> Result<()> {
    let mut rl = DefaultEditor::new()
        .map_err(|err| Error::io("failed to start line editor", io::Error::other(err)))?;

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(command) = parse_command(line) {
                    if execute_command(session, command, renderer) == CommandOutcome::Quit {
                        println!("Goodbye!");
                        break;
                    }
                    continue;
                }

                if let Err(err) = session.send_streaming(line, renderer).await {
                    if !err.is_abort() {
                        renderer.print_error(&err.to_string());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatConfig;
    use crate::client::{CompletionService, FragmentStream};
    use crate::types::{ChatCompletionRequest, Message, Model};

    struct Unreachable;

    #[async_trait::async_trait]
    impl CompletionService for Unreachable {
        async fn stream(&self, _: ChatCompletionRequest) -> Result<FragmentStream> {
            Err(Error::connection("no service in tests", None))
        }
    }

    #[derive(Default)]
    struct Recorder {
        infos: Vec<String>,
        errors: Vec<String>,
        messages: Vec<Message>,
    }

    impl Renderer for Recorder {
        fn update_response(&mut self, _: &str) {}
        fn finish_response(&mut self, _: &str) {}
        fn render_message(&mut self, message: &Message) {
            self.messages.push(message.clone());
        }
        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }
        fn print_info(&mut self, info: &str) {
            self.infos.push(info.to_string());
        }
    }

    fn session(config: ChatConfig) -> ChatSession {
        ChatSession::new(Arc::new(Unreachable), config.with_archive_path(None))
    }

    #[test]
    fn quit_ends_the_loop() {
        let mut session = session(ChatConfig::basic());
        let mut renderer = Recorder::default();
        assert_eq!(
            execute_command(&mut session, ChatCommand::Quit, &mut renderer),
            CommandOutcome::Quit
        );
    }

    #[test]
    fn basic_chat_refuses_configuration() {
        let mut session = session(ChatConfig::basic());
        let mut renderer = Recorder::default();
        let outcome = execute_command(&mut session, ChatCommand::Temperature(0.5), &mut renderer);
        assert_eq!(outcome, CommandOutcome::Continue);
        assert_eq!(renderer.errors.len(), 1);
        assert!(session.request_params().is_none());
    }

    #[test]
    fn configurable_chat_applies_settings() {
        let mut session = session(ChatConfig::configurable());
        let mut renderer = Recorder::default();
        execute_command(&mut session, ChatCommand::Model(Model::Gpt4), &mut renderer);
        execute_command(&mut session, ChatCommand::MaxTokens(512), &mut renderer);
        let params = session.request_params().unwrap();
        assert_eq!(params.model, Model::Gpt4);
        assert_eq!(params.max_tokens, 512);
        assert_eq!(renderer.infos, vec!["Model changed to: gpt-4", "max_tokens set to 512"]);
        assert!(renderer.errors.is_empty());
    }

    #[test]
    fn history_of_empty_session() {
        let mut session = session(ChatConfig::basic());
        let mut renderer = Recorder::default();
        execute_command(&mut session, ChatCommand::History, &mut renderer);
        assert_eq!(renderer.infos, vec!["No messages yet."]);
        assert!(renderer.messages.is_empty());
    }

    #[test]
    fn reset_reports_outcome() {
        let mut session = session(ChatConfig::configurable());
        session.submit("Hello").unwrap();
        session.end_stream().unwrap();
        let mut renderer = Recorder::default();
        execute_command(&mut session, ChatCommand::Reset, &mut renderer);
        assert_eq!(renderer.infos, vec!["Conversation cleared."]);
        assert_eq!(session.message_count(), 0);
    }

    #[test]
    fn stats_mention_counts() {
        let session = session(ChatConfig::configurable().with_max_turns(Some(4)));
        let formatted = format_stats(&session.stats());
        assert!(formatted.contains("Model: gpt-3.5-turbo"));
        assert!(formatted.contains("Messages: 0 (0 turns)"));
        assert!(formatted.contains("History cap: 4 turns"));
        assert!(formatted.contains("Resets: 0"));
    }
}
