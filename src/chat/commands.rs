//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the API.

use std::ops::RangeInclusive;

use crate::chat::config::ChatVariant;
use crate::types::{
    FREQUENCY_PENALTY_RANGE, MAX_TOKENS_RANGE, Model, PRESENCE_PENALTY_RANGE, TEMPERATURE_RANGE,
    TOP_P_RANGE,
};

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Archive the conversation and start over.
    Reset,

    /// Change the model.
    Model(Model),

    /// Set the sampling temperature.
    Temperature(f32),

    /// Set the maximum tokens per response.
    MaxTokens(u32),

    /// Set the top-p value.
    TopP(f32),

    /// Set the presence penalty.
    PresencePenalty(f32),

    /// Set the frequency penalty.
    FrequencyPenalty(f32),

    /// Show the current configuration.
    ShowConfig,

    /// Display session statistics.
    Stats,

    /// Re-render the conversation so far.
    History,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

impl ChatCommand {
    /// True when the command changes settings or history that the basic
    /// chat keeps fixed.
    pub fn requires_configurable(&self) -> bool {
        matches!(
            self,
            ChatCommand::Reset
                | ChatCommand::Model(_)
                | ChatCommand::Temperature(_)
                | ChatCommand::MaxTokens(_)
                | ChatCommand::TopP(_)
                | ChatCommand::PresencePenalty(_)
                | ChatCommand::FrequencyPenalty(_)
                | ChatCommand::ShowConfig
        )
    }
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use palaver::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model gpt-4").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "reset" | "clear" => ChatCommand::Reset,
        "model" => match argument {
            Some(model) => match model.parse::<Model>() {
                Ok(model) => ChatCommand::Model(model),
                Err(err) => ChatCommand::Invalid(format!("/model {err}")),
            },
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "temperature" => parse_f32_command(
            argument,
            TEMPERATURE_RANGE,
            ChatCommand::Temperature,
            "/temperature",
        ),
        "max_tokens" => match argument {
            Some(arg) => match arg.parse::<u32>() {
                Ok(value) if MAX_TOKENS_RANGE.contains(&value) => ChatCommand::MaxTokens(value),
                _ => ChatCommand::Invalid(format!(
                    "/max_tokens expects an integer between {} and {}",
                    MAX_TOKENS_RANGE.start(),
                    MAX_TOKENS_RANGE.end()
                )),
            },
            None => ChatCommand::Invalid("/max_tokens requires a value".to_string()),
        },
        "top_p" => parse_f32_command(argument, TOP_P_RANGE, ChatCommand::TopP, "/top_p"),
        "presence_penalty" => parse_f32_command(
            argument,
            PRESENCE_PENALTY_RANGE,
            ChatCommand::PresencePenalty,
            "/presence_penalty",
        ),
        "frequency_penalty" => parse_f32_command(
            argument,
            FREQUENCY_PENALTY_RANGE,
            ChatCommand::FrequencyPenalty,
            "/frequency_penalty",
        ),
        "config" => ChatCommand::ShowConfig,
        "stats" | "status" => ChatCommand::Stats,
        "history" => ChatCommand::History,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_f32_command<F>(
    argument: Option<&str>,
    range: RangeInclusive<f32>,
    constructor: F,
    name: &str,
) -> ChatCommand
where
    F: Fn(f32) -> ChatCommand,
{
    match argument {
        Some(arg) => match parse_f32_in_range(arg, &range) {
            Ok(value) => constructor(value),
            Err(err) => ChatCommand::Invalid(format!("{name} {err}")),
        },
        None => ChatCommand::Invalid(format!("{name} requires a value")),
    }
}

fn parse_f32_in_range(value: &str, range: &RangeInclusive<f32>) -> Result<f32, String> {
    let expectation = || {
        format!(
            "expects a value between {} and {}",
            range.start(),
            range.end()
        )
    };
    let parsed: f32 = value.parse().map_err(|_| expectation())?;
    if parsed.is_finite() && range.contains(&parsed) {
        Ok(parsed)
    } else {
        Err(expectation())
    }
}

/// Returns help text describing the commands available in `variant`.
pub fn help_text(variant: ChatVariant) -> &'static str {
    match variant {
        ChatVariant::Basic => {
            r#"Available commands:
  /history               Show the conversation so far
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
        }
        ChatVariant::Configurable => {
            r#"Available commands:
  /reset                 Archive the conversation and start over
  /model <name>          Change the model (gpt-3.5-turbo or gpt-4)
  /temperature <v>       Set temperature 0.2-2.0
  /max_tokens <n>        Set maximum response tokens 1-4095
  /top_p <v>             Set top-p 0.0-1.0
  /presence_penalty <v>  Set presence penalty 0.0-2.0
  /frequency_penalty <v> Set frequency penalty 0.0-2.0
  /config                Show current configuration
  /history               Show the conversation so far
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_reset() {
        assert_eq!(parse_command("/reset"), Some(ChatCommand::Reset));
        assert_eq!(parse_command("/RESET"), Some(ChatCommand::Reset));
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Reset));
    }

    #[test]
    fn parse_model() {
        assert_eq!(
            parse_command("/model gpt-4"),
            Some(ChatCommand::Model(Model::Gpt4))
        );
        assert_eq!(
            parse_command("/model   GPT-3.5-turbo  "),
            Some(ChatCommand::Model(Model::Gpt35Turbo))
        );
        assert_eq!(
            parse_command("/model"),
            Some(ChatCommand::Invalid(
                "/model requires a model name".to_string()
            ))
        );
        assert!(matches!(
            parse_command("/model gpt-2"),
            Some(ChatCommand::Invalid(msg)) if msg.starts_with("/model")
        ));
    }

    #[test]
    fn parse_temperature_bounds() {
        assert_eq!(
            parse_command("/temperature 0.2"),
            Some(ChatCommand::Temperature(0.2))
        );
        assert_eq!(
            parse_command("/temperature 2"),
            Some(ChatCommand::Temperature(2.0))
        );
        assert!(matches!(
            parse_command("/temperature 0.1"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("between 0.2 and 2")
        ));
        assert!(matches!(
            parse_command("/temperature NaN"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/temperature"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_max_tokens_bounds() {
        assert_eq!(
            parse_command("/max_tokens 1"),
            Some(ChatCommand::MaxTokens(1))
        );
        assert_eq!(
            parse_command("/max_tokens 4095"),
            Some(ChatCommand::MaxTokens(4095))
        );
        assert!(matches!(
            parse_command("/max_tokens 0"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/max_tokens 4096"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/max_tokens lots"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_sampling_commands() {
        assert_eq!(parse_command("/top_p 0"), Some(ChatCommand::TopP(0.0)));
        assert_eq!(
            parse_command("/presence_penalty 1.5"),
            Some(ChatCommand::PresencePenalty(1.5))
        );
        assert_eq!(
            parse_command("/frequency_penalty 2.0"),
            Some(ChatCommand::FrequencyPenalty(2.0))
        );
        assert!(matches!(
            parse_command("/top_p 1.01"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/presence_penalty -0.5"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_informational_commands() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/bogus"),
            Some(ChatCommand::Invalid("Unknown command: /bogus".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn configurable_only_commands() {
        assert!(ChatCommand::Reset.requires_configurable());
        assert!(ChatCommand::Temperature(1.0).requires_configurable());
        assert!(!ChatCommand::History.requires_configurable());
        assert!(!ChatCommand::Quit.requires_configurable());
    }

    #[test]
    fn help_text_per_variant() {
        let basic = help_text(ChatVariant::Basic);
        assert!(basic.contains("/quit"));
        assert!(!basic.contains("/reset"));

        let configurable = help_text(ChatVariant::Configurable);
        assert!(configurable.contains("/reset"));
        assert!(configurable.contains("/model"));
        assert!(configurable.contains("/frequency_penalty"));
    }
}
