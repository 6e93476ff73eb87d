//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! settings file, and the resolved [`ChatConfig`] a session runs with.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{GenerationParams, Model};

/// Archive file used by the configurable session unless told otherwise.
pub const DEFAULT_ARCHIVE_PATH: &str = "chat_history.csv";

/// Default bound on how long to wait for the next fragment.
const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Which of the two chat front ends a session implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatVariant {
    /// Fixed model, service-default sampling, no reset.
    Basic,
    /// Adjustable model and sampling, reset with archival.
    Configurable,
}

impl ChatVariant {
    /// True when model and sampling parameters may be changed.
    pub fn is_configurable(&self) -> bool {
        matches!(self, ChatVariant::Configurable)
    }
}

/// Command-line arguments for the palaver-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct BasicChatArgs {
    /// Seconds to wait for the next fragment before failing the turn.
    #[arrrg(optional, "Stall timeout in seconds (default: 60)", "SECS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Command-line arguments for the palaver-playground tool.
///
/// Sampling values are kept as text here and parsed when converted into
/// [`ChatSettings`].
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// YAML file with default settings.
    #[arrrg(optional, "YAML settings file", "FILE")]
    pub config: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model: gpt-3.5-turbo or gpt-4 (default: gpt-3.5-turbo)", "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Temperature 0.2-2.0 (default: 1.0)", "T")]
    pub temperature: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens 1-4095 (default: 256)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling threshold.
    #[arrrg(optional, "Top-p 0.0-1.0 (default: 1.0)", "P")]
    pub top_p: Option<String>,

    /// Presence penalty.
    #[arrrg(optional, "Presence penalty 0.0-2.0 (default: 0.0)", "X")]
    pub presence_penalty: Option<String>,

    /// Frequency penalty.
    #[arrrg(optional, "Frequency penalty 0.0-2.0 (default: 0.0)", "X")]
    pub frequency_penalty: Option<String>,

    /// CSV file that receives conversations on reset.
    #[arrrg(optional, "Archive file for /reset (default: chat_history.csv)", "FILE")]
    pub archive: Option<String>,

    /// Keep only this many recent turns.
    #[arrrg(optional, "Keep at most N turns of history (default: unlimited)", "N")]
    pub max_turns: Option<usize>,

    /// Seconds to wait for the next fragment before failing the turn.
    #[arrrg(optional, "Stall timeout in seconds (default: 60)", "SECS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// A partial set of settings, from a YAML file or the command line.
///
/// Unset fields leave the corresponding [`ChatConfig`] value alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatSettings {
    /// The model.
    pub model: Option<Model>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum tokens per response.
    pub max_tokens: Option<u32>,
    /// Nucleus sampling threshold.
    pub top_p: Option<f32>,
    /// Presence penalty.
    pub presence_penalty: Option<f32>,
    /// Frequency penalty.
    pub frequency_penalty: Option<f32>,
    /// Archive file for resets.
    pub archive: Option<PathBuf>,
    /// Turn cap for the conversation.
    pub max_turns: Option<usize>,
    /// Stall timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Whether to use ANSI styling.
    pub color: Option<bool>,
}

impl ChatSettings {
    /// Read settings from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            Error::io(format!("failed to open config file {}", path.display()), err)
        })?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|err| {
            Error::serialization(
                format!("failed to parse config file {}: {err}", path.display()),
                Some(Box::new(err)),
            )
        })
    }
}

impl TryFrom<&ChatArgs> for ChatSettings {
    type Error = Error;

    fn try_from(args: &ChatArgs) -> Result<Self> {
        let model = args
            .model
            .as_deref()
            .map(str::parse::<Model>)
            .transpose()
            .map_err(|err| Error::validation(err, Some("model".to_string())))?;
        Ok(Self {
            model,
            temperature: parse_float(args.temperature.as_deref(), "temperature")?,
            max_tokens: args.max_tokens,
            top_p: parse_float(args.top_p.as_deref(), "top_p")?,
            presence_penalty: parse_float(args.presence_penalty.as_deref(), "presence_penalty")?,
            frequency_penalty: parse_float(
                args.frequency_penalty.as_deref(),
                "frequency_penalty",
            )?,
            archive: args.archive.as_ref().map(PathBuf::from),
            max_turns: args.max_turns,
            timeout_secs: args.timeout,
            color: args.no_color.then_some(false),
        })
    }
}

fn parse_float(value: Option<&str>, param: &str) -> Result<Option<f32>> {
    value
        .map(|v| {
            v.trim().parse::<f32>().map_err(|_| {
                Error::validation(
                    format!("{param} expects a number, got {v:?}"),
                    Some(param.to_string()),
                )
            })
        })
        .transpose()
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// the settings file and command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Basic or configurable front end.
    pub variant: ChatVariant,

    /// Model and sampling parameters; only sent by the configurable variant.
    pub params: GenerationParams,

    /// Where resets archive the conversation; `None` disables archival.
    pub archive_path: Option<PathBuf>,

    /// Cap on retained turns; `None` keeps everything.
    pub max_turns: Option<usize>,

    /// How long to wait for the next fragment.
    pub stream_timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Configuration of the basic session.
    ///
    /// Defaults:
    /// - Model: gpt-3.5-turbo, service-default sampling
    /// - No archive, unlimited history
    /// - Stall timeout: 60 seconds
    /// - Color: enabled
    pub fn basic() -> Self {
        Self {
            variant: ChatVariant::Basic,
            params: GenerationParams::default(),
            archive_path: None,
            max_turns: None,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            use_color: true,
        }
    }

    /// Configuration of the configurable session, archiving to
    /// [`DEFAULT_ARCHIVE_PATH`].
    pub fn configurable() -> Self {
        Self {
            variant: ChatVariant::Configurable,
            archive_path: Some(PathBuf::from(DEFAULT_ARCHIVE_PATH)),
            ..Self::basic()
        }
    }

    /// Sets the generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the archive path.
    pub fn with_archive_path(mut self, path: Option<PathBuf>) -> Self {
        self.archive_path = path;
        self
    }

    /// Sets the turn cap.
    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Sets the stall timeout.
    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Overlay `settings`, validating every parameter that is set.
    pub fn apply(mut self, settings: &ChatSettings) -> Result<Self> {
        let params = GenerationParams {
            model: settings.model.unwrap_or(self.params.model),
            temperature: settings.temperature.unwrap_or(self.params.temperature),
            max_tokens: settings.max_tokens.unwrap_or(self.params.max_tokens),
            top_p: settings.top_p.unwrap_or(self.params.top_p),
            presence_penalty: settings
                .presence_penalty
                .unwrap_or(self.params.presence_penalty),
            frequency_penalty: settings
                .frequency_penalty
                .unwrap_or(self.params.frequency_penalty),
        };
        params.validate()?;
        self.params = params;

        if let Some(archive) = &settings.archive {
            self.archive_path = Some(archive.clone());
        }
        if settings.max_turns.is_some() {
            self.max_turns = settings.max_turns;
        }
        if let Some(secs) = settings.timeout_secs {
            if secs == 0 {
                return Err(Error::validation(
                    "timeout must be at least one second",
                    Some("timeout".to_string()),
                ));
            }
            self.stream_timeout = Duration::from_secs(secs);
        }
        if let Some(color) = settings.color {
            self.use_color = color;
        }
        Ok(self)
    }

    /// Resolve the configurable session's configuration from its arguments.
    ///
    /// The settings file, if any, is applied first; command-line values win.
    pub fn from_args(args: &ChatArgs) -> Result<Self> {
        let mut config = Self::configurable();
        if let Some(path) = &args.config {
            config = config.apply(&ChatSettings::from_yaml_file(path)?)?;
        }
        config.apply(&ChatSettings::try_from(args)?)
    }

    /// Resolve the basic session's configuration from its arguments.
    pub fn from_basic_args(args: &BasicChatArgs) -> Result<Self> {
        let settings = ChatSettings {
            timeout_secs: args.timeout,
            color: args.no_color.then_some(false),
            ..ChatSettings::default()
        };
        Self::basic().apply(&settings)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::basic()
    }
}
