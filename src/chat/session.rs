//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns one conversation
//! and drives it through a small turn state machine: a user submission opens
//! a turn, streamed fragments accumulate, and the end or failure of the
//! stream closes it.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;

use crate::accumulator::StreamAccumulator;
use crate::archive::{ArchiveEntry, CsvArchive, TranscriptArchive};
use crate::chat::config::{ChatConfig, ChatVariant};
use crate::client::CompletionService;
use crate::client_logger::ClientLogger;
use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::observability::{
    SESSION_RESETS, SESSION_TRUNCATED_TURNS, SESSION_TURNS, STREAM_DURATION, STREAM_ERRORS,
    STREAM_TTFB,
};
use crate::render::Renderer;
use crate::types::{ChatCompletionRequest, GenerationParams, Message, Model};

/// How often a streaming turn checks the renderer's interrupt flag.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// Where the session is in the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No response is streaming; input is accepted.
    Idle,
    /// A request is out and its fragments are being accumulated.
    AwaitingResponse,
}

/// An input to the turn state machine.
#[derive(Debug)]
pub enum SessionEvent {
    /// The user submitted a message.
    UserSubmitted(String),
    /// The next fragment of the response arrived.
    FragmentReceived(String),
    /// The response stream was exhausted.
    StreamEnded,
    /// The response stream failed, stalled, or was interrupted.
    StreamFailed(Error),
    /// The user asked to archive and clear the conversation.
    ResetRequested,
}

/// The result of handling a [`SessionEvent`].
#[derive(Debug)]
pub enum Transition {
    /// The user message was recorded; send this request.
    RequestReady(ChatCompletionRequest),
    /// A fragment was applied; this is the display with the cursor marker.
    Updated(String),
    /// The response completed and was committed to the conversation.
    Completed(Message),
    /// The turn ended abnormally.
    ///
    /// `message` is the committed truncated response, or `None` when no text
    /// had arrived and the user message was withdrawn instead.
    Abandoned {
        /// The truncated response, if any text arrived.
        message: Option<Message>,
        /// Why the turn ended.
        error: Error,
    },
    /// The conversation was cleared.
    Reset(ResetOutcome),
}

/// What a reset did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOutcome {
    /// True when the conversation was written to the archive.
    pub archived: bool,
    /// How many messages were removed.
    pub cleared: usize,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// Basic or configurable.
    pub variant: ChatVariant,
    /// The model used for the session.
    pub model: Model,
    /// Sampling parameters sent with requests, if any.
    pub params: Option<GenerationParams>,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// The number of turns in the conversation.
    pub turn_count: usize,
    /// Responses that streamed to completion.
    pub completed_responses: u64,
    /// Responses committed as truncated.
    pub truncated_responses: u64,
    /// Turns withdrawn because the stream failed before any text.
    pub failed_turns: u64,
    /// Completed resets.
    pub resets: u64,
    /// The turn cap, if any.
    pub max_turns: Option<usize>,
    /// The archive file, if archival is enabled.
    pub archive_path: Option<PathBuf>,
}

/// A chat session that manages conversation state and API interactions.
///
/// The session maintains message history and handles streaming responses
/// from a [`CompletionService`].  While a response is streaming, further
/// submissions and resets are rejected.
pub struct ChatSession {
    client: Arc<dyn CompletionService>,
    config: ChatConfig,
    conversation: Conversation,
    active: Option<StreamAccumulator>,
    archive: Option<Box<dyn TranscriptArchive>>,
    logger: Option<Arc<dyn ClientLogger>>,
    completed_responses: u64,
    truncated_responses: u64,
    failed_turns: u64,
    resets: u64,
}

impl ChatSession {
    /// Creates a new chat session with the given client and configuration.
    ///
    /// A configurable session with an archive path archives to that CSV
    /// file on reset.
    pub fn new(client: Arc<dyn CompletionService>, config: ChatConfig) -> Self {
        let archive: Option<Box<dyn TranscriptArchive>> =
            match (config.variant, &config.archive_path) {
                (ChatVariant::Configurable, Some(path)) => Some(Box::new(CsvArchive::new(path))),
                _ => None,
            };
        let conversation = Conversation::new().with_max_turns(config.max_turns);
        Self {
            client,
            config,
            conversation,
            active: None,
            archive,
            logger: None,
            completed_responses: 0,
            truncated_responses: 0,
            failed_turns: 0,
            resets: 0,
        }
    }

    /// Replaces the archive that resets write to.
    pub fn with_archive(mut self, archive: Box<dyn TranscriptArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Attaches a logger that sees every committed message.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the conversation so far.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }

    /// Returns where the session is in the current turn.
    pub fn state(&self) -> TurnState {
        if self.active.is_some() {
            TurnState::AwaitingResponse
        } else {
            TurnState::Idle
        }
    }

    /// Returns the current model.
    pub fn model(&self) -> Model {
        self.config.params.model
    }

    /// Returns the parameters sent with each request, or `None` for the basic
    /// session, which relies on service defaults.
    pub fn request_params(&self) -> Option<&GenerationParams> {
        self.config
            .variant
            .is_configurable()
            .then_some(&self.config.params)
    }

    /// Feed one event through the turn state machine.
    ///
    /// Events that make no sense in the current state are rejected with a
    /// validation error and leave the session untouched.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Transition> {
        match event {
            SessionEvent::UserSubmitted(text) => self.submit(text).map(Transition::RequestReady),
            SessionEvent::FragmentReceived(fragment) => {
                self.receive_fragment(&fragment).map(Transition::Updated)
            }
            SessionEvent::StreamEnded => self.end_stream().map(Transition::Completed),
            SessionEvent::StreamFailed(error) => {
                let message = self.fail_stream(&error)?;
                Ok(Transition::Abandoned { message, error })
            }
            SessionEvent::ResetRequested => self.reset().map(Transition::Reset),
        }
    }

    /// Record a user message and build the request for the whole
    /// conversation, including that message.
    pub fn submit(&mut self, text: impl Into<String>) -> Result<ChatCompletionRequest> {
        if self.active.is_some() {
            return Err(Error::validation(
                "a response is still streaming; wait for it to finish",
                None,
            ));
        }
        self.commit(Message::user(text));
        self.active = Some(StreamAccumulator::new());
        SESSION_TURNS.click();
        let request =
            ChatCompletionRequest::build(self.conversation.snapshot(), self.request_params());
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "submitting turn"
        );
        Ok(request)
    }

    /// Apply the next fragment and return the in-progress display.
    pub fn receive_fragment(&mut self, fragment: &str) -> Result<String> {
        let accumulator = self.active.as_mut().ok_or_else(not_streaming)?;
        accumulator.push(fragment);
        Ok(accumulator.display())
    }

    /// Close the turn, committing the accumulated text as the response.
    pub fn end_stream(&mut self) -> Result<Message> {
        let accumulator = self.active.take().ok_or_else(not_streaming)?;
        let fragments = accumulator.fragments();
        let message = accumulator.finish();
        self.commit(message.clone());
        self.completed_responses += 1;
        tracing::debug!(fragments, chars = message.content.len(), "response complete");
        Ok(message)
    }

    /// Close a turn whose stream ended abnormally.
    ///
    /// Partial text is committed as a truncated response so user and
    /// assistant messages keep alternating.  If no text arrived, the user
    /// message is withdrawn and `None` is returned.
    pub fn fail_stream(&mut self, error: &Error) -> Result<Option<Message>> {
        let accumulator = self.active.take().ok_or_else(not_streaming)?;
        STREAM_ERRORS.click();
        if accumulator.text().is_empty() {
            self.conversation.pop();
            self.failed_turns += 1;
            tracing::warn!(%error, "turn failed before any text arrived");
            return Ok(None);
        }
        let message = accumulator.abort();
        self.commit(message.clone());
        self.truncated_responses += 1;
        SESSION_TRUNCATED_TURNS.click();
        tracing::warn!(%error, chars = message.content.len(), "response truncated");
        Ok(Some(message))
    }

    /// Archive a non-empty conversation, then clear it.
    ///
    /// If archiving fails the conversation is kept and the error returned.
    /// The basic session has no reset.
    pub fn reset(&mut self) -> Result<ResetOutcome> {
        if !self.config.variant.is_configurable() {
            return Err(Error::validation(
                "reset is not available in the basic chat",
                None,
            ));
        }
        if self.active.is_some() {
            return Err(Error::validation(
                "cannot reset while a response is streaming",
                None,
            ));
        }
        let cleared = self.conversation.len();
        let mut archived = false;
        if !self.conversation.is_empty() {
            if let Some(archive) = self.archive.as_mut() {
                let entry = ArchiveEntry::capture(&self.conversation)?;
                archive.append(&entry)?;
                archived = true;
            }
        }
        self.conversation.clear();
        self.resets += 1;
        SESSION_RESETS.click();
        tracing::info!(cleared, archived, "conversation reset");
        Ok(ResetOutcome { archived, cleared })
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to history
    /// 2. Sends a streaming request for the whole conversation
    /// 3. Renders the growing response, with its cursor marker, as
    ///    fragments arrive
    /// 4. Adds the complete assistant response to history
    ///
    /// Opening the stream and each wait for a fragment are bounded by the
    /// configured stall timeout, and the renderer's interrupt flag is honored
    /// while waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the stream fails or stalls, or
    /// the user interrupts.  Any partial response has already been rendered
    /// and committed as truncated when this returns.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<Message> {
        let request = self.submit(user_input)?;
        let started = Instant::now();
        let stall = self.config.stream_timeout;
        renderer.start_response();

        let opened = tokio::select! {
            opened = tokio::time::timeout(stall, self.client.stream(request)) => match opened {
                Ok(opened) => opened,
                Err(_) => Err(stall_error(stall)),
            },
            () = wait_for_interrupt(&*renderer) => Err(interrupted_error()),
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(err) if err.is_abort() => {
                let err = self.abandon(err, renderer);
                renderer.print_interrupted();
                return Err(err);
            }
            Err(err) => return Err(self.abandon(err, renderer)),
        };

        let mut first_fragment = true;
        loop {
            let next = tokio::select! {
                next = tokio::time::timeout(stall, stream.next()) => match next {
                    Ok(item) => Next::Item(item),
                    Err(_) => Next::Stalled,
                },
                () = wait_for_interrupt(&*renderer) => Next::Interrupted,
            };
            match next {
                Next::Item(Some(Ok(fragment))) => {
                    if first_fragment {
                        STREAM_TTFB.add(started.elapsed().as_secs_f64());
                        first_fragment = false;
                    }
                    let display = self.receive_fragment(&fragment)?;
                    renderer.update_response(&display);
                }
                Next::Item(Some(Err(err))) => return Err(self.abandon(err, renderer)),
                Next::Item(None) => break,
                Next::Stalled => return Err(self.abandon(stall_error(stall), renderer)),
                Next::Interrupted => {
                    let err = self.abandon(interrupted_error(), renderer);
                    renderer.print_interrupted();
                    return Err(err);
                }
            }
        }

        let message = self.end_stream()?;
        renderer.finish_response(&message.content);
        STREAM_DURATION.add(started.elapsed().as_secs_f64());
        Ok(message)
    }

    /// Render every message of the conversation, in order.
    ///
    /// Rendering does not change the session, so repeated calls show the
    /// same history.
    pub fn render_history(&self, renderer: &mut dyn Renderer) {
        for message in self.conversation.snapshot() {
            renderer.render_message(message);
        }
    }

    /// Changes the model used for responses.
    pub fn set_model(&mut self, model: Model) -> Result<()> {
        self.update_params(|params| Ok(params.with_model(model)))
    }

    /// Sets the sampling temperature.
    pub fn set_temperature(&mut self, temperature: f32) -> Result<()> {
        self.update_params(|params| params.with_temperature(temperature))
    }

    /// Sets the maximum tokens per response.
    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<()> {
        self.update_params(|params| params.with_max_tokens(max_tokens))
    }

    /// Sets the top-p value.
    pub fn set_top_p(&mut self, top_p: f32) -> Result<()> {
        self.update_params(|params| params.with_top_p(top_p))
    }

    /// Sets the presence penalty.
    pub fn set_presence_penalty(&mut self, penalty: f32) -> Result<()> {
        self.update_params(|params| params.with_presence_penalty(penalty))
    }

    /// Sets the frequency penalty.
    pub fn set_frequency_penalty(&mut self, penalty: f32) -> Result<()> {
        self.update_params(|params| params.with_frequency_penalty(penalty))
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            variant: self.config.variant,
            model: self.model(),
            params: self.request_params().copied(),
            message_count: self.conversation.len(),
            turn_count: self.conversation.turns(),
            completed_responses: self.completed_responses,
            truncated_responses: self.truncated_responses,
            failed_turns: self.failed_turns,
            resets: self.resets,
            max_turns: self.conversation.max_turns(),
            archive_path: self.archive_path(),
        }
    }

    /// Describe the active configuration, one setting per line.
    pub fn describe_config(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Model: {}", self.model());
        match self.request_params() {
            Some(params) => {
                let _ = writeln!(out, "Temperature: {}", params.temperature);
                let _ = writeln!(out, "Max tokens: {}", params.max_tokens);
                let _ = writeln!(out, "Top-p: {}", params.top_p);
                let _ = writeln!(out, "Presence penalty: {}", params.presence_penalty);
                let _ = writeln!(out, "Frequency penalty: {}", params.frequency_penalty);
            }
            None => {
                let _ = writeln!(out, "Sampling: service defaults");
            }
        }
        match self.archive_path() {
            Some(path) => {
                let _ = writeln!(out, "Archive: {}", path.display());
            }
            None => {
                let _ = writeln!(out, "Archive: disabled");
            }
        }
        match self.conversation.max_turns() {
            Some(max_turns) => {
                let _ = writeln!(out, "History: last {max_turns} turns");
            }
            None => {
                let _ = writeln!(out, "History: unlimited");
            }
        }
        let _ = write!(
            out,
            "Stall timeout: {}s",
            self.config.stream_timeout.as_secs()
        );
        out
    }

    fn archive_path(&self) -> Option<PathBuf> {
        if self.archive.is_some() {
            self.config.archive_path.clone()
        } else {
            None
        }
    }

    fn update_params<F>(&mut self, update: F) -> Result<()>
    where
        F: FnOnce(GenerationParams) -> Result<GenerationParams>,
    {
        if !self.config.variant.is_configurable() {
            return Err(Error::validation(
                "settings are fixed in the basic chat",
                None,
            ));
        }
        self.config.params = update(self.config.params)?;
        Ok(())
    }

    fn commit(&mut self, message: Message) {
        if let Some(logger) = &self.logger {
            logger.log_message(&message);
        }
        self.conversation.append(message);
    }

    fn abandon(&mut self, error: Error, renderer: &mut dyn Renderer) -> Error {
        match self.fail_stream(&error) {
            Ok(Some(message)) => renderer.finish_response(&message.content),
            Ok(None) => {}
            Err(err) => return err,
        }
        error
    }
}

enum Next {
    Item(Option<Result<String>>),
    Stalled,
    Interrupted,
}

async fn wait_for_interrupt(renderer: &dyn Renderer) {
    loop {
        if renderer.should_interrupt() {
            return;
        }
        tokio::time::sleep(INTERRUPT_POLL).await;
    }
}

fn stall_error(stall: Duration) -> Error {
    Error::timeout(
        format!("no response data for {} seconds", stall.as_secs()),
        Some(stall.as_secs_f64()),
    )
}

fn interrupted_error() -> Error {
    Error::abort("response interrupted")
}

fn not_streaming() -> Error {
    Error::validation("no response is streaming", None)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::client::FragmentStream;
    use crate::types::MessageRole;

    struct ScriptedService {
        script: Vec<Result<String>>,
        requests: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl ScriptedService {
        fn new(script: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                script,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl CompletionService for ScriptedService {
        async fn stream(&self, request: ChatCompletionRequest) -> Result<FragmentStream> {
            self.requests.lock().unwrap().push(request);
            Ok(Box::pin(futures::stream::iter(self.script.clone())))
        }
    }

    struct FailingArchive;

    impl TranscriptArchive for FailingArchive {
        fn append(&mut self, _: &ArchiveEntry) -> Result<()> {
            Err(Error::archive("disk full", None))
        }
    }

    #[derive(Default)]
    struct MemoryArchive {
        entries: Arc<Mutex<Vec<ArchiveEntry>>>,
    }

    impl TranscriptArchive for MemoryArchive {
        fn append(&mut self, entry: &ArchiveEntry) -> Result<()> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    fn fragments(parts: &[&str]) -> Vec<Result<String>> {
        parts.iter().map(|part| Ok(part.to_string())).collect()
    }

    fn configurable() -> ChatConfig {
        ChatConfig::configurable().with_archive_path(None)
    }

    #[test]
    fn new_session_empty() {
        let session = ChatSession::new(ScriptedService::new(vec![]), ChatConfig::basic());
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.state(), TurnState::Idle);
        assert!(session.request_params().is_none());
    }

    #[test]
    fn events_drive_a_turn() {
        let mut session = ChatSession::new(ScriptedService::new(vec![]), configurable());
        let Transition::RequestReady(request) = session
            .handle(SessionEvent::UserSubmitted("Hello".to_string()))
            .unwrap()
        else {
            panic!("expected a request");
        };
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.temperature, Some(1.0));
        assert_eq!(session.state(), TurnState::AwaitingResponse);

        for (fragment, expected) in [("Hi", "Hi▌"), (" there", "Hi there▌")] {
            match session
                .handle(SessionEvent::FragmentReceived(fragment.to_string()))
                .unwrap()
            {
                Transition::Updated(display) => assert_eq!(display, expected),
                other => panic!("unexpected transition {other:?}"),
            }
        }
        match session.handle(SessionEvent::StreamEnded).unwrap() {
            Transition::Completed(message) => assert_eq!(message.content, "Hi there"),
            other => panic!("unexpected transition {other:?}"),
        }
        assert_eq!(session.state(), TurnState::Idle);
        assert_eq!(session.message_count(), 2);
    }

    #[test]
    fn submit_rejected_while_streaming() {
        let mut session = ChatSession::new(ScriptedService::new(vec![]), ChatConfig::basic());
        session.submit("one").unwrap();
        let err = session.submit("two").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.message_count(), 1);
    }

    #[test]
    fn fragments_rejected_when_idle() {
        let mut session = ChatSession::new(ScriptedService::new(vec![]), ChatConfig::basic());
        assert!(session.receive_fragment("x").unwrap_err().is_validation());
        assert!(session.end_stream().unwrap_err().is_validation());
    }

    #[test]
    fn failure_with_partial_text_commits_truncated_message() {
        let mut session = ChatSession::new(ScriptedService::new(vec![]), ChatConfig::basic());
        session.submit("Hello").unwrap();
        session.receive_fragment("Hi th").unwrap();
        let message = session
            .fail_stream(&Error::streaming("connection reset", None))
            .unwrap()
            .unwrap();
        assert!(message.truncated);
        assert_eq!(message.content, "Hi th");
        let roles: Vec<_> = session
            .conversation()
            .snapshot()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);
        assert_eq!(session.stats().truncated_responses, 1);
    }

    #[test]
    fn failure_without_text_withdraws_user_message() {
        let mut session = ChatSession::new(ScriptedService::new(vec![]), ChatConfig::basic());
        session.submit("Hello").unwrap();
        let message = session
            .fail_stream(&Error::authentication("bad key"))
            .unwrap();
        assert!(message.is_none());
        assert!(session.conversation().is_empty());
        assert_eq!(session.state(), TurnState::Idle);
        assert_eq!(session.stats().failed_turns, 1);
    }

    #[test]
    fn basic_session_cannot_reset_or_configure() {
        let mut session = ChatSession::new(ScriptedService::new(vec![]), ChatConfig::basic());
        assert!(session.reset().unwrap_err().is_validation());
        assert!(session.set_temperature(0.5).unwrap_err().is_validation());
        assert!(session.set_model(Model::Gpt4).unwrap_err().is_validation());
    }

    #[test]
    fn setters_validate_ranges() {
        let mut session = ChatSession::new(ScriptedService::new(vec![]), configurable());
        session.set_model(Model::Gpt4).unwrap();
        session.set_temperature(0.2).unwrap();
        session.set_max_tokens(4095).unwrap();
        assert!(session.set_temperature(2.5).is_err());
        assert!(session.set_max_tokens(0).is_err());
        assert!(session.set_top_p(-0.1).is_err());
        let params = session.request_params().unwrap();
        assert_eq!(params.model, Model::Gpt4);
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.max_tokens, 4095);
    }

    #[test]
    fn reset_keeps_conversation_when_archive_fails() {
        let mut session = ChatSession::new(ScriptedService::new(vec![]), configurable())
            .with_archive(Box::new(FailingArchive));
        session.submit("Hello").unwrap();
        session.end_stream().unwrap();
        let err = session.reset().unwrap_err();
        assert!(err.is_archive());
        assert_eq!(session.message_count(), 2);
    }

    #[test]
    fn reset_of_empty_conversation_does_not_archive() {
        let archive = MemoryArchive::default();
        let entries = Arc::clone(&archive.entries);
        let mut session = ChatSession::new(ScriptedService::new(vec![]), configurable())
            .with_archive(Box::new(archive));
        let outcome = session.reset().unwrap();
        assert_eq!(
            outcome,
            ResetOutcome {
                archived: false,
                cleared: 0
            }
        );
        assert!(entries.lock().unwrap().is_empty());
    }

    #[test]
    fn reset_rejected_while_streaming() {
        let mut session = ChatSession::new(ScriptedService::new(vec![]), configurable());
        session.submit("Hello").unwrap();
        assert!(session.reset().unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn send_streaming_commits_response() {
        let service = ScriptedService::new(fragments(&["Hi", " there", "!"]));
        let mut session = ChatSession::new(service.clone(), ChatConfig::basic());
        let mut renderer = crate::PlainTextRenderer::with_color(false);
        let message = session.send_streaming("Hello", &mut renderer).await.unwrap();
        assert_eq!(message, Message::assistant("Hi there!"));
        assert_eq!(
            session.conversation().snapshot(),
            &[Message::user("Hello"), Message::assistant("Hi there!")]
        );
        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].temperature.is_none());
    }

    #[derive(Default)]
    struct MessageLog {
        messages: Mutex<Vec<Message>>,
    }

    impl ClientLogger for MessageLog {
        fn log_request(&self, _: &ChatCompletionRequest) {}
        fn log_fragment(&self, _: &str) {}
        fn log_message(&self, message: &Message) {
            self.messages.lock().unwrap().push(message.clone());
        }
    }

    #[test]
    fn logger_sees_committed_messages() {
        let log = Arc::new(MessageLog::default());
        let mut session = ChatSession::new(ScriptedService::new(vec![]), ChatConfig::basic())
            .with_logger(log.clone());
        session.submit("Hello").unwrap();
        session.receive_fragment("Hi").unwrap();
        session.end_stream().unwrap();
        assert_eq!(
            *log.messages.lock().unwrap(),
            vec![Message::user("Hello"), Message::assistant("Hi")]
        );
    }

    #[test]
    fn describe_config_lists_settings() {
        let session = ChatSession::new(ScriptedService::new(vec![]), ChatConfig::configurable());
        let described = session.describe_config();
        assert!(described.contains("Model: gpt-3.5-turbo"));
        assert!(described.contains("Max tokens: 256"));
        assert!(described.contains("Archive: chat_history.csv"));

        let basic = ChatSession::new(ScriptedService::new(vec![]), ChatConfig::basic());
        assert!(basic.describe_config().contains("service defaults"));
    }
}
