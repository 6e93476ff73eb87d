//! Session-scoped conversation history.

use crate::types::{Message, MessageRole};

/// The ordered messages of one chat session.
///
/// Appending never validates role alternation.  Growth is unbounded unless a
/// turn cap is configured with [`Conversation::with_max_turns`], in which case
/// the oldest turns are evicted first.  Withdrawing the user message that
/// caused an eviction (with [`Conversation::pop`]) puts the evicted turns
/// back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
    max_turns: Option<usize>,
    evicted: Vec<Message>,
}

impl Conversation {
    /// Create an empty, unbounded conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max_turns` turns, where a turn starts at a user message.
    ///
    /// A cap of zero is treated as one so the current turn is never evicted.
    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns.map(|n| n.max(1));
        self.evict();
        self.evicted.clear();
        self
    }

    /// The configured turn cap, if any.
    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }

    /// Add a message to the end of the conversation.
    pub fn append(&mut self, message: Message) {
        self.evicted.clear();
        self.messages.push(message);
        if message_starts_turn(self.messages.last()) {
            self.evict();
        }
    }

    /// Remove and return the most recent message.
    ///
    /// Turns evicted when that message was appended are restored.
    pub fn pop(&mut self) -> Option<Message> {
        let message = self.messages.pop();
        if !self.evicted.is_empty() {
            let evicted = std::mem::take(&mut self.evicted);
            self.messages.splice(..0, evicted);
        }
        message
    }

    /// Remove every message.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.evicted.clear();
    }

    /// The full ordered sequence, for rendering or for a request.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when there are no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The number of user messages.
    pub fn turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }

    /// Flatten into `role: content` lines joined with newlines.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(Message::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn evict(&mut self) {
        let Some(max_turns) = self.max_turns else {
            return;
        };
        let excess = self.turns().saturating_sub(max_turns);
        if excess == 0 {
            return;
        }
        // Cut just before the first user message of the oldest kept turn.
        let cut = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role == MessageRole::User)
            .nth(excess)
            .map(|(idx, _)| idx)
            .unwrap_or(self.messages.len());
        self.evicted = self.messages.drain(..cut).collect();
    }
}

fn message_starts_turn(message: Option<&Message>) -> bool {
    message.is_some_and(|m| m.role == MessageRole::User)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_empty() {
        let conversation = Conversation::new();
        assert!(conversation.is_empty());
        assert_eq!(conversation.len(), 0);
        assert_eq!(conversation.transcript(), "");
    }

    #[test]
    fn append_keeps_order() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("Hello"));
        conversation.append(Message::assistant("Hi there!"));
        assert_eq!(
            conversation.snapshot(),
            &[Message::user("Hello"), Message::assistant("Hi there!")]
        );
        assert_eq!(conversation.turns(), 1);
    }

    #[test]
    fn append_does_not_enforce_alternation() {
        let mut conversation = Conversation::new();
        conversation.append(Message::assistant("unprompted"));
        conversation.append(Message::user("one"));
        conversation.append(Message::user("two"));
        conversation.append(Message::assistant("reply"));
        conversation.append(Message::assistant("another reply"));
        let roles: Vec<_> = conversation.snapshot().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Assistant,
            ]
        );
    }

    #[test]
    fn clear_from_any_length() {
        for n in [0, 1, 7] {
            let mut conversation = Conversation::new();
            for i in 0..n {
                conversation.append(Message::user(format!("m{i}")));
            }
            conversation.clear();
            assert_eq!(conversation.len(), 0);
        }
    }

    #[test]
    fn transcript_flattens_role_and_content() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("t1"));
        conversation.append(Message::assistant("r1"));
        conversation.append(Message::user("t2"));
        conversation.append(Message::assistant("r2"));
        assert_eq!(
            conversation.transcript(),
            "user: t1\nassistant: r1\nuser: t2\nassistant: r2"
        );
    }

    #[test]
    fn max_turns_evicts_oldest_turns() {
        let mut conversation = Conversation::new().with_max_turns(Some(2));
        for i in 1..=3 {
            conversation.append(Message::user(format!("t{i}")));
            conversation.append(Message::assistant(format!("r{i}")));
        }
        assert_eq!(
            conversation.transcript(),
            "user: t2\nassistant: r2\nuser: t3\nassistant: r3"
        );
    }

    #[test]
    fn pop_restores_evicted_turns() {
        let mut conversation = Conversation::new().with_max_turns(Some(1));
        conversation.append(Message::user("t1"));
        conversation.append(Message::assistant("r1"));
        conversation.append(Message::user("t2"));
        assert_eq!(conversation.snapshot(), &[Message::user("t2")]);

        assert_eq!(conversation.pop(), Some(Message::user("t2")));
        assert_eq!(
            conversation.snapshot(),
            &[Message::user("t1"), Message::assistant("r1")]
        );
        assert_eq!(conversation.pop(), Some(Message::assistant("r1")));
        assert_eq!(conversation.snapshot(), &[Message::user("t1")]);
    }

    #[test]
    fn completed_turn_keeps_eviction() {
        let mut conversation = Conversation::new().with_max_turns(Some(1));
        conversation.append(Message::user("t1"));
        conversation.append(Message::assistant("r1"));
        conversation.append(Message::user("t2"));
        conversation.append(Message::assistant("r2"));
        assert_eq!(conversation.pop(), Some(Message::assistant("r2")));
        assert_eq!(conversation.snapshot(), &[Message::user("t2")]);
    }

    #[test]
    fn max_turns_applied_to_existing_history() {
        let mut conversation = Conversation::new();
        conversation.append(Message::assistant("greeting"));
        conversation.append(Message::user("t1"));
        conversation.append(Message::assistant("r1"));
        conversation.append(Message::user("t2"));
        let conversation = conversation.with_max_turns(Some(1));
        assert_eq!(conversation.snapshot(), &[Message::user("t2")]);
    }

    #[test]
    fn zero_cap_keeps_current_turn() {
        let mut conversation = Conversation::new().with_max_turns(Some(0));
        conversation.append(Message::user("t1"));
        conversation.append(Message::assistant("r1"));
        conversation.append(Message::user("t2"));
        assert_eq!(conversation.max_turns(), Some(1));
        assert_eq!(conversation.snapshot(), &[Message::user("t2")]);
    }
}
