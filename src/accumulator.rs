//! Accumulates streamed fragments into a complete assistant message.

use crate::types::Message;

/// Appended to in-progress display text while a response is still streaming.
pub const CURSOR_MARKER: char = '▌';

/// Running state of one streamed response.
///
/// Only the accumulated text is stored.  The cursor-marked view handed to a
/// renderer is computed by [`StreamAccumulator::display`] each time it is
/// asked for.
///
/// ```
/// # use palaver::StreamAccumulator;
/// let mut acc = StreamAccumulator::new();
/// acc.push("Hi");
/// assert_eq!(acc.display(), "Hi▌");
/// acc.push(" there!");
/// assert_eq!(acc.final_display(), "Hi there!");
/// assert_eq!(acc.finish().content, "Hi there!");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamAccumulator {
    text: String,
    fragments: usize,
}

impl StreamAccumulator {
    /// Start an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate every fragment of a finite sequence, in order.
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut acc = Self::new();
        for fragment in fragments {
            acc.push(fragment.as_ref());
        }
        acc
    }

    /// Append the next fragment.  Empty fragments are counted too.
    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        self.fragments += 1;
    }

    /// The text gathered so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How many fragments have been applied.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// The in-progress view: accumulated text followed by [`CURSOR_MARKER`].
    pub fn display(&self) -> String {
        let mut display = String::with_capacity(self.text.len() + CURSOR_MARKER.len_utf8());
        display.push_str(&self.text);
        display.push(CURSOR_MARKER);
        display
    }

    /// The view once the stream is exhausted: the text with no marker.
    pub fn final_display(&self) -> &str {
        &self.text
    }

    /// Complete the response as an assistant message.
    ///
    /// A stream with zero fragments yields an empty message, which is valid.
    pub fn finish(self) -> Message {
        Message::assistant(self.text)
    }

    /// Complete a response whose stream ended abnormally.
    ///
    /// The partial text is kept and the message is flagged as truncated.
    pub fn abort(self) -> Message {
        Message::assistant(self.text).into_truncated()
    }
}

/// Strip a trailing [`CURSOR_MARKER`] from a display value, if present.
pub fn strip_cursor(display: &str) -> &str {
    display.strip_suffix(CURSOR_MARKER).unwrap_or(display)
}
