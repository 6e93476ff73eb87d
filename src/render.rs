//! Output rendering for the chat front end.
//!
//! This module provides the renderer trait that stands in for the chat
//! widget, plus a plain-text terminal implementation.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::accumulator::{CURSOR_MARKER, strip_cursor};
use crate::types::{Message, MessageRole};

/// ANSI escape code for bold text (used for role labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for truncation notes).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code to erase from the cursor to the end of the line.
const ANSI_ERASE_LINE: &str = "\x1b[K";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling and a live cursor marker
/// - Plain text without styling (for piping/redirecting)
/// - Recording renderers in tests
pub trait Renderer: Send {
    /// Called before the first fragment of an assistant response.
    fn start_response(&mut self) {}

    /// Show the in-progress response.
    ///
    /// `display` is the whole text so far followed by the cursor marker.
    fn update_response(&mut self, display: &str);

    /// Show the finished response; `display` carries no cursor marker.
    fn finish_response(&mut self, display: &str);

    /// Render one stored message of the conversation history.
    fn render_message(&mut self, message: &Message);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// Streams only the not-yet-printed part of each display update.  With color
/// enabled the cursor marker is drawn after the text and erased again when
/// the response finishes.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    printed: usize,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            printed: 0,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    /// Print the part of `text` that has not been printed yet.
    fn print_tail(&mut self, text: &str) {
        if let Some(tail) = text.get(self.printed..) {
            print!("{tail}");
        }
        self.printed = text.len();
    }

    fn label(&self, role: MessageRole) -> String {
        let name = match role {
            MessageRole::User => "You",
            MessageRole::Assistant => "Assistant",
        };
        if self.use_color {
            format!("{ANSI_BOLD}{name}:{ANSI_RESET}")
        } else {
            format!("{name}:")
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self) {
        self.printed = 0;
        println!("{}", self.label(MessageRole::Assistant));
        self.flush();
    }

    fn update_response(&mut self, display: &str) {
        self.print_tail(strip_cursor(display));
        if self.use_color {
            // Draw the marker, then step back so the next text overwrites it.
            print!("{CURSOR_MARKER}\x08");
        }
        self.flush();
    }

    fn finish_response(&mut self, display: &str) {
        self.print_tail(display);
        if self.use_color {
            print!("{ANSI_ERASE_LINE}");
        }
        println!();
        self.printed = 0;
        self.flush();
    }

    fn render_message(&mut self, message: &Message) {
        println!("{}", self.label(message.role));
        println!("{}", message.content);
        if message.truncated {
            if self.use_color {
                println!("{ANSI_DIM}[response incomplete]{ANSI_RESET}");
            } else {
                println!("[response incomplete]");
            }
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("\n{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("\nError: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }

    fn print_interrupted(&mut self) {
        if self.use_color {
            print!("{ANSI_ERASE_LINE}");
        }
        println!("\n[interrupted]");
        self.printed = 0;
        self.flush();
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
