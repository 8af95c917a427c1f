//! Output rendering for the chat transcript and streamed responses.
//!
//! This module provides the renderer trait the turn handler writes through
//! and a plain-text implementation for terminals.

use std::io::{self, Write};

use crate::chat::style::Style;
use crate::types::{ChatMessage, Role};
use crate::utils::time::clock;

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for dim text.
const ANSI_DIM: &str = "\x1b[2m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Print a chunk of response text.
    ///
    /// This is called incrementally as tokens are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Print one chain-of-thought research event.
    ///
    /// Research output is displayed differently to distinguish it from the
    /// final answer.
    fn print_research(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print a stored transcript entry.
    fn print_message(&mut self, message: &ChatMessage) {
        let label = match message.role() {
            Role::User => "YOU",
            Role::Assistant => "AI",
            Role::System => "SYS",
        };
        self.print_info(&format!(
            "[{}] {label}: {}",
            clock(message.timestamp()),
            message.content()
        ));
    }

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);
}

/// Plain text renderer with optional ANSI styling.
///
/// Responses and notices go to the output writer (stdout by default) and
/// errors to the error writer (stderr by default).
pub struct PlainTextRenderer {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    style: Style,
    use_color: bool,
    line_start: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_style(Style::default(), true)
    }

    /// Creates a renderer using the colours from `style`.
    pub fn with_style(style: Style, use_color: bool) -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()), style, use_color)
    }

    /// Creates a renderer writing to the given sinks.
    pub fn with_writers(
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
        style: Style,
        use_color: bool,
    ) -> Self {
        Self {
            out,
            err,
            style,
            use_color,
            line_start: true,
        }
    }

    /// The style in use.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Prints the startup banner unless the style disables it.
    pub fn print_banner(&mut self) {
        if !self.style.banner {
            return;
        }
        self.print_info("APPLE ][ e CHAT INTERFACE");
        self.print_info("]READY");
    }

    fn write_colored(&mut self, color: &'static str, text: &str) {
        if self.use_color {
            let _ = write!(self.out, "{color}{text}{ANSI_RESET}");
        } else {
            let _ = write!(self.out, "{text}");
        }
        if !text.is_empty() {
            self.line_start = text.ends_with('\n');
        }
        let _ = self.out.flush();
    }

    fn ensure_line_start(&mut self) {
        if !self.line_start {
            let _ = writeln!(self.out);
            self.line_start = true;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_text(&mut self, text: &str) {
        self.write_colored(self.style.text.ansi(), text);
    }

    fn print_research(&mut self, text: &str) {
        self.ensure_line_start();
        if self.use_color {
            let color = self.style.research.ansi();
            let _ = writeln!(self.out, "{ANSI_DIM}{color}{text}{ANSI_RESET}");
        } else {
            let _ = writeln!(self.out, "[research] {text}");
        }
        self.line_start = true;
        let _ = self.out.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.ensure_line_start();
        let _ = self.out.flush();
        if self.use_color {
            let color = self.style.error.ansi();
            let _ = writeln!(self.err, "{color}?ERROR: {error}{ANSI_RESET}");
        } else {
            let _ = writeln!(self.err, "?ERROR: {error}");
        }
        let _ = self.err.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.ensure_line_start();
        self.write_colored(self.style.text.ansi(), &format!("{info}\n"));
    }

    fn finish_response(&mut self) {
        self.ensure_line_start();
        let _ = self.out.flush();
    }
}
