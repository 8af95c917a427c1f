//! Terminal colour scheme loaded from a YAML style sheet.
//!
//! A style sheet looks like:
//!
//! ```yaml
//! text: bright_green
//! research: green
//! error: red
//! banner: true
//! ```
//!
//! Every key is optional. Unknown keys and colour names are rejected.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One of the ANSI terminal colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Gray,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightWhite,
}

impl Color {
    /// The escape sequence that switches the foreground to this colour.
    pub fn ansi(self) -> &'static str {
        match self {
            Color::Black => "\x1b[30m",
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Blue => "\x1b[34m",
            Color::Magenta => "\x1b[35m",
            Color::Cyan => "\x1b[36m",
            Color::White => "\x1b[37m",
            Color::Gray => "\x1b[90m",
            Color::BrightRed => "\x1b[91m",
            Color::BrightGreen => "\x1b[92m",
            Color::BrightYellow => "\x1b[93m",
            Color::BrightWhite => "\x1b[97m",
        }
    }
}

/// Colours for each kind of output plus the banner toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Style {
    /// Prompts, responses and notices.
    pub text: Color,
    /// Chain-of-thought research output.
    pub research: Color,
    /// Error notices.
    pub error: Color,
    /// Whether to print the startup banner.
    pub banner: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            text: Color::BrightGreen,
            research: Color::Green,
            error: Color::BrightRed,
            banner: true,
        }
    }
}

impl Style {
    /// Loads the style sheet at `path`.
    ///
    /// A missing file is not an error: a warning is logged and the default
    /// style is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Style`] when the file cannot be read or is not a
    /// valid style sheet.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).map_err(|err| match err {
                Error::Style { message, source } => Error::Style {
                    message: format!("{}: {message}", path.display()),
                    source,
                },
                err => err,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "style sheet not found; using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(Error::style(
                format!("cannot read {}: {err}", path.display()),
                Some(Box::new(err)),
            )),
        }
    }

    /// Parses a style sheet. An empty document yields the default style.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Style`] for malformed YAML, unknown keys or unknown
    /// colour names.
    pub fn parse(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
            .map_err(|err| Error::style(err.to_string(), Some(Box::new(err))))
    }
}
