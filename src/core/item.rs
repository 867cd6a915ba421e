//! The unit of dashboard content: a positioned, coloured text fragment.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::config::ConfigError;

// ───────────────────────────────────────── colours ───────────

/// One of the eight basic terminal colours.
///
/// The declaration order is significant: [`NamedColor::ALL`] fixes the
/// enumeration order the palette uses to assign pair ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl NamedColor {
    /// Every colour, in palette order.
    pub const ALL: [NamedColor; 8] = [
        NamedColor::Black,
        NamedColor::Red,
        NamedColor::Green,
        NamedColor::Yellow,
        NamedColor::Blue,
        NamedColor::Magenta,
        NamedColor::Cyan,
        NamedColor::White,
    ];

    /// Position of this colour in [`NamedColor::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            NamedColor::Black => "black",
            NamedColor::Red => "red",
            NamedColor::Green => "green",
            NamedColor::Yellow => "yellow",
            NamedColor::Blue => "blue",
            NamedColor::Magenta => "magenta",
            NamedColor::Cyan => "cyan",
            NamedColor::White => "white",
        }
    }
}

impl fmt::Display for NamedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NamedColor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        NamedColor::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownColor(s.to_string()))
    }
}

impl TryFrom<String> for NamedColor {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ───────────────────────────────────────── item ──────────────

/// A text fragment placed in a `(row, column)` cell of its block.
///
/// Producers set everything except `x`; the absolute horizontal offset is
/// filled in by [`columnize`](super::layout::columnize).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub row: usize,
    pub column: usize,
    pub text: String,
    pub fg: NamedColor,
    pub bg: NamedColor,
    pub x: Option<usize>,
}

impl Item {
    /// White-on-black item with no position assigned yet.
    pub fn new(row: usize, column: usize, text: impl Into<String>) -> Self {
        Self {
            row,
            column,
            text: text.into(),
            fg: NamedColor::White,
            bg: NamedColor::Black,
            x: None,
        }
    }

    pub fn fg(mut self, color: NamedColor) -> Self {
        self.fg = color;
        self
    }

    pub fn bg(mut self, color: NamedColor) -> Self {
        self.bg = color;
        self
    }
}

/// Height of a block's item set: `max(row) + 1`, or 0 when empty.
pub fn block_height(items: &[Item]) -> usize {
    items.iter().map(|i| i.row + 1).max().unwrap_or(0)
}
