//! Colours used by the data sources when they build their items.

use crate::core::item::{Item, NamedColor};

/// Central theme. Change colours here (or in the config file) and they
/// propagate to every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub title: NamedColor,
    pub label: NamedColor,
    pub value: NamedColor,
    pub good: NamedColor,
    pub warn: NamedColor,
    pub error: NamedColor,
    pub background: NamedColor,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title: NamedColor::Green,
            label: NamedColor::Blue,
            value: NamedColor::White,
            good: NamedColor::Green,
            warn: NamedColor::Yellow,
            error: NamedColor::Red,
            background: NamedColor::Black,
        }
    }
}

impl Theme {
    pub fn title_item(&self, row: usize, column: usize, text: impl Into<String>) -> Item {
        Item::new(row, column, text).fg(self.title).bg(self.background)
    }

    pub fn label_item(&self, row: usize, text: impl Into<String>) -> Item {
        Item::new(row, 0, text).fg(self.label).bg(self.background)
    }

    pub fn value_item(&self, row: usize, column: usize, text: impl Into<String>) -> Item {
        Item::new(row, column, text).fg(self.value).bg(self.background)
    }

    /// A `label  value` row.
    pub fn pair(&self, row: usize, label: &str, value: impl Into<String>) -> [Item; 2] {
        [self.label_item(row, label), self.value_item(row, 1, value)]
    }

    /// The single-line status a failing source renders instead of its data.
    pub fn error_items(&self, source: &str, err: impl std::fmt::Display) -> Vec<Item> {
        vec![Item::new(0, 0, format!("{source}: {err}"))
            .fg(self.error)
            .bg(self.background)]
    }
}
