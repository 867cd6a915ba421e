//! Colour-pair table.
//!
//! Every `(foreground, background)` combination of [`NamedColor::ALL`] gets
//! a stable numeric id, assigned once by enumerating the product
//! foreground-major.  Id 0 is the terminal's default pair.

use ratatui::style::{Color, Style};

use crate::core::item::NamedColor;

const K: usize = NamedColor::ALL.len();

/// Identifier of a foreground/background pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(pub u16);

impl PairId {
    /// Whatever the terminal uses when no colour is requested.
    pub const DEFAULT: PairId = PairId(0);
}

#[derive(Debug, Clone)]
pub struct Palette {
    ids: [[PairId; K]; K],
    /// `pairs[id - 1]` is the combination behind `id`.
    pairs: Vec<(NamedColor, NamedColor)>,
}

impl Palette {
    pub fn new() -> Self {
        let mut ids = [[PairId::DEFAULT; K]; K];
        let mut pairs = Vec::with_capacity(K * K);
        for fg in NamedColor::ALL {
            for bg in NamedColor::ALL {
                pairs.push((fg, bg));
                ids[fg.index()][bg.index()] = PairId(pairs.len() as u16);
            }
        }
        Self { ids, pairs }
    }

    pub fn resolve(&self, fg: NamedColor, bg: NamedColor) -> PairId {
        self.ids[fg.index()][bg.index()]
    }

    /// Number of assigned pairs (excluding the default).
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Drawing style for a pair id; unknown ids fall back to the default.
    pub fn style(&self, id: PairId) -> Style {
        match (id.0 as usize).checked_sub(1).and_then(|i| self.pairs.get(i)) {
            Some(&(fg, bg)) => Style::default().fg(to_color(fg)).bg(to_color(bg)),
            None => Style::default(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

fn to_color(c: NamedColor) -> Color {
    match c {
        NamedColor::Black => Color::Black,
        NamedColor::Red => Color::Red,
        NamedColor::Green => Color::Green,
        NamedColor::Yellow => Color::Yellow,
        NamedColor::Blue => Color::Blue,
        NamedColor::Magenta => Color::Magenta,
        NamedColor::Cyan => Color::Cyan,
        NamedColor::White => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_pair_gets_a_distinct_id() {
        let palette = Palette::new();
        let mut seen = HashSet::new();
        for fg in NamedColor::ALL {
            for bg in NamedColor::ALL {
                let id = palette.resolve(fg, bg);
                assert_ne!(id, PairId::DEFAULT);
                assert!(seen.insert(id));
            }
        }
        assert_eq!(palette.len(), 64);
    }

    #[test]
    fn ids_follow_fixed_colour_order() {
        let palette = Palette::new();
        assert_eq!(palette.resolve(NamedColor::Black, NamedColor::Black), PairId(1));
        assert_eq!(palette.resolve(NamedColor::Black, NamedColor::Red), PairId(2));
        assert_eq!(palette.resolve(NamedColor::Red, NamedColor::Black), PairId(9));
        assert_eq!(palette.resolve(NamedColor::White, NamedColor::White), PairId(64));
    }

    #[test]
    fn style_round_trips_the_pair() {
        let palette = Palette::new();
        let id = palette.resolve(NamedColor::Blue, NamedColor::Black);
        let style = palette.style(id);
        assert_eq!(style.fg, Some(Color::Blue));
        assert_eq!(style.bg, Some(Color::Black));
        assert_eq!(palette.style(PairId::DEFAULT), Style::default());
        assert_eq!(palette.style(PairId(999)), Style::default());
    }
}
