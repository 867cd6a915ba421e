//! Column layout: turn `(row, column)` cells into absolute x offsets.
//!
//! Every column is as wide as its widest occupant across all rows of the
//! block, so values line up vertically no matter how long their labels are.
//! Several items may share one cell; they are laid out left to right in the
//! order the producer emitted them.

use std::collections::BTreeMap;

use unicode_width::UnicodeWidthStr;

use super::item::Item;

/// Spacing knobs for [`columnize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Blank cells between adjacent columns.
    pub gap: usize,
    /// Cells reserved at the start of every row for a row label.
    pub prefix_width: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            gap: 2,
            prefix_width: 0,
        }
    }
}

/// Display width of an item's text in terminal cells.
pub fn text_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Assign `x` to every item so columns align across rows.
///
/// Column `c` starts at `prefix_width + Σ width[i < c] + gap · c`, where
/// `width[i]` is the largest per-row total of column `i`.  A column used by
/// only some rows still reserves its width in all of them.
pub fn columnize(mut items: Vec<Item>, options: LayoutOptions) -> Vec<Item> {
    let Some(column_count) = items.iter().map(|i| i.column + 1).max() else {
        return items;
    };

    // Per-row, per-column occupied width.
    let mut cell_widths: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for item in &items {
        *cell_widths.entry((item.row, item.column)).or_insert(0) += text_width(&item.text);
    }

    let mut max_width = vec![0usize; column_count];
    for (&(_, column), &width) in &cell_widths {
        max_width[column] = max_width[column].max(width);
    }

    let mut starts = Vec::with_capacity(column_count);
    let mut offset = options.prefix_width;
    for (column, width) in max_width.iter().enumerate() {
        starts.push(offset + options.gap * column);
        offset += width;
    }

    // Walk items in emission order; each (row, column) cell keeps a cursor.
    let mut cursors: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for item in &mut items {
        let cursor = cursors
            .entry((item.row, item.column))
            .or_insert(starts[item.column]);
        item.x = Some(*cursor);
        *cursor += text_width(&item.text);
    }

    items
}
