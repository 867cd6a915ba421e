//! Scroll position over the stacked blocks.
//!
//! The content is `line_counter` logical rows tall, the last of which is the
//! blank separator after the final block.  Scrolling stops once the last
//! content row sits on the bottom line of the screen, so the furthest
//! position is `line_counter − rows − 1`.

/// Viewport state: where the screen's first row points into the content.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    /// First logical row shown on screen.
    pub offset: usize,
    /// Total logical rows as of the last frame.
    pub line_counter: usize,
    /// Visible terminal rows.
    pub rows: usize,
}

impl ScrollState {
    pub fn new(rows: usize) -> Self {
        Self {
            offset: 0,
            line_counter: 0,
            rows,
        }
    }

    /// Furthest offset that still shows real content.
    pub fn last_offset(&self) -> usize {
        self.line_counter.saturating_sub(self.rows + 1)
    }

    /// Returns `true` if the offset moved.
    pub fn scroll_down(&mut self) -> bool {
        if self.offset < self.last_offset() {
            self.offset += 1;
            true
        } else {
            false
        }
    }

    pub fn scroll_up(&mut self) -> bool {
        if self.offset != 0 {
            self.offset -= 1;
            true
        } else {
            false
        }
    }

    pub fn page_down(&mut self) -> bool {
        let step = self.rows.saturating_sub(1).max(1);
        self.jump_to((self.offset + step).min(self.last_offset()))
    }

    pub fn page_up(&mut self) -> bool {
        let step = self.rows.saturating_sub(1).max(1);
        self.jump_to(self.offset.saturating_sub(step))
    }

    pub fn top(&mut self) -> bool {
        self.jump_to(0)
    }

    /// Jump so the last content row is on the bottom line.  A no-op when
    /// everything already fits.
    pub fn bottom(&mut self) -> bool {
        self.jump_to(self.last_offset())
    }

    /// Pull the offset back into range after the content shrank.
    pub fn clamp(&mut self) {
        self.offset = self.offset.min(self.last_offset());
    }

    fn jump_to(&mut self, offset: usize) -> bool {
        let changed = self.offset != offset;
        self.offset = offset;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(line_counter: usize, rows: usize) -> ScrollState {
        ScrollState {
            offset: 0,
            line_counter,
            rows,
        }
    }

    #[test]
    fn never_scrolls_above_top() {
        let mut s = state(100, 24);
        assert!(!s.scroll_up());
        assert_eq!(s.offset, 0);
        assert!(!s.page_up());
    }

    #[test]
    fn scrolling_down_stops_at_last_offset() {
        let mut s = state(30, 24);
        let mut moves = 0;
        while s.scroll_down() {
            moves += 1;
        }
        assert_eq!(moves, 5);
        assert_eq!(s.offset, s.last_offset());
        assert!(s.offset < s.line_counter - s.rows);
    }

    #[test]
    fn content_that_fits_does_not_scroll() {
        let mut s = state(24, 24);
        assert!(!s.scroll_down());
        assert!(!s.bottom());
        assert!(!s.page_down());
        assert_eq!(s.offset, 0);
    }

    #[test]
    fn bottom_and_top_jump() {
        let mut s = state(50, 20);
        assert!(s.bottom());
        assert_eq!(s.offset, 29);
        assert!(!s.scroll_down());
        assert!(s.top());
        assert_eq!(s.offset, 0);
    }

    #[test]
    fn paging_moves_a_screen_less_one() {
        let mut s = state(100, 11);
        assert!(s.page_down());
        assert_eq!(s.offset, 10);
        s.offset = 85;
        assert!(s.page_down());
        assert_eq!(s.offset, 88);
        assert!(s.page_up());
        assert_eq!(s.offset, 78);
    }

    #[test]
    fn clamp_after_content_shrinks() {
        let mut s = state(60, 20);
        s.bottom();
        s.line_counter = 25;
        s.clamp();
        assert_eq!(s.offset, 4);
        s.line_counter = 3;
        s.clamp();
        assert_eq!(s.offset, 0);
    }
}
