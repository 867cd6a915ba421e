//! Drawing surface: the character grid the dashboard paints on.
//!
//! Writes are staged into an off-screen [`Buffer`] and handed to Ratatui in
//! one `draw` call on [`Surface::flip`].  Ratatui diffs against the previous
//! frame, so a flip never shows a half-painted screen.

use anyhow::Result;
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Rect, Size},
    Terminal,
};

use super::palette::{PairId, Palette};

/// What the dashboard needs from a terminal.
pub trait Surface {
    /// Current `(rows, cols)`.
    fn dimensions(&self) -> Result<(u16, u16)>;
    /// Blank the staged frame.
    fn erase(&mut self);
    /// Stage `text` at `(row, col)`.  Text past the right edge is dropped.
    fn write_at(&mut self, row: u16, col: u16, text: &str, pair: PairId);
    /// Push the staged frame to the screen.
    fn flip(&mut self) -> Result<()>;
    fn set_cursor_visible(&mut self, visible: bool) -> Result<()>;
    /// Wipe the physical screen so the next flip repaints every cell.
    fn clear(&mut self) -> Result<()>;
    /// Adopt new dimensions.
    fn resize(&mut self, rows: u16, cols: u16) -> Result<()>;
}

/// [`Surface`] backed by a Ratatui terminal.
pub struct TerminalSurface<B: Backend> {
    terminal: Terminal<B>,
    staged: Buffer,
    palette: Palette,
}

impl<B> TerminalSurface<B>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(terminal: Terminal<B>, palette: Palette) -> Result<Self> {
        let Size { width, height } = terminal.size()?;
        Ok(Self {
            terminal,
            staged: Buffer::empty(Rect::new(0, 0, width, height)),
            palette,
        })
    }

    #[cfg(test)]
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    #[cfg(test)]
    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }
}

impl<B> Surface for TerminalSurface<B>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    fn dimensions(&self) -> Result<(u16, u16)> {
        let Size { width, height } = self.terminal.size()?;
        Ok((height, width))
    }

    fn erase(&mut self) {
        self.staged.reset();
    }

    fn write_at(&mut self, row: u16, col: u16, text: &str, pair: PairId) {
        let area = self.staged.area;
        if row >= area.height || col >= area.width {
            return;
        }
        let room = usize::from(area.width - col);
        let style = self.palette.style(pair);
        self.staged.set_stringn(col, row, text, room, style);
    }

    fn flip(&mut self) -> Result<()> {
        let staged = &self.staged;
        self.terminal.draw(|frame| {
            frame.buffer_mut().merge(staged);
        })?;
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        if visible {
            self.terminal.show_cursor()?;
        } else {
            self.terminal.hide_cursor()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.terminal.clear()?;
        Ok(())
    }

    fn resize(&mut self, rows: u16, cols: u16) -> Result<()> {
        let area = Rect::new(0, 0, cols, rows);
        self.terminal.resize(area)?;
        self.staged = Buffer::empty(area);
        Ok(())
    }
}
