//! The pager: stacks the blocks top to bottom, scrolls them, and keeps the
//! screen in step with terminal resizes.
//!
//! Everything here runs on one thread.  The only other thread is the
//! [`InputListener`](super::event::InputListener), whose keys arrive through
//! the channel and are drained one per poll step.

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::KeyEvent;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::Dispatch;

use crate::config::{Action, KeyMap};
use crate::core::block::RefreshCache;
use crate::core::layout::text_width;
use crate::ui::palette::Palette;
use crate::ui::surface::Surface;

use super::event::KeyReceiver;
use super::scroll::ScrollState;

/// Granularity of the poll loop; resize and keys are noticed this quickly.
pub const POLL_STEP: Duration = Duration::from_millis(50);

const ELLIPSIS: &str = "…";

/// Where the dashboard is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Running,
    Stopping,
}

pub struct Dashboard<S: Surface> {
    surface: S,
    palette: Palette,
    blocks: Vec<RefreshCache>,
    keys: KeyReceiver,
    keymap: KeyMap,
    interval: Duration,
    scroll: ScrollState,
    cols: usize,
    mode: Mode,
    next_refresh: Instant,
    frames: u64,
    log: Dispatch,
}

impl<S: Surface> Dashboard<S> {
    pub fn new(
        surface: S,
        palette: Palette,
        blocks: Vec<RefreshCache>,
        keys: KeyReceiver,
        keymap: KeyMap,
        interval: Duration,
        log: Dispatch,
    ) -> Result<Self> {
        let (rows, cols) = surface.dimensions()?;
        Ok(Self {
            surface,
            palette,
            blocks,
            keys,
            keymap,
            interval,
            scroll: ScrollState::new(usize::from(rows)),
            cols: usize::from(cols),
            mode: Mode::Running,
            next_refresh: Instant::now() + interval,
            frames: 0,
            log,
        })
    }

    #[cfg(test)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[cfg(test)]
    pub fn scroll(&self) -> ScrollState {
        self.scroll
    }

    /// Number of full redraws so far.
    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[cfg(test)]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[cfg(test)]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Drive the dashboard until a quit key arrives.
    pub fn run(&mut self) -> Result<()> {
        let log = self.log.clone();
        tracing::dispatcher::with_default(&log, || {
            let titles: Vec<&str> = self.blocks.iter().map(RefreshCache::title).collect();
            tracing::info!("dashboard started: {}", titles.join(", "));
            self.surface.set_cursor_visible(false)?;
            self.display()?;
            self.next_refresh = Instant::now() + self.interval;

            while self.step(Instant::now())? == Mode::Running {
                let remaining = self.next_refresh.saturating_duration_since(Instant::now());
                std::thread::sleep(POLL_STEP.min(remaining).max(Duration::from_millis(1)));
            }

            tracing::info!("dashboard stopping after {} frames", self.frames);
            if let Err(err) = self.surface.set_cursor_visible(true) {
                tracing::warn!("could not restore cursor: {err:#}");
            }
            Ok(())
        })
    }

    /// One poll step: resize first, then at most one key, then the periodic
    /// refresh if it is due.
    pub fn step(&mut self, now: Instant) -> Result<Mode> {
        if self.poll_resize()? {
            // Resize restarts the interval and pre-empts input this step.
            self.next_refresh = now + self.interval;
            return Ok(self.mode);
        }

        match self.keys.try_recv() {
            Ok(key) => {
                if self.handle_key(key) {
                    self.display()?;
                }
                if self.mode == Mode::Stopping {
                    return Ok(self.mode);
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("input listener went away; stopping");
                self.mode = Mode::Stopping;
                return Ok(self.mode);
            }
        }

        if now >= self.next_refresh {
            self.display()?;
            self.next_refresh = now + self.interval;
        }
        Ok(self.mode)
    }

    /// Redraw if the terminal changed size since the last check.
    pub fn poll_resize(&mut self) -> Result<bool> {
        let (rows, cols) = self.surface.dimensions()?;
        let (rows, cols) = (usize::from(rows), usize::from(cols));
        if rows == self.scroll.rows && cols == self.cols {
            return Ok(false);
        }
        tracing::debug!("resize {}x{} -> {}x{}", self.cols, self.scroll.rows, cols, rows);
        self.scroll.rows = rows;
        self.cols = cols;
        self.surface.clear()?;
        self.surface.resize(rows as u16, cols as u16)?;
        self.display()?;
        Ok(true)
    }

    /// Apply one key.  Returns `true` when the view needs redrawing.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = self.keymap.match_key(key) else {
            return false;
        };
        let moved = match action {
            Action::ScrollDown => self.scroll.scroll_down(),
            Action::ScrollUp => self.scroll.scroll_up(),
            Action::PageDown => self.scroll.page_down(),
            Action::PageUp => self.scroll.page_up(),
            Action::Top => self.scroll.top(),
            Action::Bottom => self.scroll.bottom(),
            Action::Quit => {
                self.mode = Mode::Stopping;
                false
            }
        };
        if moved {
            tracing::trace!("scroll offset now {}", self.scroll.offset);
        }
        moved
    }

    /// Repaint every block from the top.
    ///
    /// All blocks are refreshed before anything is drawn, so the offset can be
    /// clamped against this frame's height rather than the previous one.
    pub fn display(&mut self) -> Result<()> {
        let now = Instant::now();
        for block in &mut self.blocks {
            block.get_items(now);
        }
        self.scroll.line_counter = self
            .blocks
            .iter()
            .map(|b| match b.amount_lines() {
                0 => 0,
                height => height + 1,
            })
            .sum();
        self.scroll.clamp();

        let rows = self.scroll.rows;
        let offset = self.scroll.offset;
        let mut line_counter = 0usize;

        self.surface.erase();
        for block in &self.blocks {
            for item in block.items() {
                let Some(x) = item.x else { continue };
                let Some(y) = (item.row + line_counter).checked_sub(offset) else {
                    continue;
                };
                if y >= rows || x >= self.cols {
                    continue;
                }
                let text = fit(&item.text, self.cols - x);
                let pair = self.palette.resolve(item.fg, item.bg);
                self.surface.write_at(y as u16, x as u16, &text, pair);
            }
            let height = block.amount_lines();
            if height > 0 {
                line_counter += height + 1;
            }
        }
        self.surface.flip()?;
        self.frames += 1;
        Ok(())
    }
}

/// Cut `text` to `room` cells, marking the cut with an ellipsis.
fn fit(text: &str, room: usize) -> String {
    if text_width(text) <= room {
        return text.to_string();
    }
    let budget = room.saturating_sub(text_width(ELLIPSIS));
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = text_width(ch.encode_utf8(&mut [0; 4]));
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    if room >= text_width(ELLIPSIS) {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;
    use tokio::sync::mpsc;

    use crate::core::block::Producer;
    use crate::core::item::{Item, NamedColor};
    use crate::core::layout::LayoutOptions;
    use crate::ui::surface::tests::{screen_row, test_surface};
    use crate::ui::surface::TerminalSurface;

    type TestDash = Dashboard<TerminalSurface<TestBackend>>;

    fn block(producer: Producer) -> RefreshCache {
        RefreshCache::new(
            "test",
            Duration::ZERO,
            LayoutOptions::default(),
            producer,
            Dispatch::none(),
        )
    }

    /// A block of `n` numbered rows.
    fn tall_block(n: usize) -> RefreshCache {
        block(Box::new(move || {
            (0..n).map(|r| Item::new(r, 0, format!("row {r}"))).collect()
        }))
    }

    fn dashboard(
        blocks: Vec<RefreshCache>,
        cols: u16,
        rows: u16,
    ) -> (TestDash, mpsc::UnboundedSender<KeyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dash = Dashboard::new(
            test_surface(cols, rows),
            Palette::new(),
            blocks,
            rx,
            KeyMap::default(),
            Duration::from_secs(3600),
            Dispatch::none(),
        )
        .unwrap();
        (dash, tx)
    }

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn label_and_value_land_where_layout_puts_them() {
        let producer: Producer = Box::new(|| {
            vec![
                Item::new(0, 0, "Label").fg(NamedColor::Blue),
                Item::new(0, 1, "Value"),
            ]
        });
        let (mut dash, _tx) = dashboard(vec![block(producer)], 80, 24);
        dash.display().unwrap();

        let row = screen_row(dash.surface(), 0);
        let gap = LayoutOptions::default().gap;
        assert_eq!(row.find("Label"), Some(0));
        assert_eq!(row.find("Value"), Some("Label".len() + gap));
        let cell = &dash.surface().terminal().backend().buffer()[(0, 0)];
        assert_eq!(cell.fg, ratatui::style::Color::Blue);
    }

    #[test]
    fn blocks_stack_with_one_blank_separator() {
        let empty: Producer = Box::new(Vec::<Item>::new);
        let (mut dash, _tx) =
            dashboard(vec![tall_block(2), block(empty), tall_block(3)], 40, 24);
        dash.display().unwrap();

        assert_eq!(screen_row(dash.surface(), 0).trim(), "row 0");
        assert_eq!(screen_row(dash.surface(), 1).trim(), "row 1");
        assert_eq!(screen_row(dash.surface(), 2).trim(), "");
        assert_eq!(screen_row(dash.surface(), 3).trim(), "row 0");
        assert_eq!(dash.scroll().line_counter, 2 + 1 + 3 + 1);
    }

    #[test]
    fn overlong_text_is_truncated_with_ellipsis() {
        let producer: Producer = Box::new(|| vec![Item::new(0, 0, "abcdefghijklmnop")]);
        let (mut dash, _tx) = dashboard(vec![block(producer)], 8, 2);
        dash.display().unwrap();
        assert_eq!(screen_row(dash.surface(), 0), "abcdefg…");
    }

    #[test]
    fn rows_outside_the_screen_are_skipped() {
        let (mut dash, _tx) = dashboard(vec![tall_block(10)], 20, 4);
        dash.display().unwrap();
        dash.scroll.offset = 2;
        dash.display().unwrap();
        assert_eq!(screen_row(dash.surface(), 0).trim(), "row 2");
        assert_eq!(screen_row(dash.surface(), 3).trim(), "row 5");
    }

    #[test]
    fn keys_are_consumed_one_per_step_in_order() {
        let (mut dash, tx) = dashboard(vec![tall_block(40)], 20, 10);
        dash.display().unwrap();
        for c in ['j', 'j', 'k', 'q'] {
            tx.send(press(c)).unwrap();
        }

        let now = Instant::now();
        let mut offsets = Vec::new();
        for _ in 0..3 {
            assert_eq!(dash.step(now).unwrap(), Mode::Running);
            offsets.push(dash.scroll().offset);
        }
        assert_eq!(offsets, vec![1, 2, 1]);
        assert_eq!(dash.step(now).unwrap(), Mode::Stopping);
    }

    #[test]
    fn scrolling_redraws_immediately() {
        let (mut dash, tx) = dashboard(vec![tall_block(40)], 20, 10);
        dash.display().unwrap();
        let before = dash.frames();
        tx.send(press('j')).unwrap();
        dash.step(Instant::now()).unwrap();
        assert_eq!(dash.frames(), before + 1);
        assert_eq!(screen_row(dash.surface(), 0).trim(), "row 1");
    }

    #[test]
    fn scroll_down_is_a_noop_when_content_fits() {
        let (mut dash, _tx) = dashboard(vec![tall_block(5)], 20, 24);
        dash.display().unwrap();
        assert!(!dash.handle_key(press('j')));
        assert!(!dash.handle_key(press('G')));
        assert!(!dash.handle_key(press('k')));
        assert_eq!(dash.scroll().offset, 0);
    }

    #[test]
    fn bottom_shows_the_last_row_and_top_returns() {
        let (mut dash, _tx) = dashboard(vec![tall_block(40)], 20, 10);
        dash.display().unwrap();
        assert!(dash.handle_key(press('G')));
        assert_eq!(dash.scroll().offset, 41 - 10 - 1);
        dash.display().unwrap();
        assert_eq!(screen_row(dash.surface(), 9).trim(), "row 39");
        assert!(dash.handle_key(press('g')));
        assert_eq!(dash.scroll().offset, 0);
    }

    #[test]
    fn resize_to_same_dimensions_redraws_once() {
        let (mut dash, _tx) = dashboard(vec![tall_block(3)], 20, 10);
        assert!(!dash.poll_resize().unwrap());

        dash.surface_mut().terminal_mut().backend_mut().resize(30, 12);
        let before = dash.frames();
        assert!(dash.poll_resize().unwrap());
        assert!(!dash.poll_resize().unwrap());
        assert_eq!(dash.frames(), before + 1);
        assert_eq!(dash.scroll().rows, 12);
    }

    #[test]
    fn resize_preempts_key_handling() {
        let (mut dash, tx) = dashboard(vec![tall_block(40)], 20, 10);
        dash.display().unwrap();
        tx.send(press('j')).unwrap();
        dash.surface_mut().terminal_mut().backend_mut().resize(20, 8);

        let now = Instant::now();
        dash.step(now).unwrap();
        assert_eq!(dash.scroll().offset, 0);
        dash.step(now).unwrap();
        assert_eq!(dash.scroll().offset, 1);
    }

    #[test]
    fn quit_keys_stop_the_dashboard() {
        for key in [press('q'), KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)] {
            let (mut dash, tx) = dashboard(vec![tall_block(1)], 20, 5);
            tx.send(key).unwrap();
            assert_eq!(dash.step(Instant::now()).unwrap(), Mode::Stopping);
        }
    }

    #[test]
    fn dropped_listener_stops_the_dashboard() {
        let (mut dash, tx) = dashboard(vec![tall_block(1)], 20, 5);
        drop(tx);
        assert_eq!(dash.step(Instant::now()).unwrap(), Mode::Stopping);
    }

    #[test]
    fn fit_handles_tiny_widths() {
        assert_eq!(fit("hello", 5), "hello");
        assert_eq!(fit("hello", 4), "hel…");
        assert_eq!(fit("hello", 1), "…");
        assert_eq!(fit("hello", 0), "");
        assert_eq!(fit("日本語", 4), "日…");
    }
}
