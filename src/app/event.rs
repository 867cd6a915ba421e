//! Keyboard listener.
//!
//! A background thread blocks on short-timeout terminal reads and forwards
//! every keypress over an unbounded channel, so the render loop only ever
//! does a non-blocking `try_recv`.  The listener never draws; the channel is
//! the only thing it shares with the render loop.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;
use tracing::Dispatch;

/// How long a single read waits for input.
const READ_TIMEOUT: Duration = Duration::from_millis(50);
/// Pause between reads to bound CPU usage.
const IDLE_SLEEP: Duration = Duration::from_millis(25);

/// Receiving end of the keypress queue.
pub type KeyReceiver = mpsc::UnboundedReceiver<KeyEvent>;

/// A blocking "next key, or nothing within `timeout`" primitive.
pub trait KeySource: Send + 'static {
    fn read_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

/// Reads keypresses from the controlling terminal via crossterm.
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn read_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            // Release/repeat events would double every keystroke on
            // terminals that report them.
            Event::Key(k) if k.kind == KeyEventKind::Press => Ok(Some(k)),
            _ => Ok(None),
        }
    }
}

/// Handle to the running listener thread.
pub struct InputListener {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputListener {
    /// Start reading from `source` on a new thread.
    pub fn spawn<K: KeySource>(mut source: K, log: Dispatch) -> io::Result<(Self, KeyReceiver)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("input-listener".into())
            .spawn(move || {
                let _log = tracing::dispatcher::set_default(&log);
                tracing::debug!("input listener started");
                while !flag.load(Ordering::Relaxed) {
                    match source.read_key(READ_TIMEOUT) {
                        Ok(Some(key)) => {
                            if tx.send(key).is_err() {
                                break; // receiver dropped
                            }
                        }
                        Ok(None) => {}
                        // Treated as "no input this cycle"; try again next time round.
                        Err(err) => tracing::debug!("key read failed: {err}"),
                    }
                    std::thread::sleep(IDLE_SLEEP);
                }
                tracing::debug!("input listener stopped");
            })?;

        Ok((
            Self {
                stop,
                handle: Some(handle),
            },
            rx,
        ))
    }

    /// Signal the thread and wait for its current iteration to finish.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("input listener panicked");
            }
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for InputListener {
    fn drop(&mut self) {
        self.stop();
    }
}
