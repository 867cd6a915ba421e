//! Data sources, the producers behind each block.
//!
//! A source fetches and formats its own data; the rendering core only ever
//! sees the resulting items.  Fetch failures never reach the core: they are
//! turned into a single red status line inside the affected block.

pub mod format;
pub mod header;
pub mod metrics;
pub mod network;
pub mod pool;
pub mod ticker;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::core::block::Producer;
use crate::core::item::Item;
use crate::ui::theme::Theme;

/// Timeout applied to every HTTP request a source makes.
pub const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

/// Something that can produce a block's items.
pub trait Source: Send + 'static {
    /// Short name used in error lines and logs.
    fn name(&self) -> &str;
    fn fetch(&mut self) -> anyhow::Result<Vec<Item>>;
}

/// Wrap a source as a block producer that degrades errors to a status line.
///
/// A panicking source is contained the same way: the block shows the panic
/// message and the next refresh calls the source again.
pub fn into_producer<S: Source>(mut source: S, theme: Theme) -> Producer {
    Box::new(move || {
        let fetched = panic::catch_unwind(AssertUnwindSafe(|| source.fetch()));
        match fetched {
            Ok(Ok(items)) => items,
            Ok(Err(err)) => {
                tracing::warn!("{} fetch failed: {err:#}", source.name());
                theme.error_items(source.name(), format!("{err:#}"))
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                tracing::error!("{} panicked: {msg}", source.name());
                theme.error_items(source.name(), format!("internal error: {msg}"))
            }
        }
    })
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}

/// Shared blocking HTTP client with the standard timeout.
pub fn http_client() -> anyhow::Result<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
