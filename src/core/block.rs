//! Time-to-live cache around one data producer.
//!
//! A block only calls its producer when the cached items are older than the
//! TTL, so expensive fetches are not repeated every frame.  The fetch runs
//! synchronously on the caller's thread; producers bound their own latency.

use std::time::{Duration, Instant};

use tracing::Dispatch;

use super::item::{block_height, Item};
use super::layout::{columnize, LayoutOptions};

/// Zero-argument data source.  Any parameters are captured at construction.
pub type Producer = Box<dyn FnMut() -> Vec<Item> + Send>;

/// One independently refreshed unit of dashboard content.
pub struct RefreshCache {
    title: String,
    producer: Producer,
    ttl: Duration,
    layout: LayoutOptions,
    last_fetch: Option<Instant>,
    items: Vec<Item>,
    log: Dispatch,
}

impl RefreshCache {
    pub fn new(
        title: impl Into<String>,
        ttl: Duration,
        layout: LayoutOptions,
        producer: Producer,
        log: Dispatch,
    ) -> Self {
        Self {
            title: title.into(),
            producer,
            ttl,
            layout,
            last_fetch: None,
            items: Vec::new(),
            log,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// `true` when the next [`get_items`](Self::get_items) at `now` will fetch.
    pub fn is_stale(&self, now: Instant) -> bool {
        match self.last_fetch {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.ttl,
        }
    }

    /// Cached items, refreshed first if the TTL has elapsed.
    pub fn get_items(&mut self, now: Instant) -> &[Item] {
        if self.is_stale(now) {
            // Producer logging goes to this block's sink too.
            let fresh = tracing::dispatcher::with_default(&self.log, || {
                let started = Instant::now();
                let fresh = columnize((self.producer)(), self.layout);
                tracing::debug!(
                    "refresh {}: {} items in {:.2?}",
                    self.title,
                    fresh.len(),
                    started.elapsed()
                );
                fresh
            });
            // Swap in the whole set at once.
            self.items = fresh;
            self.last_fetch = Some(now);
        }
        &self.items
    }

    /// The cached items as of the last refresh, without refreshing.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Rows occupied by the cached items (0 when empty).
    pub fn amount_lines(&self) -> usize {
        block_height(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_block(ttl_secs: u64) -> (RefreshCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let producer: Producer = Box::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            vec![Item::new(0, 0, "calls"), Item::new(0, 1, n.to_string())]
        });
        let block = RefreshCache::new(
            "counter",
            Duration::from_secs(ttl_secs),
            LayoutOptions::default(),
            producer,
            Dispatch::none(),
        );
        (block, calls)
    }

    #[test]
    fn fetches_once_within_ttl_and_again_after() {
        let (mut block, calls) = counting_block(5);
        let t0 = Instant::now();

        let first = block.get_items(t0).to_vec();
        let second = block.get_items(t0 + Duration::from_secs(4)).to_vec();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);

        let third = block.get_items(t0 + Duration::from_secs(6)).to_vec();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(third[1].text, "2");
    }

    #[test]
    fn ttl_boundary_is_inclusive() {
        let (mut block, calls) = counting_block(5);
        let t0 = Instant::now();
        block.get_items(t0);
        block.get_items(t0 + Duration::from_secs(5));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_ttl_always_refreshes() {
        let (mut block, calls) = counting_block(0);
        let t0 = Instant::now();
        block.get_items(t0);
        block.get_items(t0);
        block.get_items(t0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn items_come_back_laid_out() {
        let (mut block, _) = counting_block(5);
        let items = block.get_items(Instant::now());
        assert!(items.iter().all(|i| i.x.is_some()));
        assert_eq!(items[1].x, Some("calls".len() + 2));
    }

    #[test]
    fn amount_lines_tracks_cached_set() {
        let mut block = RefreshCache::new(
            "empty",
            Duration::from_secs(1),
            LayoutOptions::default(),
            Box::new(Vec::<Item>::new),
            Dispatch::none(),
        );
        assert_eq!(block.amount_lines(), 0);
        block.get_items(Instant::now());
        assert_eq!(block.amount_lines(), 0);

        let (mut block, _) = counting_block(1);
        block.get_items(Instant::now());
        assert_eq!(block.amount_lines(), 1);
    }
}
