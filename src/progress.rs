//! Progress-callback trait for per-item conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::RelayConfigBuilder::progress_callback`] to receive events
//! as the Composer embeds each image or the Stitcher places each page.
//!
//! # Example
//!
//! ```rust
//! use docrelay::{ConversionProgressCallback, RelayConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, item: usize, total: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("item {item}/{total} done");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = RelayConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipelines as they process each item.
///
/// Items are numbered from 1 in sequence order. Events are emitted from the
/// blocking worker thread that assembles the artifact, so implementations
/// must be `Send + Sync`. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first item is processed.
    fn on_conversion_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called when an item became a page (Composer) or was placed (Stitcher).
    fn on_item_complete(&self, item: usize, total_items: usize) {
        let _ = (item, total_items);
    }

    /// Called when an item fails: the Composer skips it, the Stitcher aborts.
    fn on_item_error(&self, item: usize, total_items: usize, error: &str) {
        let _ = (item, total_items, error);
    }

    /// Called once after every item has been attempted.
    fn on_conversion_complete(&self, total_items: usize, success_count: usize) {
        let _ = (total_items, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RelayConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        completes: AtomicUsize,
        errors: AtomicUsize,
        success_total: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_item_complete(&self, _item: usize, _total: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_error(&self, _item: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total: usize, success_count: usize) {
            self.success_total.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(3);
        cb.on_item_complete(1, 3);
        cb.on_item_error(2, 3, "corrupt");
        cb.on_conversion_complete(3, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_conversion_start(3);
        cb.on_item_complete(1, 3);
        cb.on_item_error(2, 3, "corrupt");
        cb.on_item_complete(3, 3);
        cb.on_conversion_complete(3, 2);

        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.success_total.load(Ordering::SeqCst), 2);
    }
}
