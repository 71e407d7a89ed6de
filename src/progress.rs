//! Progress events for multi-page PDF extraction.
//!
//! Inject an [`Arc<dyn PageProgressCallback>`] via
//! [`crate::config::RecognizeConfigBuilder::progress_callback`] to observe
//! each page as it is rendered and OCR'd. Images and the remote path are
//! single-shot and emit no events.
//!
//! ```rust
//! use orderscan::{PageProgressCallback, RecognizeConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl PageProgressCallback for Counter {
//!     fn on_page_complete(&self, _page: usize, _total: usize, _text_len: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = RecognizeConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the PDF extractor as it processes each page.
///
/// Pages are OCR'd concurrently, so `on_page_start`, `on_page_complete` and
/// `on_page_error` may arrive out of page order and from different threads.
/// All methods default to no-ops.
pub trait PageProgressCallback: Send + Sync {
    /// Called once after rendering, before any page is OCR'd.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page (1-indexed) is handed to the OCR engine.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page's text is ready. `text_len` is in bytes.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when a page fails. The extraction as a whole then fails too.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been attempted.
    fn on_extraction_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// Callback that ignores every event.
pub struct NoopProgressCallback;

impl PageProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::RecognizeConfig`].
pub type ProgressCallback = Arc<dyn PageProgressCallback>;
