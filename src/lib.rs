//! # orderscan
//!
//! Extract text or structured order data from an image or a PDF.
//!
//! Three interchangeable backends:
//!
//! | Method | Engine | Output |
//! |--------|--------|--------|
//! | `local-fast` | tesseract, Latin script | plain text |
//! | `local-accurate` | tesseract, Latin + traditional Chinese, TSV | line regions with confidence |
//! | `remote-structured` | vision LLM over a chat-completion API | [`OrderRecord`] |
//!
//! PDFs are always rasterised with pdfium and OCR'd page by page with the
//! fast backend.
//!
//! ## Pipeline Overview
//!
//! ```text
//! path + method
//!  │
//!  ├─ dispatch   extension → image | pdf | unsupported
//!  ├─ local      tesseract subprocess (spawn_blocking)
//!  ├─ pdf        pdfium render → per-page OCR → join with "\n"
//!  └─ remote     base64 data-URI → chat completion → strip fence → schema
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orderscan::{recognize, Method, RecognizeConfig, RecognitionOutput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RecognizeConfig::builder().api_token("sk-...").build()?;
//!     match recognize("invoice.png", Some(Method::RemoteStructured), &config).await? {
//!         RecognitionOutput::Order(order) => println!("{} items", order.items.len()),
//!         other => println!("{other:?}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `orderscan` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Runtime requirements
//!
//! * `tesseract` on `PATH` (or `--tesseract-cmd`) with the `eng` and
//!   `chi_tra` language packs for the local backends.
//! * A pdfium shared library for PDFs (`PDFIUM_LIB_PATH`, the working
//!   directory, or the system library path).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::load_product_names;
pub use config::{RecognizeConfig, RecognizeConfigBuilder, SamplingParams};
pub use dispatch::{plan, recognize, FileKind, Method, Recognizer, Route};
pub use error::RecognizeError;
pub use output::{BoundingBox, Detection, LineItem, OrderRecord, RecognitionOutput};
pub use progress::{NoopProgressCallback, PageProgressCallback, ProgressCallback};
