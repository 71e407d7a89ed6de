//! Recognition stages.
//!
//! Each submodule implements one stage. The dispatcher in
//! [`crate::dispatch`] chains them per route:
//!
//! ```text
//! image ──▶ tesseract ────────────────────────────▶ text
//! image ──▶ accurate ─────────────────────────────▶ detections
//! pdf   ──▶ render ──▶ tesseract (per page) ──▶ pdf ▶ text
//! image ──▶ encode ──▶ llm ──▶ normalize ──▶ schema ▶ order
//! ```
//!
//! 1. [`tesseract`]: fast Latin-script OCR through the tesseract CLI
//! 2. [`accurate`]: multi-script OCR with line regions and confidences
//! 3. [`render`]: rasterise PDF pages via pdfium
//! 4. [`pdf`]: OCR rendered pages and join them in page order
//! 5. [`encode`]: file bytes → base64 data-URI
//! 6. [`llm`]: the vision-model call; the only stage with network I/O
//! 7. [`normalize`]: strip markdown fences and parse JSON
//! 8. [`schema`]: coerce the JSON into an [`crate::output::OrderRecord`]

pub mod accurate;
pub mod encode;
pub mod llm;
pub mod normalize;
pub mod pdf;
pub mod render;
pub mod schema;
pub mod tesseract;

use crate::error::RecognizeError;

/// Run a blocking stage on tokio's blocking pool.
pub(crate) async fn run_blocking<T, F>(what: &str, f: F) -> Result<T, RecognizeError>
where
    F: FnOnce() -> Result<T, RecognizeError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RecognizeError::Internal(format!("{what} task panicked: {e}")))?
}
