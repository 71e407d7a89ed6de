//! Error types for the orderscan library.
//!
//! Every recognition path returns [`RecognizeError`] so the caller decides how
//! to present a failure. Nothing in the library prints or swallows errors.
//!
//! The variants group into four families:
//!
//! * **Input**: unsupported extension, unreadable file, undecodable image.
//! * **Local engines**: tesseract failures and PDF rasterisation failures.
//! * **Remote**: network, timeout, authentication, malformed envelope,
//!   malformed JSON and schema mismatches from the vision model.
//! * **Setup**: invalid configuration, unreadable catalog spreadsheet.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the orderscan library.
#[derive(Debug, Error)]
pub enum RecognizeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The file extension is not an image or a PDF.
    #[error("Unsupported file format: '{extension}'\nSupported: .jpg .jpeg .png .bmp .tiff .pdf")]
    UnsupportedFormat { extension: String },

    /// The file does not exist or could not be read.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but could not be decoded as an image.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageLoad { path: PathBuf, detail: String },

    // ── Local engine errors ───────────────────────────────────────────────
    /// The OCR engine could not be started or reported a failure.
    #[error("OCR engine '{engine}' failed: {detail}")]
    Engine { engine: String, detail: String },

    /// The PDF could not be opened or one of its pages could not be rendered.
    #[error("Failed to render PDF '{path}': {detail}")]
    PdfRender { path: PathBuf, detail: String },

    // ── Remote errors ─────────────────────────────────────────────────────
    /// Transport failure or a non-success HTTP status other than 401/403.
    #[error("Network error: {detail}")]
    Network { detail: String },

    /// The model endpoint did not answer within the configured timeout.
    #[error("Request timed out after {secs}s\nIncrease --timeout.")]
    Timeout { secs: u64 },

    /// Missing credential, or the endpoint answered 401/403.
    #[error("Authentication failed{}: {detail}", http_suffix(.status))]
    Auth { status: Option<u16>, detail: String },

    /// The response envelope lacks the expected `choices[0].message.content`.
    #[error("Malformed response from model endpoint: {detail}")]
    MalformedResponse { detail: String },

    /// The model's reply could not be parsed as JSON.
    #[error("Model reply is not valid JSON: {detail}")]
    MalformedJson { detail: String },

    /// The JSON parsed but does not match the order schema.
    #[error("Model reply does not match the order schema: {detail}")]
    SchemaValidation { detail: String },

    // ── Setup errors ──────────────────────────────────────────────────────
    /// The product catalog spreadsheet could not be read.
    #[error("Failed to read catalog '{path}': {detail}")]
    Catalog { path: PathBuf, detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecognizeError {
    /// Whether repeating the same request could plausibly succeed.
    ///
    /// Only transport-level failures qualify. Authentication and parsing
    /// failures will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecognizeError::Network { .. } | RecognizeError::Timeout { .. }
        )
    }

    pub(crate) fn engine(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        RecognizeError::Engine {
            engine: engine.into(),
            detail: detail.into(),
        }
    }
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}
