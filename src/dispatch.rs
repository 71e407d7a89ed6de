//! Dispatch: pick a recognition route from the file extension and method.
//!
//! | File kind | Method | Route |
//! |-----------|--------|-------|
//! | image | `local-fast` | [`Route::FastOcr`] |
//! | image | `local-accurate` | [`Route::AccurateOcr`] |
//! | image | `remote-structured` or none | [`Route::Remote`] |
//! | pdf | any | [`Route::PdfText`] |
//!
//! PDFs always go through page OCR; a requested method is ignored for them.

use crate::config::RecognizeConfig;
use crate::error::RecognizeError;
use crate::output::RecognitionOutput;
use crate::pipeline::accurate::AccurateOcr;
use crate::pipeline::llm::RemoteExtractor;
use crate::pipeline::pdf;
use crate::pipeline::tesseract::{TesseractOcr, TextRecognizer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Extensions routed as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff"];

/// Broad class of an input file, decided by extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
}

impl FileKind {
    /// Classify `path` by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, RecognizeError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(FileKind::Image)
        } else if ext == "pdf" {
            Ok(FileKind::Pdf)
        } else {
            Err(RecognizeError::UnsupportedFormat {
                extension: if ext.is_empty() {
                    String::new()
                } else {
                    format!(".{ext}")
                },
            })
        }
    }
}

/// Recognition strategy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    LocalFast,
    LocalAccurate,
    RemoteStructured,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::LocalFast => "local-fast",
            Method::LocalAccurate => "local-accurate",
            Method::RemoteStructured => "remote-structured",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RecognizeError;

    /// Accepts the canonical names and the engine names of older releases
    /// (`tessercart`, `easyOCR`, `llm`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local-fast" | "tesseract" | "tessercart" => Ok(Method::LocalFast),
            "local-accurate" | "easyocr" => Ok(Method::LocalAccurate),
            "remote-structured" | "llm" => Ok(Method::RemoteStructured),
            other => Err(RecognizeError::InvalidConfig(format!(
                "unknown method '{other}' (expected local-fast, local-accurate or remote-structured)"
            ))),
        }
    }
}

/// The backend a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    FastOcr,
    AccurateOcr,
    PdfText,
    Remote,
}

/// Decide the route for `path` without touching the file.
pub fn plan(path: &Path, method: Option<Method>) -> Result<Route, RecognizeError> {
    let route = match FileKind::from_path(path)? {
        FileKind::Pdf => Route::PdfText,
        FileKind::Image => match method {
            Some(Method::LocalFast) => Route::FastOcr,
            Some(Method::LocalAccurate) => Route::AccurateOcr,
            Some(Method::RemoteStructured) | None => Route::Remote,
        },
    };
    Ok(route)
}

/// Owns the backends so engine state and the HTTP client are reused
/// across calls.
pub struct Recognizer {
    config: RecognizeConfig,
    fast: Arc<TesseractOcr>,
    accurate: Arc<AccurateOcr>,
    remote: RemoteExtractor,
}

impl Recognizer {
    pub fn new(config: RecognizeConfig) -> Result<Self, RecognizeError> {
        Ok(Self {
            fast: Arc::new(TesseractOcr::from_config(&config)),
            accurate: Arc::new(AccurateOcr::from_config(&config)),
            remote: RemoteExtractor::from_config(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &RecognizeConfig {
        &self.config
    }

    /// Recognise `path` with the backend chosen by [`plan`].
    pub async fn recognize(
        &self,
        path: &Path,
        method: Option<Method>,
    ) -> Result<RecognitionOutput, RecognizeError> {
        let route = plan(path, method)?;
        info!("Recognising {} via {:?}", path.display(), route);

        match route {
            Route::FastOcr => {
                let fast = Arc::clone(&self.fast);
                let path = path.to_path_buf();
                let text =
                    crate::pipeline::run_blocking("ocr", move || fast.recognize(&path)).await?;
                Ok(RecognitionOutput::Text(text))
            }
            Route::AccurateOcr => {
                let accurate = Arc::clone(&self.accurate);
                let path = path.to_path_buf();
                let detections =
                    crate::pipeline::run_blocking("ocr", move || accurate.detect(&path)).await?;
                Ok(RecognitionOutput::Detections(detections))
            }
            Route::PdfText => {
                if let Some(m) = method.filter(|m| *m != Method::LocalFast) {
                    warn!("Method '{}' is not available for PDFs; using page OCR", m);
                }
                let recognizer: Arc<dyn TextRecognizer> = self.fast.clone();
                let text = pdf::extract_text(path, recognizer, &self.config).await?;
                Ok(RecognitionOutput::Text(text))
            }
            Route::Remote => {
                let order = self.remote.extract(path).await?;
                Ok(RecognitionOutput::Order(order))
            }
        }
    }
}

/// One-shot convenience wrapper: build a [`Recognizer`] and run it once.
pub async fn recognize(
    path: impl AsRef<Path>,
    method: Option<Method>,
    config: &RecognizeConfig,
) -> Result<RecognitionOutput, RecognizeError> {
    Recognizer::new(config.clone())?
        .recognize(path.as_ref(), method)
        .await
}
