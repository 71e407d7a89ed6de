//! Fast local OCR: the tesseract command-line engine, Latin script only.
//!
//! Tesseract is driven as a subprocess; any installed tesseract (3.05+)
//! works. The image is decoded up front and a corrupt file is reported as
//! [`RecognizeError::ImageLoad`].

use crate::config::RecognizeConfig;
use crate::error::RecognizeError;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

/// Name used in engine errors and logs.
pub const ENGINE: &str = "tesseract";

/// A blocking image-to-text engine.
///
/// Implementations are called from `spawn_blocking` and must be safe to call
/// from several threads at once (PDF pages are OCR'd concurrently).
pub trait TextRecognizer: Send + Sync {
    /// Extract text from the image at `image_path`.
    fn recognize(&self, image_path: &Path) -> Result<String, RecognizeError>;
}

/// Plain-text OCR through `tesseract <image> stdout -l <langs>`.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    cmd: String,
    languages: String,
}

impl TesseractOcr {
    pub fn new(cmd: impl Into<String>, languages: &[String]) -> Self {
        Self {
            cmd: cmd.into(),
            languages: languages.join("+"),
        }
    }

    pub fn from_config(config: &RecognizeConfig) -> Self {
        Self::new(&config.tesseract_cmd, &config.fast_languages)
    }
}

impl TextRecognizer for TesseractOcr {
    fn recognize(&self, image_path: &Path) -> Result<String, RecognizeError> {
        check_decodable(image_path)?;

        let output = run_tesseract(
            &self.cmd,
            &[
                image_path.as_os_str(),
                OsStr::new("stdout"),
                OsStr::new("-l"),
                OsStr::new(&self.languages),
            ],
        )?;

        let text = String::from_utf8(output.stdout)
            .map_err(|e| RecognizeError::engine(ENGINE, format!("output is not UTF-8: {e}")))?;
        debug!("{}: {} chars of text", image_path.display(), text.len());
        Ok(text)
    }
}

/// Decode the image to make sure the engine will be able to read it.
pub(crate) fn check_decodable(path: &Path) -> Result<(), RecognizeError> {
    let reader = image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| RecognizeError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let img = reader.decode().map_err(|e| RecognizeError::ImageLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    debug!("Decoded {} ({}x{})", path.display(), img.width(), img.height());
    Ok(())
}

/// Run the tesseract binary, failing on a non-zero exit status.
pub(crate) fn run_tesseract<S: AsRef<OsStr>>(
    cmd: &str,
    args: &[S],
) -> Result<Output, RecognizeError> {
    let output = Command::new(cmd).args(args).output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            RecognizeError::engine(
                ENGINE,
                format!("'{cmd}' not found. Install tesseract or pass --tesseract-cmd."),
            )
        } else {
            RecognizeError::engine(ENGINE, format!("failed to start '{cmd}': {e}"))
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecognizeError::engine(
            ENGINE,
            format!("{} exited with {}: {}", cmd, output.status, stderr.trim()),
        ));
    }

    Ok(output)
}
