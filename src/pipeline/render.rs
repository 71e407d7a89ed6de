//! PDF rasterisation: render every page to a PNG file via pdfium.
//!
//! Tesseract reads images from disk, so pages are written into a
//! [`TempDir`] that lives as long as the returned [`RenderedPages`]. The
//! longest edge is capped at `max_rendered_pixels`.
//!
//! ## Library binding
//!
//! pdfium is loaded at runtime. Resolution order: `PDFIUM_LIB_PATH`, a
//! library in the current directory, then the system library search path.

use crate::error::RecognizeError;
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Page images on disk, in page order. Deleted on drop.
pub struct RenderedPages {
    /// `(page_num_1based, png_path)` tuples.
    pub pages: Vec<(usize, PathBuf)>,
    _dir: TempDir,
}

/// Rasterise all pages of `pdf_path` into PNG files.
///
/// Runs inside `spawn_blocking`: pdfium is CPU-bound and not async-safe.
pub async fn render_pages(
    pdf_path: &Path,
    max_pixels: u32,
) -> Result<RenderedPages, RecognizeError> {
    let path = pdf_path.to_path_buf();
    super::run_blocking("render", move || render_pages_blocking(&path, max_pixels)).await
}

fn render_pages_blocking(pdf_path: &Path, max_pixels: u32) -> Result<RenderedPages, RecognizeError> {
    let render_err = |detail: String| RecognizeError::PdfRender {
        path: pdf_path.to_path_buf(),
        detail,
    };

    if !pdf_path.exists() {
        return Err(RecognizeError::FileRead {
            path: pdf_path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
        });
    }

    let pdfium = bind_pdfium().map_err(|e| render_err(format!("cannot load pdfium: {e:?}")))?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| render_err(format!("{e:?}")))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let dir = tempfile::Builder::new()
        .prefix("orderscan-pages-")
        .tempdir()
        .map_err(|e| RecognizeError::Internal(format!("cannot create temp dir: {e}")))?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut rendered = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| render_err(format!("page {page_num}: {e:?}")))?;

        let image = bitmap.as_image();
        let png_path = dir.path().join(format!("page-{page_num:04}.png"));
        image
            .save_with_format(&png_path, ImageFormat::Png)
            .map_err(|e| render_err(format!("page {page_num}: cannot write PNG: {e}")))?;

        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        rendered.push((page_num, png_path));
    }

    Ok(RenderedPages {
        pages: rendered,
        _dir: dir,
    })
}

fn bind_pdfium() -> Result<Pdfium, PdfiumError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(path)?,
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())?,
    };
    Ok(Pdfium::new(bindings))
}
