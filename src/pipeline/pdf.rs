//! PDF text extraction: render pages, OCR each one, join in page order.
//!
//! Pages are independent, so up to `concurrency` of them are OCR'd at once.
//! Completion order does not matter: results are sorted by page number
//! before assembly, and every page's text is followed by one `\n`.

use crate::config::RecognizeConfig;
use crate::error::RecognizeError;
use crate::pipeline::render;
use crate::pipeline::tesseract::TextRecognizer;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Extract the text of every page of `pdf_path` using `recognizer`.
pub async fn extract_text(
    pdf_path: &Path,
    recognizer: Arc<dyn TextRecognizer>,
    config: &RecognizeConfig,
) -> Result<String, RecognizeError> {
    let rendered = render::render_pages(pdf_path, config.max_rendered_pixels).await?;
    let text = ocr_pages(recognizer, &rendered.pages, config).await?;
    info!(
        "Extracted {} chars from {} pages of {}",
        text.len(),
        rendered.pages.len(),
        pdf_path.display()
    );
    Ok(text)
}

/// OCR already-rendered page images and assemble the document text.
pub async fn ocr_pages(
    recognizer: Arc<dyn TextRecognizer>,
    pages: &[(usize, PathBuf)],
    config: &RecognizeConfig,
) -> Result<String, RecognizeError> {
    let total_pages = pages.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total_pages);
    }

    let results: Vec<(usize, Result<String, RecognizeError>)> =
        stream::iter(pages.iter().cloned().map(|(page_num, path)| {
            let recognizer = Arc::clone(&recognizer);
            let progress = config.progress_callback.clone();
            async move {
                if let Some(ref cb) = progress {
                    cb.on_page_start(page_num, total_pages);
                }
                let result =
                    super::run_blocking("ocr", move || recognizer.recognize(&path)).await;
                if let Some(ref cb) = progress {
                    match &result {
                        Ok(text) => cb.on_page_complete(page_num, total_pages, text.len()),
                        Err(e) => cb.on_page_error(page_num, total_pages, &e.to_string()),
                    }
                }
                (page_num, result)
            }
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    let success_count = results.iter().filter(|(_, r)| r.is_ok()).count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(total_pages, success_count);
    }

    let mut texts = Vec::with_capacity(results.len());
    for (page_num, result) in results {
        texts.push((page_num, result?));
    }
    texts.sort_by_key(|(page_num, _)| *page_num);

    Ok(assemble_pages(texts.into_iter().map(|(_, text)| text)))
}

/// Join page texts, each followed by a single newline.
pub fn assemble_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for page in pages {
        out.push_str(page.as_ref());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::PageProgressCallback;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Returns the file stem upper-cased, slower for earlier pages so they
    /// finish out of order.
    struct StemRecognizer;

    impl TextRecognizer for StemRecognizer {
        fn recognize(&self, image_path: &Path) -> Result<String, RecognizeError> {
            let stem = image_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_uppercase();
            let delay = match stem.as_str() {
                "A" => 60,
                "B" => 30,
                _ => 0,
            };
            std::thread::sleep(Duration::from_millis(delay));
            if stem == "BAD" {
                return Err(RecognizeError::engine("stub", "cannot read page"));
            }
            Ok(stem)
        }
    }

    #[derive(Default)]
    struct Tracker {
        started: AtomicUsize,
        completed: AtomicUsize,
        failed: AtomicUsize,
        successes: AtomicUsize,
    }

    impl PageProgressCallback for Tracker {
        fn on_extraction_start(&self, total_pages: usize) {
            self.started.store(total_pages, Ordering::SeqCst);
        }
        fn on_page_complete(&self, _page: usize, _total: usize, _len: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_error(&self, _page: usize, _total: usize, _error: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_extraction_complete(&self, _total: usize, success_count: usize) {
            self.successes.store(success_count, Ordering::SeqCst);
        }
    }

    fn pages(names: &[&str]) -> Vec<(usize, PathBuf)> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (i + 1, PathBuf::from(format!("/tmp/{n}.png"))))
            .collect()
    }

    #[test]
    fn assemble_adds_newline_after_every_page() {
        assert_eq!(assemble_pages(["A", "B", "C"]), "A\nB\nC\n");
        assert_eq!(assemble_pages(Vec::<String>::new()), "");
        assert_eq!(assemble_pages(["only"]), "only\n");
    }

    #[tokio::test]
    async fn three_pages_join_in_page_order() {
        let config = RecognizeConfig::builder().concurrency(3).build().unwrap();
        let text = ocr_pages(Arc::new(StemRecognizer), &pages(&["a", "b", "c"]), &config)
            .await
            .unwrap();
        assert_eq!(text, "A\nB\nC\n");
    }

    #[tokio::test]
    async fn sequential_matches_concurrent() {
        let config = RecognizeConfig::builder().concurrency(1).build().unwrap();
        let text = ocr_pages(Arc::new(StemRecognizer), &pages(&["a", "b", "c"]), &config)
            .await
            .unwrap();
        assert_eq!(text, "A\nB\nC\n");
    }

    #[tokio::test]
    async fn failing_page_fails_extraction_and_reports_progress() {
        let tracker = Arc::new(Tracker::default());
        let config = RecognizeConfig::builder()
            .progress_callback(tracker.clone())
            .build()
            .unwrap();

        let err = ocr_pages(Arc::new(StemRecognizer), &pages(&["a", "bad", "c"]), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, RecognizeError::Engine { .. }));
        assert_eq!(tracker.started.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.failed.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 2);
    }
}
