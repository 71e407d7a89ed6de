//! Accurate local OCR: multi-script tesseract with per-line regions.
//!
//! Runs tesseract in TSV mode with Latin plus a second script (traditional
//! Chinese by default) and groups the word rows into line-level
//! [`Detection`]s, each with a bounding box and a mean confidence.
//!
//! ## Engine probe
//!
//! Multi-script recognition fails late and cryptically when a language pack
//! is missing. The first call probes `--list-langs` and checks every
//! requested language is installed; the outcome is cached in the backend so
//! later calls go straight to recognition.

use crate::config::RecognizeConfig;
use crate::error::RecognizeError;
use crate::output::{BoundingBox, Detection};
use crate::pipeline::tesseract::{check_decodable, run_tesseract, ENGINE};
use once_cell::sync::OnceCell;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info};

/// Multi-language detector returning text regions with confidences.
#[derive(Debug)]
pub struct AccurateOcr {
    cmd: String,
    languages: Vec<String>,
    /// `eng+chi_tra`-style argument, set once the probe has passed.
    ready: OnceCell<String>,
}

impl AccurateOcr {
    pub fn new(cmd: impl Into<String>, languages: Vec<String>) -> Self {
        Self {
            cmd: cmd.into(),
            languages,
            ready: OnceCell::new(),
        }
    }

    pub fn from_config(config: &RecognizeConfig) -> Self {
        Self::new(&config.tesseract_cmd, config.accurate_languages.clone())
    }

    /// Detect text lines in the image at `image_path`.
    ///
    /// Regions are returned in reading order as tesseract reports them.
    pub fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, RecognizeError> {
        check_decodable(image_path)?;
        let languages = self.ready.get_or_try_init(|| self.probe())?;

        let output = run_tesseract(
            &self.cmd,
            &[
                image_path.as_os_str(),
                OsStr::new("stdout"),
                OsStr::new("-l"),
                OsStr::new(languages),
                OsStr::new("tsv"),
            ],
        )?;

        let tsv = String::from_utf8_lossy(&output.stdout);
        let detections = parse_tsv(&tsv);
        debug!("{}: {} regions", image_path.display(), detections.len());
        Ok(detections)
    }

    fn probe(&self) -> Result<String, RecognizeError> {
        let output = run_tesseract(&self.cmd, &["--list-langs"])?;

        // tesseract 3.x prints the list on stderr, 4+ on stdout.
        let mut listing = String::from_utf8_lossy(&output.stdout).into_owned();
        listing.push('\n');
        listing.push_str(&String::from_utf8_lossy(&output.stderr));
        let installed: Vec<&str> = listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("List of"))
            .collect();

        let missing: Vec<&str> = self
            .languages
            .iter()
            .map(String::as_str)
            .filter(|lang| !installed.contains(lang))
            .collect();
        if !missing.is_empty() {
            return Err(RecognizeError::engine(
                ENGINE,
                format!(
                    "language data not installed: {}. Install the matching tesseract-ocr-* packages.",
                    missing.join(", ")
                ),
            ));
        }

        let joined = self.languages.join("+");
        info!("Accurate OCR ready with languages {}", joined);
        Ok(joined)
    }
}

/// Group tesseract TSV word rows into line detections.
///
/// Columns: level, page, block, par, line, word, left, top, width, height,
/// conf, text. Only level-5 (word) rows with text and a non-negative
/// confidence contribute.
pub fn parse_tsv(tsv: &str) -> Vec<Detection> {
    struct Line {
        key: (u32, u32, u32, u32),
        words: Vec<String>,
        region: BoundingBox,
        conf_sum: f32,
    }

    let mut lines: Vec<Line> = Vec::new();

    for row in tsv.lines() {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11].trim();
        let nums: Option<Vec<u32>> = cols[1..10].iter().map(|c| c.trim().parse().ok()).collect();
        let conf: Option<f32> = cols[10].trim().parse().ok();
        let (Some(nums), Some(conf)) = (nums, conf) else {
            continue;
        };
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (nums[0], nums[1], nums[2], nums[3]);
        let region = BoundingBox {
            left: nums[5],
            top: nums[6],
            width: nums[7],
            height: nums[8],
        };

        match lines.last_mut() {
            Some(line) if line.key == key => {
                line.words.push(text.to_string());
                line.region = line.region.union(&region);
                line.conf_sum += conf;
            }
            _ => lines.push(Line {
                key,
                words: vec![text.to_string()],
                region,
                conf_sum: conf,
            }),
        }
    }

    lines
        .into_iter()
        .map(|line| Detection {
            confidence: (line.conf_sum / line.words.len() as f32 / 100.0).clamp(0.0, 1.0),
            text: line.words.join(" "),
            region: line.region,
        })
        .collect()
}
