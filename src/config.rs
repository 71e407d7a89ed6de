//! Configuration for a recognition run.
//!
//! All behaviour is controlled through [`RecognizeConfig`], built via
//! [`RecognizeConfigBuilder`]. The defaults reproduce the fixed request
//! parameters of the remote extractor and the tesseract language choices of
//! the local backends, so `RecognizeConfig::default()` plus a token is enough
//! for every path.

use crate::error::RecognizeError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat-completion endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.ap.siliconflow.com/v1/chat/completions";

/// Vision model used when none is configured.
pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-VL-32B-Instruct";

/// Sampling parameters sent with every remote extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub frequency_penalty: f32,
    pub max_tokens: u32,
    /// Number of completions requested. Only the first is read.
    pub n: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            top_p: 0.7,
            top_k: 50,
            frequency_penalty: 0.5,
            max_tokens: 8192,
            n: 1,
        }
    }
}

/// Configuration for [`crate::dispatch::Recognizer`].
///
/// # Example
/// ```rust
/// use orderscan::RecognizeConfig;
///
/// let config = RecognizeConfig::builder()
///     .api_token("sk-test")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.api_timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct RecognizeConfig {
    /// Chat-completion URL for the remote extractor.
    pub endpoint: String,

    /// Model identifier sent in the request body.
    pub model: String,

    /// Bearer token for the remote endpoint. Only the remote path needs it.
    pub api_token: Option<String>,

    /// Whole-request timeout for the remote call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    pub sampling: SamplingParams,

    /// Image detail level requested from the model. Default: "low".
    pub image_detail: String,

    /// Tesseract executable name or path. Default: "tesseract".
    pub tesseract_cmd: String,

    /// Languages for the fast backend and PDF pages. Default: `["eng"]`.
    pub fast_languages: Vec<String>,

    /// Languages for the accurate backend. Default: `["eng", "chi_tra"]`.
    pub accurate_languages: Vec<String>,

    /// Longest rendered edge of a PDF page in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// PDF pages OCR'd at the same time. Default: 4.
    pub concurrency: usize,

    /// Known product names offered to the model for `matched_name`.
    pub catalog_names: Vec<String>,

    /// Receives per-page events while a PDF is processed.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RecognizeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_token: None,
            api_timeout_secs: 120,
            sampling: SamplingParams::default(),
            image_detail: "low".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            fast_languages: vec!["eng".to_string()],
            accurate_languages: vec!["eng".to_string(), "chi_tra".to_string()],
            max_rendered_pixels: 2000,
            concurrency: 4,
            catalog_names: Vec::new(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RecognizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognizeConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("sampling", &self.sampling)
            .field("image_detail", &self.image_detail)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("fast_languages", &self.fast_languages)
            .field("accurate_languages", &self.accurate_languages)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("concurrency", &self.concurrency)
            .field("catalog_names", &self.catalog_names.len())
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PageProgressCallback>"),
            )
            .finish()
    }
}

impl RecognizeConfig {
    /// Create a new builder for `RecognizeConfig`.
    pub fn builder() -> RecognizeConfigBuilder {
        RecognizeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RecognizeConfig`].
#[derive(Debug)]
pub struct RecognizeConfigBuilder {
    config: RecognizeConfig,
}

impl RecognizeConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = Some(token.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn sampling(mut self, sampling: SamplingParams) -> Self {
        self.config.sampling = sampling;
        self
    }

    pub fn image_detail(mut self, detail: impl Into<String>) -> Self {
        self.config.image_detail = detail.into();
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn fast_languages<I, S>(mut self, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.fast_languages = langs.into_iter().map(Into::into).collect();
        self
    }

    pub fn accurate_languages<I, S>(mut self, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.accurate_languages = langs.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn catalog_names(mut self, names: Vec<String>) -> Self {
        self.config.catalog_names = names;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RecognizeConfig, RecognizeError> {
        let c = &self.config;
        if c.endpoint.trim().is_empty() {
            return Err(RecognizeError::InvalidConfig("endpoint must not be empty".into()));
        }
        if c.model.trim().is_empty() {
            return Err(RecognizeError::InvalidConfig("model must not be empty".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(RecognizeError::InvalidConfig("timeout must be ≥ 1 second".into()));
        }
        if c.tesseract_cmd.trim().is_empty() {
            return Err(RecognizeError::InvalidConfig(
                "tesseract command must not be empty".into(),
            ));
        }
        if c.fast_languages.is_empty() || c.accurate_languages.is_empty() {
            return Err(RecognizeError::InvalidConfig(
                "OCR language lists must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
