//! CLI binary for orderscan.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RecognizeConfig`, runs one recognition and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use orderscan::{
    load_product_names, Detection, Method, PageProgressCallback, ProgressCallback,
    RecognitionOutput, RecognizeConfig, Recognizer,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── PDF page progress using indicatif ────────────────────────────────────────

/// Progress bar for multi-page PDFs. Pages may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl PageProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("OCR");
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(error),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} pages recognised", green("✔"), success_count);
        } else {
            eprintln!(
                "{} {}/{} pages recognised  ({} failed)",
                red("✘"),
                success_count,
                total_pages,
                failed
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Plain text with the fast local engine
  orderscan --path receipt.jpg --method local-fast

  # Text regions with confidence (Latin + traditional Chinese)
  orderscan --path receipt.png --method local-accurate

  # Structured order via the vision model
  orderscan --path invoice.png --method remote-structured --token sk-...

  # Match items against a product catalog
  orderscan --path invoice.png --method remote-structured --catalog order.xlsx

  # PDFs are always OCR'd page by page
  orderscan --path scan.pdf --method local-fast

ENVIRONMENT VARIABLES:
  ORDERSCAN_API_TOKEN     Bearer token for the model endpoint
  ORDERSCAN_ENDPOINT      Chat-completion URL
  ORDERSCAN_MODEL         Vision model ID
  TESSERACT_CMD           tesseract executable
  PDFIUM_LIB_PATH         Path to libpdfium for PDF input
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Extract text or order data from images and PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "orderscan",
    version,
    about = "Extract text or structured order data from images and PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image (.jpg .jpeg .png .bmp .tiff) or PDF file.
    #[arg(long)]
    path: PathBuf,

    /// Recognition method. Ignored for PDFs.
    #[arg(long, value_enum)]
    method: MethodArg,

    /// Bearer token for the remote method.
    #[arg(long, env = "ORDERSCAN_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Chat-completion endpoint URL.
    #[arg(long, env = "ORDERSCAN_ENDPOINT")]
    endpoint: Option<String>,

    /// Vision model ID.
    #[arg(long, env = "ORDERSCAN_MODEL")]
    model: Option<String>,

    /// Remote request timeout in seconds.
    #[arg(long, env = "ORDERSCAN_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Spreadsheet of known product names (second column, header row skipped).
    #[arg(long, env = "ORDERSCAN_CATALOG")]
    catalog: Option<PathBuf>,

    /// tesseract executable.
    #[arg(long, env = "TESSERACT_CMD", default_value = "tesseract")]
    tesseract_cmd: String,

    /// PDF pages OCR'd concurrently.
    #[arg(short, long, env = "ORDERSCAN_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the PDF progress bar.
    #[arg(long, env = "ORDERSCAN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except the result and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MethodArg {
    #[value(alias = "tessercart", alias = "tesseract")]
    LocalFast,
    #[value(alias = "easyOCR", alias = "easyocr")]
    LocalAccurate,
    #[value(alias = "llm")]
    RemoteStructured,
}

impl From<MethodArg> for Method {
    fn from(v: MethodArg) -> Self {
        match v {
            MethodArg::LocalFast => Method::LocalFast,
            MethodArg::LocalAccurate => Method::LocalAccurate,
            MethodArg::RemoteStructured => Method::RemoteStructured,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and run ─────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };

    let config = build_config(&cli, progress)?;
    let recognizer = Recognizer::new(config).context("Invalid configuration")?;

    let output = recognizer
        .recognize(&cli.path, Some(cli.method.into()))
        .await
        .with_context(|| format!("Recognition of '{}' failed", cli.path.display()))?;

    print_output(&output, cli.json)
}

/// Map CLI args to `RecognizeConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RecognizeConfig> {
    let mut builder = RecognizeConfig::builder()
        .api_timeout_secs(cli.timeout)
        .tesseract_cmd(&cli.tesseract_cmd)
        .concurrency(cli.concurrency);

    if let Some(ref token) = cli.token {
        builder = builder.api_token(token);
    }
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref path) = cli.catalog {
        let names = load_product_names(path).context("Failed to load catalog")?;
        builder = builder.catalog_names(names);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_output(output: &RecognitionOutput, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if json {
        let rendered = match output {
            RecognitionOutput::Text(text) => serde_json::to_string_pretty(text),
            RecognitionOutput::Detections(d) => serde_json::to_string_pretty(d),
            RecognitionOutput::Order(order) => serde_json::to_string_pretty(order),
        }
        .context("Failed to serialise output")?;
        writeln!(handle, "{rendered}").context("Failed to write to stdout")?;
        return Ok(());
    }

    match output {
        RecognitionOutput::Text(text) => {
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
            if !text.ends_with('\n') {
                handle
                    .write_all(b"\n")
                    .context("Failed to write to stdout")?;
            }
        }
        RecognitionOutput::Detections(detections) => {
            for line in detection_lines(detections) {
                writeln!(handle, "{line}").context("Failed to write to stdout")?;
            }
        }
        RecognitionOutput::Order(order) => {
            let rendered =
                serde_json::to_string_pretty(order).context("Failed to serialise order")?;
            writeln!(handle, "{rendered}").context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn detection_lines(detections: &[Detection]) -> impl Iterator<Item = String> + '_ {
    detections
        .iter()
        .map(|d| format!("Detected: {} (Confidence: {:.2})", d.text, d.confidence))
}
