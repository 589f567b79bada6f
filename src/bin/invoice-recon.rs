//! CLI binary for invoice-recon.
//!
//! A thin shim over the library crate that maps CLI flags to `ReconConfig`,
//! serves recorded analyze results from disk and prints or writes the export.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use invoice_recon::{
    process_batch, render_batch, write_output, BatchProgressCallback, ColumnSpec, ExportContent,
    ExportFormat, ExtractionService, JsonFileService, ProgressCallback, RaggedRowPolicy,
    ReconConfig, SourceDocument,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;
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
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Progress bar plus one log line per document. Documents may finish out of
/// order when concurrency > 1.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time per submission index.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        bar.set_style(style);
        bar.set_prefix("Reconciling");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reconciling {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, index: usize, _total: usize, file_name: &str) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(index, Instant::now());
        }
        self.bar.set_message(file_name.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, tables: usize, line_items: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{tables} tables, {line_items} items")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents reconciled",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents reconciled  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Line items of two invoices as JSON (stdout)
  invoice-recon recorded/inv1.pdf.json recorded/inv2.pdf.json

  # Add Quantity and Date columns, write CSV atomically
  invoice-recon --fields Quantity,Date --format csv -o items.csv recorded/*.json

  # Reconstructed tables instead of line items
  invoice-recon --content tables recorded/inv1.pdf.json

  # Tolerate short rows, keep single-column tables intact
  invoice-recon --content tables --pad-ragged --no-titles recorded/*.json

  # Fail the run if any document could not be read
  invoice-recon --strict recorded/*.json

INPUTS:
  Each input is a recorded analyze result (JSON, with or without the
  "analyzeResult" wrapper). The file name minus a trailing ".json" fills the
  file_name column.

KNOWN LINE-ITEM FIELDS:
  Amount, Date, Description, ProductCode, Quantity, Tax, TaxRate, Unit, UnitPrice
  Description and Amount are always present as item_name and item_amount.
"#;

/// Rebuild tables and line-item records from invoice analyze results.
#[derive(Parser, Debug)]
#[command(
    name = "invoice-recon",
    version,
    about = "Rebuild tables and line-item records from invoice analyze results",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Recorded analyze-result JSON files, in upload order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Extra line-item fields, comma-separated (e.g. Quantity,Date).
    #[arg(long, env = "INVOICE_RECON_FIELDS", value_delimiter = ',')]
    fields: Vec<String>,

    /// What to export.
    #[arg(long, env = "INVOICE_RECON_CONTENT", value_enum, default_value = "line-items")]
    content: ContentArg,

    /// Output format.
    #[arg(long, env = "INVOICE_RECON_FORMAT", value_enum, default_value = "json")]
    format: FormatArg,

    /// Write to this file instead of stdout.
    #[arg(short, long, env = "INVOICE_RECON_OUTPUT")]
    output: Option<PathBuf>,

    /// Number of documents read at once.
    #[arg(short, long, env = "INVOICE_RECON_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Right-pad short table rows instead of dropping the table.
    #[arg(long, env = "INVOICE_RECON_PAD_RAGGED")]
    pad_ragged: bool,

    /// Never treat a single-cell first row as a table title.
    #[arg(long, env = "INVOICE_RECON_NO_TITLES")]
    no_titles: bool,

    /// Artefact marker to strip from cells (repeatable; replaces the default `:unselected:`).
    #[arg(long = "marker", env = "INVOICE_RECON_MARKERS", value_delimiter = ',')]
    markers: Vec<String>,

    /// Decimal places for numeric cells (0–6).
    #[arg(long, env = "INVOICE_RECON_DECIMALS", default_value_t = 2,
          value_parser = clap::value_parser!(u8).range(0..=6))]
    decimals: u8,

    /// Exit with an error if any document failed.
    #[arg(long, env = "INVOICE_RECON_STRICT")]
    strict: bool,

    /// Disable progress bar.
    #[arg(long, env = "INVOICE_RECON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "INVOICE_RECON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "INVOICE_RECON_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ContentArg {
    LineItems,
    Tables,
}

impl From<ContentArg> for ExportContent {
    fn from(v: ContentArg) -> Self {
        match v {
            ContentArg::LineItems => ExportContent::LineItems,
            ContentArg::Tables => ExportContent::Tables,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Json,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    for field in config.columns.unknown_fields() {
        warn!(
            "Field '{}' is not produced by the invoice model; the column will be empty",
            field
        );
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let service: Arc<dyn ExtractionService> = Arc::new(JsonFileService);
    let documents: Vec<SourceDocument> =
        cli.inputs.iter().map(SourceDocument::from_path).collect();

    let output = process_batch(&service, documents, &config)
        .await
        .context("Reconciliation failed")?;

    if !cli.quiet {
        for doc in output.documents.iter().filter(|d| !d.is_success()) {
            if let Some(ref e) = doc.error {
                eprintln!("  {} {}", red("✗"), e);
            }
        }
    }

    let output = if cli.strict {
        output.into_result().context("Strict mode: a document failed")?
    } else {
        output
    };

    let format = ExportFormat::from(cli.format);
    let content = ExportContent::from(cli.content);

    if let Some(ref output_path) = cli.output {
        write_output(&output, output_path, format, content)
            .await
            .context("Failed to write output")?;

        if !cli.quiet {
            let stats = &output.stats;
            eprintln!(
                "{}  {}/{} documents  {} tables  {} items  {}ms  →  {}",
                if stats.failed_documents == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                stats.processed_documents,
                stats.total_documents,
                stats.assembled_tables,
                stats.line_items,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let rendered =
            render_batch(&output, format, content).context("Failed to render output")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }

        if !cli.quiet && !show_progress {
            let stats = &output.stats;
            eprintln!(
                "Reconciled {}/{} documents in {}ms",
                stats.processed_documents, stats.total_documents, stats.total_duration_ms
            );
            if stats.dropped_tables > 0 {
                eprintln!("  {} tables dropped", stats.dropped_tables);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ReconConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReconConfig> {
    let mut builder = ReconConfig::builder()
        .columns(ColumnSpec::new(cli.fields.iter().map(String::as_str)))
        .decimal_places(usize::from(cli.decimals))
        .concurrency(cli.concurrency)
        .detect_titles(!cli.no_titles)
        .ragged_rows(if cli.pad_ragged {
            RaggedRowPolicy::PadRight
        } else {
            RaggedRowPolicy::Reject
        });

    if !cli.markers.is_empty() {
        builder = builder.artifact_markers(cli.markers.iter().map(String::as_str));
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
