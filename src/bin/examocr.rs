//! CLI binary for examocr.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AnnotateConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use examocr::{annotate_page_async, load_ocr_result, write_markdown, AnnotateConfig, PageAnnotation};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Annotate a page, Markdown to stdout
  examocr page_01.png --ocr-result page_01.json

  # Write Markdown to a file, crops under out/diagrams/page_01/
  examocr page_01.png --ocr-result page_01.json -o page_01.md --diagrams-dir out/diagrams

  # Looser vertical tolerance for skewed scans
  examocr scan.jpg --ocr-result scan.json --min-gap-px 20

  # Keep the transcript exactly as returned by the OCR service
  examocr page_01.png --ocr-result page_01.json --no-exam-format

  # Full result (markdown, crops, issues, stats) as JSON
  examocr page_01.png --ocr-result page_01.json --json > page_01.json

OCR RESULT FORMAT:
  JSON object with the transcript in `text` and regions in `line_data`:
    {"text": "...", "line_data": [
      {"type": "diagram", "id": "d1", "cnt": [[x, y], ...]},
      {"type": "text", "id": "t1", "cnt": [[x, y], ...], "text": "Câu 1: ..."}
    ]}

ENVIRONMENT VARIABLES:
  EXAMOCR_OCR_RESULT      Path to the OCR result JSON
  EXAMOCR_DIAGRAMS_DIR    Root directory for diagram crops
  EXAMOCR_MIN_GAP_PX      Vertical tolerance in pixels
  EXAMOCR_SNIPPET_CHARS   Characters used to locate text regions
  RUST_LOG                Override log filter (e.g. examocr=debug)
"#;

/// Crop exam diagrams from OCR regions and splice them into the transcript.
#[derive(Parser, Debug)]
#[command(
    name = "examocr",
    version,
    about = "Crop exam diagrams from OCR regions and splice them into the transcript",
    long_about = "Cut every `diagram` region of an OCR'd exam page out of the page image \
(masked to its polygon), then insert a Markdown image reference for each crop into the \
transcript at the line matching the diagram's position on the page.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Page image (jpg, jpeg, png, gif, bmp, tiff, webp).
    image: PathBuf,

    /// OCR result JSON for the page (`text` + `line_data`).
    #[arg(long, env = "EXAMOCR_OCR_RESULT")]
    ocr_result: PathBuf,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, env = "EXAMOCR_OUTPUT")]
    output: Option<PathBuf>,

    /// Root directory for diagram crops.
    #[arg(long, env = "EXAMOCR_DIAGRAMS_DIR", default_value = "data/diagrams")]
    diagrams_dir: PathBuf,

    /// Vertical tolerance in pixels when placing a diagram before a text line.
    #[arg(long, env = "EXAMOCR_MIN_GAP_PX", default_value_t = examocr::config::DEFAULT_MIN_GAP_PX)]
    min_gap_px: f64,

    /// Characters of a text region used to find it in the transcript.
    #[arg(long, env = "EXAMOCR_SNIPPET_CHARS", default_value_t = examocr::config::DEFAULT_SNIPPET_CHARS)]
    snippet_chars: usize,

    /// Leave the transcript unformatted (no bold headings or question stems).
    #[arg(long, env = "EXAMOCR_NO_EXAM_FORMAT")]
    no_exam_format: bool,

    /// Output structured JSON (PageAnnotation) instead of Markdown.
    #[arg(long, env = "EXAMOCR_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EXAMOCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "EXAMOCR_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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
    let config = AnnotateConfig::builder()
        .diagrams_dir(&cli.diagrams_dir)
        .min_gap_px(cli.min_gap_px)
        .snippet_chars(cli.snippet_chars)
        .exam_formatting(!cli.no_exam_format)
        .build()
        .context("Invalid configuration")?;

    let ocr = load_ocr_result(&cli.ocr_result).context("Failed to load OCR result")?;

    // ── Run annotation ───────────────────────────────────────────────────
    let annotation = annotate_page_async(cli.image.clone(), ocr, config)
        .await
        .context("Annotation failed")?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&annotation).context("Failed to serialise output")?;
        println!("{json}");
    } else if let Some(ref output_path) = cli.output {
        write_markdown(output_path, &annotation.markdown)
            .await
            .context("Failed to write Markdown")?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(annotation.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure a trailing newline on stdout.
        if !annotation.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet {
        print_summary(&cli, &annotation);
    }

    Ok(())
}

/// Per-crop listing and totals on stderr.
fn print_summary(cli: &Cli, annotation: &PageAnnotation) {
    for crop in &annotation.crops {
        let b = crop.bbox;
        eprintln!(
            "  {} {:<16} id={:<12} bbox=({}, {}, {}, {}){}",
            green("✓"),
            crop.file_name(),
            crop.id.as_deref().unwrap_or("-"),
            b.left,
            b.top,
            b.right,
            b.bottom,
            if crop.is_precise() {
                String::new()
            } else {
                dim("  [bbox only]")
            },
        );
    }
    for issue in annotation.issues.iter().filter(|i| i.is_skip()) {
        eprintln!("  {} {}", cyan("⚠"), issue);
    }

    let s = &annotation.stats;
    let target = cli
        .output
        .as_ref()
        .filter(|_| !cli.json)
        .map(|p| format!("  →  {}", bold(&p.display().to_string())))
        .unwrap_or_default();
    eprintln!(
        "{}  {}/{} diagrams cropped, {} placed  {}ms{}",
        if s.skipped_regions == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        s.precise_crops + s.fallback_crops,
        s.diagram_regions,
        s.diagrams_placed,
        s.duration_ms,
        target,
    );
}
