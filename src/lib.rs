//! # examocr
//!
//! Turn an OCR'd exam page into Markdown with its diagrams in place.
//!
//! ## Why this crate?
//!
//! Math OCR services return a good transcript of an exam page, but figures
//! (geometry sketches, graphs, tables drawn as images) come back only as
//! `diagram` regions with a polygon. This crate cuts those regions out of the
//! page image as PNGs, masked to their exact outline, and splices a Markdown
//! image reference back into the transcript at the line matching the
//! diagram's vertical position.
//!
//! ## Pipeline Overview
//!
//! ```text
//! page image + OCR result (JSON)
//!  │
//!  ├─ 1. Input       validate image path, parse OCR result
//!  ├─ 2. Format      bold section headings and question stems
//!  ├─ 3. Extract     polygon-masked PNG crop per diagram region
//!  ├─ 4. Interleave  anchor text regions, insert ![](crop) lines
//!  └─ 5. Output      Markdown + crops + per-region issues + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use examocr::{annotate_page, load_ocr_result, AnnotateConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ocr = load_ocr_result("page_01.json")?;
//!     let config = AnnotateConfig::builder()
//!         .diagrams_dir("out/diagrams")
//!         .build()?;
//!     let page = annotate_page("page_01.png", &ocr, &config)?;
//!     println!("{}", page.markdown);
//!     eprintln!("{} diagrams placed", page.stats.diagrams_placed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `examocr` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! examocr = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnnotateConfig, AnnotateConfigBuilder};
pub use convert::{annotate_page, annotate_page_async, annotate_to_file, write_markdown};
pub use error::{ExamOcrError, RegionIssue};
pub use ocr::{OcrResult, Region, RegionId, RegionKind};
pub use output::{AnnotationStats, CropArtifact, PageAnnotation};
pub use pipeline::extract::extract_diagrams;
pub use pipeline::input::load_ocr_result;
pub use pipeline::interleave::insert_diagrams;
