//! Pipeline stages for annotating one exam page.
//!
//! Each submodule implements exactly one transformation step and is usable
//! on its own; [`crate::convert`] wires them together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ postprocess ──▶ extract ──▶ interleave
//! (paths)   (transcript)    (crops)     (markdown)
//!                              │
//!                           geometry
//! ```
//!
//! 1. [`input`]       : validate the page image, load the OCR result JSON
//! 2. [`postprocess`] : exam formatting of the transcript (headings, stems)
//! 3. [`extract`]     : cut every `diagram` region out of the page raster
//!    into a PNG, masked to its polygon
//! 4. [`geometry`]    : polygon sanitisation, bbox clamping, mask
//!    rasterisation used by `extract`
//! 5. [`interleave`]  : splice `![](path)` references into the transcript
//!    at the position matching each diagram's place on the page

pub mod extract;
pub mod geometry;
pub mod input;
pub mod interleave;
pub mod postprocess;
