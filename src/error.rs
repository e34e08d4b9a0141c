//! Error types for the examocr library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExamOcrError`]: **Fatal**: the page cannot be annotated at all
//!   (source image missing or undecodable, OCR result not valid JSON, output
//!   directory not writable). Returned as `Err(ExamOcrError)` from the
//!   top-level `annotate*` and `extract*` functions.
//!
//! * [`RegionIssue`]: **Non-fatal**: a single diagram region had a
//!   malformed polygon or collapsed to an empty crop. The region is
//!   downgraded or skipped, every other region proceeds, and the issue is
//!   stored in [`crate::output::PageAnnotation`] for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the examocr library.
///
/// Region-level failures use [`RegionIssue`] and are collected rather than
/// propagated here.
#[derive(Debug, Error)]
pub enum ExamOcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source image was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of the supported raster formats.
    #[error("Unsupported image format '{extension}' for '{path}'\nSupported: jpg, jpeg, png, gif, bmp, tiff, webp")]
    UnsupportedImageFormat { path: PathBuf, extension: String },

    /// The image exists but could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageUnreadable { path: PathBuf, detail: String },

    /// The OCR result JSON file was not found.
    #[error("OCR result not found: '{path}'")]
    OcrResultNotFound { path: PathBuf },

    /// The OCR result is not valid JSON or has the wrong shape.
    #[error("Invalid OCR result '{path}': {detail}\nExpected an object with `text` and `line_data` fields.")]
    InvalidOcrResult { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the per-image diagram directory.
    #[error("Failed to create diagram directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not encode or write a diagram crop.
    #[error("Failed to write diagram crop '{path}': {detail}")]
    CropWriteFailed { path: PathBuf, detail: String },

    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal problem with a single diagram region.
///
/// `index` is the region's position among the page's diagram regions, the
/// same number used in its `diagram_<NN>.png` file name.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum RegionIssue {
    /// Fewer than three polygon points survived sanitisation; the region was
    /// cropped by its bounding box without a mask.
    #[error("Diagram {index} (id {id:?}): only {usable_points} usable polygon points, used bounding-box crop")]
    FallbackCrop {
        index: usize,
        id: Option<String>,
        usable_points: usize,
    },

    /// The polygon carried no well-formed coordinate pair at all.
    #[error("Diagram {index} (id {id:?}): no usable coordinates, skipped")]
    NoCoordinates { index: usize, id: Option<String> },

    /// The clamped crop had zero width or height.
    #[error("Diagram {index} (id {id:?}): degenerate {width}x{height} crop, skipped")]
    DegenerateCrop {
        index: usize,
        id: Option<String>,
        width: u32,
        height: u32,
    },
}

impl RegionIssue {
    /// True when the region produced no crop file at all.
    pub fn is_skip(&self) -> bool {
        !matches!(self, RegionIssue::FallbackCrop { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_not_found_display() {
        let e = ExamOcrError::ImageNotFound {
            path: PathBuf::from("/tmp/page_01.png"),
        };
        assert!(e.to_string().contains("page_01.png"));
    }

    #[test]
    fn unsupported_format_lists_supported() {
        let e = ExamOcrError::UnsupportedImageFormat {
            path: PathBuf::from("scan.pdf"),
            extension: "pdf".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'pdf'"), "got: {msg}");
        assert!(msg.contains("webp"), "got: {msg}");
    }

    #[test]
    fn fallback_issue_display() {
        let issue = RegionIssue::FallbackCrop {
            index: 3,
            id: Some("abc".into()),
            usable_points: 2,
        };
        let msg = issue.to_string();
        assert!(msg.contains("Diagram 3"), "got: {msg}");
        assert!(msg.contains("2 usable"), "got: {msg}");
        assert!(!issue.is_skip());
    }

    #[test]
    fn degenerate_issue_is_skip() {
        let issue = RegionIssue::DegenerateCrop {
            index: 0,
            id: None,
            width: 0,
            height: 4,
        };
        assert!(issue.is_skip());
        assert!(issue.to_string().contains("0x4"));
    }

    #[test]
    fn issue_serialises() {
        let issue = RegionIssue::NoCoordinates {
            index: 1,
            id: Some("d1".into()),
        };
        let json = serde_json::to_string(&issue).expect("serialise");
        assert!(json.contains("NoCoordinates"));
        let back: RegionIssue = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, issue);
    }
}
