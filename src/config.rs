//! Configuration types for page annotation.
//!
//! Every knob lives in [`AnnotateConfig`], built via its
//! [`AnnotateConfigBuilder`]. The config is plain data, so the same value
//! can be shared across threads when callers annotate several pages at once.

use crate::error::ExamOcrError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default vertical tolerance (pixels) when matching a diagram to the text
/// line below it.
pub const DEFAULT_MIN_GAP_PX: f64 = 8.0;

/// Default number of leading characters of a text region used as the
/// transcript search probe.
pub const DEFAULT_SNIPPET_CHARS: usize = 50;

/// Configuration for annotating one exam page.
///
/// Built via [`AnnotateConfig::builder()`] or using
/// [`AnnotateConfig::default()`].
///
/// # Example
/// ```rust
/// use examocr::AnnotateConfig;
///
/// let config = AnnotateConfig::builder()
///     .diagrams_dir("out/diagrams")
///     .min_gap_px(12.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.snippet_chars, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateConfig {
    /// Root directory for diagram crops. Default: `data/diagrams`.
    ///
    /// Crops land in `<diagrams_dir>/<image stem>/diagram_<NN>.png`, so pages
    /// sharing one root never collide.
    pub diagrams_dir: PathBuf,

    /// Vertical tolerance in pixels. Default: 8.
    ///
    /// A diagram is placed before the first anchored text line whose top is
    /// at least `diagram_top - min_gap_px`. The slack absorbs OCR jitter when
    /// a diagram and the line beside it start at nearly the same height.
    pub min_gap_px: f64,

    /// Characters of each text region's OCR text used to locate it in the
    /// transcript. Default: 50.
    pub snippet_chars: usize,

    /// Apply exam formatting (bold section and question headings) to the
    /// transcript before diagrams are spliced in. Default: true.
    pub exam_formatting: bool,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            diagrams_dir: PathBuf::from("data/diagrams"),
            min_gap_px: DEFAULT_MIN_GAP_PX,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
            exam_formatting: true,
        }
    }
}

impl AnnotateConfig {
    /// Create a new builder for `AnnotateConfig`.
    pub fn builder() -> AnnotateConfigBuilder {
        AnnotateConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnnotateConfig`].
#[derive(Debug)]
pub struct AnnotateConfigBuilder {
    config: AnnotateConfig,
}

impl AnnotateConfigBuilder {
    pub fn diagrams_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.diagrams_dir = dir.into();
        self
    }

    pub fn min_gap_px(mut self, px: f64) -> Self {
        self.config.min_gap_px = px;
        self
    }

    pub fn snippet_chars(mut self, n: usize) -> Self {
        self.config.snippet_chars = n;
        self
    }

    pub fn exam_formatting(mut self, v: bool) -> Self {
        self.config.exam_formatting = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnnotateConfig, ExamOcrError> {
        let c = &self.config;
        if c.diagrams_dir.as_os_str().is_empty() {
            return Err(ExamOcrError::InvalidConfig(
                "Diagram directory must not be empty".into(),
            ));
        }
        if !c.min_gap_px.is_finite() || c.min_gap_px < 0.0 {
            return Err(ExamOcrError::InvalidConfig(format!(
                "min_gap_px must be a finite value ≥ 0, got {}",
                c.min_gap_px
            )));
        }
        if c.snippet_chars == 0 {
            return Err(ExamOcrError::InvalidConfig(
                "snippet_chars must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
