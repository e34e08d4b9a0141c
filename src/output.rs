//! Result types returned by the annotation pipeline.

use crate::error::RegionIssue;
use crate::pipeline::geometry::{PixelBox, PixelPoint};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One saved diagram crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropArtifact {
    /// Id of the region the crop was cut from.
    pub id: Option<String>,

    /// Location of the saved PNG.
    pub path: PathBuf,

    /// Clamped crop rectangle in source pixels (`right`/`bottom` exclusive).
    pub bbox: PixelBox,

    /// Sanitised polygon used as the mask; `None` when the region fell back
    /// to a plain bounding-box crop.
    pub polygon: Option<Vec<PixelPoint>>,
}

impl CropArtifact {
    /// True when the crop was masked to its polygon.
    pub fn is_precise(&self) -> bool {
        self.polygon.is_some()
    }

    /// The crop's file name, for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The annotated page returned by [`crate::annotate_page`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageAnnotation {
    /// Transcript with `![](path)` references spliced in.
    pub markdown: String,

    /// Crops written for this page, in diagram order.
    pub crops: Vec<CropArtifact>,

    /// Recoverable per-region problems (fallback crops, skipped regions).
    pub issues: Vec<RegionIssue>,

    pub stats: AnnotationStats,
}

/// Counters for one annotated page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStats {
    /// Region records in the OCR result.
    pub regions: usize,
    /// Regions tagged `diagram` that carried a polygon.
    pub diagram_regions: usize,
    /// Crops masked to their polygon.
    pub precise_crops: usize,
    /// Crops cut by bounding box only.
    pub fallback_crops: usize,
    /// Diagram regions that produced no crop.
    pub skipped_regions: usize,
    /// Text regions located in the transcript.
    pub anchors_resolved: usize,
    /// Image references spliced into the transcript.
    pub diagrams_placed: usize,
    pub duration_ms: u64,
}
