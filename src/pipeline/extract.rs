//! Region extraction: cut every `diagram` region out of the page raster.
//!
//! Each region is cropped to its polygon, not just its bounding box: the
//! polygon is rasterised into a full-page mask, mask and page are cropped to
//! the same rectangle, and pixels outside the polygon become white. Regions
//! whose polygon is too damaged for that fall back to a plain bounding-box
//! crop. Only an unreadable source image fails the whole call; everything
//! region-level is recorded as a [`RegionIssue`] and processing moves on.

use crate::error::{ExamOcrError, RegionIssue};
use crate::ocr::{Region, RegionKind};
use crate::output::CropArtifact;
use crate::pipeline::geometry::{
    clamp_bbox, points_bounds, polygon_mask, sanitize_polygon, PixelBox, PixelPoint,
};
use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A polygon needs at least this many in-bounds vertices to be used as a mask.
pub const MIN_POLYGON_POINTS: usize = 3;

/// Everything one extraction pass produced.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Diagram regions considered (tagged `diagram`, polygon present).
    pub diagram_regions: usize,
    pub crops: Vec<CropArtifact>,
    pub issues: Vec<RegionIssue>,
}

impl ExtractionReport {
    pub fn precise_count(&self) -> usize {
        self.crops.iter().filter(|c| c.is_precise()).count()
    }

    pub fn fallback_count(&self) -> usize {
        self.crops.len() - self.precise_count()
    }

    pub fn skipped_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_skip()).count()
    }
}

/// Crop every diagram region of `image_path` into `out_dir/<image stem>/`.
///
/// Returns one [`CropArtifact`] per saved crop, in region order.
///
/// # Errors
/// Fatal only when the source image cannot be read or an output file cannot
/// be written. Malformed polygons never fail the call.
pub fn extract_diagrams(
    image_path: &Path,
    regions: &[Region],
    out_dir: &Path,
) -> Result<Vec<CropArtifact>, ExamOcrError> {
    extract_diagrams_with_report(image_path, regions, out_dir).map(|report| report.crops)
}

/// Like [`extract_diagrams`], also returning the per-region issues.
pub fn extract_diagrams_with_report(
    image_path: &Path,
    regions: &[Region],
    out_dir: &Path,
) -> Result<ExtractionReport, ExamOcrError> {
    let diagrams: Vec<&Region> = regions
        .iter()
        .filter(|r| r.kind == RegionKind::Diagram && r.has_polygon())
        .collect();

    let mut report = ExtractionReport {
        diagram_regions: diagrams.len(),
        ..ExtractionReport::default()
    };

    // Nothing to crop: the page raster is never opened.
    if diagrams.is_empty() {
        debug!("No diagram regions for {}", image_path.display());
        return Ok(report);
    }

    let source = load_rgba(image_path)?;
    let (width, height) = source.dimensions();

    let page_dir = crop_dir(out_dir, image_path);
    std::fs::create_dir_all(&page_dir).map_err(|e| ExamOcrError::OutputDirFailed {
        path: page_dir.clone(),
        source: e,
    })?;

    for (index, region) in diagrams.into_iter().enumerate() {
        let id = region.id_str().map(str::to_string);
        let polygon = sanitize_polygon(region.coordinate_pairs(), width, height);
        let usable_points = polygon.len();

        let precise_bounds = (usable_points >= MIN_POLYGON_POINTS)
            .then(|| points_bounds(&polygon))
            .flatten();

        let (bbox, polygon) = match (precise_bounds, region.bounding_box()) {
            (Some(raw), _) => (clamp_bbox(raw, width, height), Some(polygon)),
            (None, Some(raw)) => (
                clamp_bbox((raw.min_x, raw.min_y, raw.max_x, raw.max_y), width, height),
                None,
            ),
            (None, None) => {
                let issue = RegionIssue::NoCoordinates { index, id };
                warn!("{}", issue);
                report.issues.push(issue);
                continue;
            }
        };

        if bbox.is_degenerate() {
            let issue = RegionIssue::DegenerateCrop {
                index,
                id,
                width: bbox.width(),
                height: bbox.height(),
            };
            warn!("{}", issue);
            report.issues.push(issue);
            continue;
        }

        let pixels = match &polygon {
            Some(points) => masked_crop(&source, points, bbox),
            None => {
                let issue = RegionIssue::FallbackCrop {
                    index,
                    id: id.clone(),
                    usable_points,
                };
                debug!("{}", issue);
                report.issues.push(issue);
                plain_crop(&source, bbox)
            }
        };

        let path = page_dir.join(format!("diagram_{index:02}.png"));
        pixels
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| ExamOcrError::CropWriteFailed {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        debug!(
            "Saved diagram {} ({}x{} at {},{}) → {}",
            index,
            bbox.width(),
            bbox.height(),
            bbox.left,
            bbox.top,
            path.display()
        );

        report.crops.push(CropArtifact {
            id,
            path,
            bbox,
            polygon,
        });
    }

    info!(
        "Extracted {}/{} diagrams from {} → {}",
        report.crops.len(),
        report.diagram_regions,
        image_path.display(),
        page_dir.display()
    );
    let (fallback, skipped) = (report.fallback_count(), report.skipped_count());
    if fallback > 0 || skipped > 0 {
        warn!(
            "{}: {} bounding-box fallbacks, {} regions skipped",
            image_path.display(),
            fallback,
            skipped
        );
    }

    Ok(report)
}

/// Directory holding the crops of one source image.
pub fn crop_dir(out_dir: &Path, image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string());
    out_dir.join(stem)
}

fn load_rgba(image_path: &Path) -> Result<RgbaImage, ExamOcrError> {
    if !image_path.exists() {
        return Err(ExamOcrError::ImageNotFound {
            path: image_path.to_path_buf(),
        });
    }
    let img = image::open(image_path).map_err(|e| ExamOcrError::ImageUnreadable {
        path: image_path.to_path_buf(),
        detail: e.to_string(),
    })?;
    debug!(
        "Loaded {} ({}x{})",
        image_path.display(),
        img.width(),
        img.height()
    );
    Ok(img.to_rgba8())
}

/// Crop without a mask; any alpha channel is dropped.
fn plain_crop(source: &RgbaImage, bbox: PixelBox) -> RgbImage {
    let region =
        imageops::crop_imm(source, bbox.left, bbox.top, bbox.width(), bbox.height()).to_image();
    DynamicImage::ImageRgba8(region).to_rgb8()
}

/// Crop to `bbox`, keeping only pixels inside the polygon and painting the
/// rest white.
fn masked_crop(source: &RgbaImage, polygon: &[PixelPoint], bbox: PixelBox) -> RgbImage {
    let (width, height) = source.dimensions();
    let full_mask = polygon_mask(polygon, width, height);

    let (w, h) = (bbox.width(), bbox.height());
    let mask = imageops::crop_imm(&full_mask, bbox.left, bbox.top, w, h).to_image();
    let region = imageops::crop_imm(source, bbox.left, bbox.top, w, h).to_image();

    let mut out = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
    for (x, y, px) in out.enumerate_pixels_mut() {
        let [r, g, b, a] = region.get_pixel(x, y).0;
        let coverage = mask.get_pixel(x, y).0[0] as u32 * a as u32 / 255;
        *px = Rgb([
            over_white(r, coverage),
            over_white(g, coverage),
            over_white(b, coverage),
        ]);
    }
    out
}

/// Composite one channel at `alpha` (0–255) over white.
fn over_white(channel: u8, alpha: u32) -> u8 {
    ((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
}
