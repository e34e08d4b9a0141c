//! Page annotation entry points.
//!
//! [`annotate_page`] is the synchronous core: validate the image, format the
//! transcript, crop diagrams, splice them back in. [`annotate_page_async`]
//! moves the same work onto tokio's blocking pool, and
//! [`annotate_to_file`] additionally writes the Markdown to disk.

use crate::config::AnnotateConfig;
use crate::error::ExamOcrError;
use crate::ocr::OcrResult;
use crate::output::{AnnotationStats, PageAnnotation};
use crate::pipeline::{extract, input, interleave, postprocess};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Annotate one page image with its OCR result.
///
/// # Arguments
/// * `image_path`: Page raster the OCR result was produced from
/// * `ocr`: Parsed OCR response (transcript + regions)
/// * `config`: Output directory and interleaving parameters
///
/// # Returns
/// `Ok(PageAnnotation)` even when some diagram regions were skipped
/// (check `annotation.issues`).
///
/// # Errors
/// Returns `Err(ExamOcrError)` only for fatal errors:
/// - Image not found / permission denied / unsupported extension
/// - Image cannot be decoded (only when the page has diagram regions)
/// - Crop directory or crop file cannot be written
pub fn annotate_page(
    image_path: impl AsRef<Path>,
    ocr: &OcrResult,
    config: &AnnotateConfig,
) -> Result<PageAnnotation, ExamOcrError> {
    let start = Instant::now();

    // ── Step 1: Validate input ───────────────────────────────────────────
    let image_path = input::resolve_image(image_path)?;
    info!(
        "Annotating {} ({} regions)",
        image_path.display(),
        ocr.line_data.len()
    );

    // ── Step 2: Format transcript ────────────────────────────────────────
    let transcript = if config.exam_formatting {
        postprocess::format_exam_text(&ocr.text)
    } else {
        ocr.text.clone()
    };

    // ── Step 3: Crop diagrams ────────────────────────────────────────────
    let extraction =
        extract::extract_diagrams_with_report(&image_path, &ocr.line_data, &config.diagrams_dir)?;

    // ── Step 4: Interleave ───────────────────────────────────────────────
    let placed = interleave::interleave(
        &transcript,
        &ocr.line_data,
        &extraction.crops,
        config.min_gap_px,
        config.snippet_chars,
    );
    debug!(
        "{} anchors resolved, {} diagrams placed",
        placed.anchors_resolved, placed.diagrams_placed
    );

    let stats = AnnotationStats {
        regions: ocr.line_data.len(),
        diagram_regions: extraction.diagram_regions,
        precise_crops: extraction.precise_count(),
        fallback_crops: extraction.fallback_count(),
        skipped_regions: extraction.skipped_count(),
        anchors_resolved: placed.anchors_resolved,
        diagrams_placed: placed.diagrams_placed,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Annotated {}: {} crops, {} placed, {}ms",
        image_path.display(),
        extraction.crops.len(),
        stats.diagrams_placed,
        stats.duration_ms
    );

    Ok(PageAnnotation {
        markdown: placed.markdown,
        crops: extraction.crops,
        issues: extraction.issues,
        stats,
    })
}

/// Async wrapper around [`annotate_page`].
///
/// Decoding, masking, and PNG encoding are CPU-bound, so the work runs on
/// tokio's blocking pool.
pub async fn annotate_page_async(
    image_path: PathBuf,
    ocr: OcrResult,
    config: AnnotateConfig,
) -> Result<PageAnnotation, ExamOcrError> {
    tokio::task::spawn_blocking(move || annotate_page(&image_path, &ocr, &config))
        .await
        .map_err(|e| ExamOcrError::Internal(format!("annotation task failed: {e}")))?
}

/// Annotate a page and write the Markdown directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn annotate_to_file(
    image_path: impl AsRef<Path>,
    ocr: OcrResult,
    output_path: impl AsRef<Path>,
    config: &AnnotateConfig,
) -> Result<AnnotationStats, ExamOcrError> {
    let annotation =
        annotate_page_async(image_path.as_ref().to_path_buf(), ocr, config.clone()).await?;
    write_markdown(output_path, &annotation.markdown).await?;
    Ok(annotation.stats)
}

/// Write `markdown` to `path` via a sibling temp file and a rename, creating
/// parent directories as needed.
pub async fn write_markdown(path: impl AsRef<Path>, markdown: &str) -> Result<(), ExamOcrError> {
    let path = path.as_ref();
    let write_failed = |e: std::io::Error| ExamOcrError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::Region;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn page(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("page.png");
        RgbImage::from_pixel(60, 80, Rgb([10, 20, 30]))
            .save(&path)
            .expect("save page");
        path
    }

    fn config(dir: &TempDir) -> AnnotateConfig {
        AnnotateConfig::builder()
            .diagrams_dir(dir.path().join("diagrams"))
            .build()
            .expect("config")
    }

    fn ocr(text: &str, regions: Vec<Region>) -> OcrResult {
        OcrResult {
            text: text.to_string(),
            line_data: regions,
            ..OcrResult::default()
        }
    }

    #[test]
    fn annotate_places_diagram_after_its_stem() {
        let dir = TempDir::new().expect("tempdir");
        let image = page(&dir);
        let result = ocr(
            "Intro line\nBelow figure",
            vec![
                Region::text_line("t1", "Intro line", &[(0.0, 0.0), (50.0, 0.0), (50.0, 8.0)]),
                Region::diagram("d1", &[(5.0, 20.0), (40.0, 20.0), (40.0, 50.0), (5.0, 50.0)]),
                Region::text_line("t2", "Below figure", &[(0.0, 60.0), (50.0, 60.0), (50.0, 70.0)]),
            ],
        );

        let out = annotate_page(&image, &result, &config(&dir)).expect("annotate");
        assert_eq!(out.crops.len(), 1);
        let crop = out.crops[0].path.display().to_string();
        assert_eq!(
            out.markdown,
            format!("Intro line\n\n![]({crop})\n\nBelow figure")
        );
        assert_eq!(out.stats.regions, 3);
        assert_eq!(out.stats.precise_crops, 1);
        assert_eq!(out.stats.anchors_resolved, 2);
        assert_eq!(out.stats.diagrams_placed, 1);
        assert!(out.issues.is_empty());
    }

    #[test]
    fn annotate_anchors_text_with_zero_width_space() {
        let dir = TempDir::new().expect("tempdir");
        let image = page(&dir);
        let caption = "Hình\u{200B} vẽ bên";
        let result = ocr(
            &format!("Intro\n{caption}\nEnd"),
            vec![
                Region::diagram("d", &[(5.0, 10.0), (40.0, 10.0), (40.0, 30.0), (5.0, 30.0)]),
                Region::text_line("t1", caption, &[(0.0, 50.0), (50.0, 50.0), (50.0, 58.0)]),
            ],
        );

        let out = annotate_page(&image, &result, &config(&dir)).expect("annotate");
        let crop = out.crops[0].path.display().to_string();
        assert_eq!(
            out.markdown,
            format!("Intro\n\n![]({crop})\n\n{caption}\nEnd")
        );
        assert_eq!(out.stats.anchors_resolved, 1);
    }

    #[test]
    fn annotate_applies_exam_formatting() {
        let dir = TempDir::new().expect("tempdir");
        let image = page(&dir);
        let result = ocr("PHẦN I\nCâu 1:  Chọn đáp án", vec![]);

        let out = annotate_page(&image, &result, &config(&dir)).expect("annotate");
        assert_eq!(out.markdown, "**PHẦN I**\n**Câu 1:** Chọn đáp án");

        let plain = AnnotateConfig {
            exam_formatting: false,
            ..config(&dir)
        };
        let out = annotate_page(&image, &result, &plain).expect("annotate");
        assert_eq!(out.markdown, result.text);
    }

    #[test]
    fn annotate_missing_image_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let err = annotate_page(dir.path().join("gone.png"), &ocr("x", vec![]), &config(&dir))
            .unwrap_err();
        assert!(matches!(err, ExamOcrError::ImageNotFound { .. }), "{err:?}");
    }

    #[test]
    fn annotate_counts_skipped_regions() {
        let dir = TempDir::new().expect("tempdir");
        let image = page(&dir);
        let result = ocr(
            "text",
            vec![
                Region::diagram("bad", &[(-5.0, -5.0)]),
                Region::diagram("ok", &[(1.0, 1.0), (9.0, 1.0), (9.0, 9.0)]),
            ],
        );
        let out = annotate_page(&image, &result, &config(&dir)).expect("annotate");
        assert_eq!(out.stats.diagram_regions, 2);
        assert_eq!(out.crops.len() + out.stats.skipped_regions, 2);
        assert_eq!(out.issues.len(), out.stats.skipped_regions + out.stats.fallback_crops);
    }

    #[tokio::test]
    async fn annotate_to_file_writes_markdown() {
        let dir = TempDir::new().expect("tempdir");
        let image = page(&dir);
        let target = dir.path().join("out").join("page.md");

        let stats = annotate_to_file(&image, ocr("Câu 2: y", vec![]), &target, &config(&dir))
            .await
            .expect("annotate");
        assert_eq!(stats.diagrams_placed, 0);
        let written = std::fs::read_to_string(&target).expect("read");
        assert_eq!(written, "**Câu 2:** y");
        assert!(!target.with_extension("md.tmp").exists());
    }
}
