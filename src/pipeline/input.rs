//! Input resolution: validate the page image path and load the OCR result.
//!
//! Both checks run before any region is touched so that a typo in a path
//! surfaces as a precise error rather than as a decoder failure halfway
//! through extraction.

use crate::error::ExamOcrError;
use crate::ocr::OcrResult;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Raster formats accepted as page images (lower-case, without the dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// True when `path` carries one of [`SUPPORTED_EXTENSIONS`], ignoring case.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validate a local page image path.
///
/// Checks, in order: the file exists, it can be opened for reading, and its
/// extension names a supported raster format.
pub fn resolve_image(path: impl AsRef<Path>) -> Result<PathBuf, ExamOcrError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(ExamOcrError::ImageNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(ExamOcrError::PermissionDenied { path });
        }
        Err(_) => return Err(ExamOcrError::ImageNotFound { path }),
    }

    if !is_supported_image(&path) {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(ExamOcrError::UnsupportedImageFormat { path, extension });
    }

    debug!("Resolved page image: {}", path.display());
    Ok(path)
}

/// Read and parse an OCR result JSON file.
pub fn load_ocr_result(path: impl AsRef<Path>) -> Result<OcrResult, ExamOcrError> {
    let path = path.as_ref();

    let body = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ExamOcrError::OcrResultNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => ExamOcrError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExamOcrError::InvalidOcrResult {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;

    let result = OcrResult::from_json_str(&body).map_err(|e| ExamOcrError::InvalidOcrResult {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    debug!(
        "Loaded OCR result {}: {} regions, {} diagrams",
        path.display(),
        result.line_data.len(),
        result.diagram_count()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(b"x"))
            .expect("write fixture");
        path
    }

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("page.png")));
        assert!(is_supported_image(Path::new("page.JPEG")));
        assert!(is_supported_image(Path::new("/a/b/scan.TiFf")));
        assert!(!is_supported_image(Path::new("page.pdf")));
        assert!(!is_supported_image(Path::new("page")));
        assert!(!is_supported_image(Path::new(".png")));
    }

    #[test]
    fn test_resolve_missing_image() {
        let dir = TempDir::new().expect("tempdir");
        let err = resolve_image(dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, ExamOcrError::ImageNotFound { .. }), "{err:?}");
    }

    #[test]
    fn test_resolve_directory_is_not_an_image() {
        let dir = TempDir::new().expect("tempdir");
        let err = resolve_image(dir.path()).unwrap_err();
        assert!(matches!(err, ExamOcrError::ImageNotFound { .. }), "{err:?}");
    }

    #[test]
    fn test_resolve_unsupported_extension() {
        let dir = TempDir::new().expect("tempdir");
        let path = touch(&dir, "scan.pdf");
        match resolve_image(&path).unwrap_err() {
            ExamOcrError::UnsupportedImageFormat { extension, .. } => assert_eq!(extension, "pdf"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_ok_keeps_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = touch(&dir, "Page_01.PNG");
        assert_eq!(resolve_image(&path).expect("resolve"), path);
    }

    #[test]
    fn test_load_missing_ocr_result() {
        let dir = TempDir::new().expect("tempdir");
        let err = load_ocr_result(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ExamOcrError::OcrResultNotFound { .. }), "{err:?}");
    }

    #[test]
    fn test_load_invalid_ocr_result() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").expect("write");
        let err = load_ocr_result(&path).unwrap_err();
        assert!(matches!(err, ExamOcrError::InvalidOcrResult { .. }), "{err:?}");
    }

    #[test]
    fn test_load_ocr_result() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("page.json");
        std::fs::write(
            &path,
            r#"{"text":"Câu 1: x","line_data":[
                {"type":"diagram","id":"d1","cnt":[[0,0],[4,0],[4,4]]},
                {"type":"text","id":7,"cnt":[[0,10],[9,10],[9,12]],"text":"Câu 1: x"}
            ]}"#,
        )
        .expect("write");
        let ocr = load_ocr_result(&path).expect("load");
        assert_eq!(ocr.text, "Câu 1: x");
        assert_eq!(ocr.line_data.len(), 2);
        assert_eq!(ocr.diagram_count(), 1);
        assert_eq!(ocr.line_data[1].id_str(), Some("7"));
    }
}
