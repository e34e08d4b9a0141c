//! OCR result model: the transcript plus typed page regions.
//!
//! The shape follows the OCR service's `v3/text` response when requested with
//! `include_line_data`: a top-level `text` transcript and a `line_data` list
//! where each record carries a `type` tag, an opaque `id`, the region polygon
//! as `cnt` (pixel coordinates), and for text lines the OCR'd `text`.
//!
//! Deserialisation is deliberately lenient. Polygons coming back from the
//! service are occasionally short or contain entries that are not `[x, y]`
//! pairs; those are kept as [`RawPoint::Malformed`] so one bad record never
//! fails the whole page. Unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Parsed OCR response for one page image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    /// Full transcript (Markdown / MMD).
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,

    /// Region records in the order the service emitted them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub line_data: Vec<Region>,

    /// Overall recognition confidence, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
}

impl OcrResult {
    /// Parse an OCR response body.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Number of regions tagged `diagram`.
    pub fn diagram_count(&self) -> usize {
        self.line_data
            .iter()
            .filter(|r| r.kind == RegionKind::Diagram)
            .count()
    }
}

/// One element detected on a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Region {
    /// Opaque identifier joining the region to its crop file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RegionId>,

    #[serde(rename = "type", default)]
    pub kind: RegionKind,

    /// Polygon as emitted by the service (`cnt`), possibly malformed.
    #[serde(rename = "cnt", default, deserialize_with = "null_as_default")]
    pub polygon: Vec<RawPoint>,

    /// OCR text of a text-line region; empty for other kinds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

impl Region {
    /// A region with the given kind and well-formed polygon points.
    pub fn new(kind: RegionKind, id: impl Into<RegionId>, points: &[(f64, f64)]) -> Self {
        Self {
            id: Some(id.into()),
            kind,
            polygon: points.iter().map(|&(x, y)| RawPoint::Pair([x, y])).collect(),
            text: String::new(),
        }
    }

    /// A `diagram` region.
    pub fn diagram(id: impl Into<RegionId>, points: &[(f64, f64)]) -> Self {
        Self::new(RegionKind::Diagram, id, points)
    }

    /// A `text` region carrying its OCR text.
    pub fn text_line(id: impl Into<RegionId>, text: impl Into<String>, points: &[(f64, f64)]) -> Self {
        Self {
            text: text.into(),
            ..Self::new(RegionKind::Text, id, points)
        }
    }

    /// True when the record carries any polygon entry at all.
    pub fn has_polygon(&self) -> bool {
        !self.polygon.is_empty()
    }

    /// Well-formed `(x, y)` pairs of the polygon, in order.
    pub fn coordinate_pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.polygon.iter().filter_map(RawPoint::pair)
    }

    /// Axis-aligned bounds over all well-formed pairs, unclamped.
    ///
    /// `None` when the polygon has no well-formed pair.
    pub fn bounding_box(&self) -> Option<RegionBox> {
        RegionBox::from_pairs(self.coordinate_pairs())
    }

    /// The id as a string slice, if present and non-empty.
    pub fn id_str(&self) -> Option<&str> {
        self.id.as_ref().map(RegionId::as_str).filter(|s| !s.is_empty())
    }
}

/// Region type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RegionKind {
    Text,
    Diagram,
    /// Any other tag (`math`, `table`, `chart`, …), passed through untouched.
    Other(String),
}

impl Default for RegionKind {
    fn default() -> Self {
        RegionKind::Other(String::new())
    }
}

impl From<String> for RegionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => RegionKind::Text,
            "diagram" => RegionKind::Diagram,
            _ => RegionKind::Other(s),
        }
    }
}

impl From<RegionKind> for String {
    fn from(kind: RegionKind) -> Self {
        match kind {
            RegionKind::Text => "text".to_string(),
            RegionKind::Diagram => "diagram".to_string(),
            RegionKind::Other(s) => s,
        }
    }
}

/// Opaque region identifier.
///
/// The service emits string ids; numeric ids are accepted and kept in their
/// decimal form so they still join against crop artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "IdRepr", into = "String")]
pub struct RegionId(String);

impl RegionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        RegionId(s.to_string())
    }
}

impl From<String> for RegionId {
    fn from(s: String) -> Self {
        RegionId(s)
    }
}

impl From<u64> for RegionId {
    fn from(n: u64) -> Self {
        RegionId(n.to_string())
    }
}

impl From<RegionId> for String {
    fn from(id: RegionId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Str(String),
    Num(serde_json::Number),
}

impl From<IdRepr> for RegionId {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Str(s) => RegionId(s),
            IdRepr::Num(n) => RegionId(n.to_string()),
        }
    }
}

/// One entry of a `cnt` polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPoint {
    /// A well-formed `[x, y]` pair.
    Pair([f64; 2]),
    /// Anything else the service sent.
    Malformed(serde_json::Value),
}

impl RawPoint {
    pub fn pair(&self) -> Option<(f64, f64)> {
        match self {
            RawPoint::Pair([x, y]) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        }
    }
}

/// Unclamped axis-aligned bounds of a region, in source pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl RegionBox {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        pairs.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => RegionBox {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => RegionBox {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            })
        })
    }

    /// Vertical reading-order key.
    pub fn top(&self) -> f64 {
        self.min_y
    }

    /// Horizontal reading-order key.
    pub fn left(&self) -> f64 {
        self.min_x
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "text": "Câu 1: Cho hình vẽ\nA. 1\nB. 2",
        "confidence": 0.98,
        "image_width": 800,
        "image_height": 1200,
        "line_data": [
            {"type": "text", "id": "t1", "cnt": [[10, 20], [300, 20], [300, 50], [10, 50]], "text": "Câu 1: Cho hình vẽ", "included": true},
            {"type": "diagram", "id": "d1", "cnt": [[50.4, 60], [400, 60.6], [400, 300], [50, 300]]},
            {"type": "math", "id": 7, "cnt": [[1, 2], "junk", [3]]},
            {"type": "text", "id": "t2", "cnt": null, "text": null}
        ]
    }"#;

    #[test]
    fn parses_service_response() {
        let r = OcrResult::from_json_str(SAMPLE).expect("valid json");
        assert_eq!(r.line_data.len(), 4);
        assert_eq!(r.image_width, Some(800));
        assert_eq!(r.diagram_count(), 1);
        assert_eq!(r.line_data[0].kind, RegionKind::Text);
        assert_eq!(r.line_data[1].kind, RegionKind::Diagram);
        assert_eq!(r.line_data[2].kind, RegionKind::Other("math".into()));
    }

    #[test]
    fn numeric_id_is_stringified() {
        let r = OcrResult::from_json_str(SAMPLE).expect("valid json");
        assert_eq!(r.line_data[2].id_str(), Some("7"));
    }

    #[test]
    fn malformed_points_are_kept_but_skipped() {
        let r = OcrResult::from_json_str(SAMPLE).expect("valid json");
        let math = &r.line_data[2];
        assert_eq!(math.polygon.len(), 3);
        assert_eq!(math.coordinate_pairs().collect::<Vec<_>>(), vec![(1.0, 2.0)]);
        assert!(matches!(math.polygon[1], RawPoint::Malformed(_)));
    }

    #[test]
    fn null_fields_default_to_empty() {
        let r = OcrResult::from_json_str(SAMPLE).expect("valid json");
        let t2 = &r.line_data[3];
        assert!(!t2.has_polygon());
        assert!(t2.text.is_empty());
        assert!(t2.bounding_box().is_none());
    }

    #[test]
    fn missing_top_level_fields_default() {
        let r = OcrResult::from_json_str("{}").expect("valid json");
        assert!(r.text.is_empty());
        assert!(r.line_data.is_empty());
    }

    #[test]
    fn bounding_box_over_pairs() {
        let r = OcrResult::from_json_str(SAMPLE).expect("valid json");
        let b = r.line_data[1].bounding_box().expect("has pairs");
        assert_eq!(b.left(), 50.0);
        assert_eq!(b.top(), 60.0);
        assert_eq!(b.max_x, 400.0);
        assert_eq!(b.max_y, 300.0);
    }

    #[test]
    fn kind_round_trips_through_json() {
        let region = Region::diagram("d9", &[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]);
        let json = serde_json::to_value(&region).expect("serialise");
        assert_eq!(json["type"], "diagram");
        assert_eq!(json["id"], "d9");
        assert_eq!(json["cnt"][1], serde_json::json!([5.0, 0.0]));
    }

    #[test]
    fn empty_id_is_not_joinable() {
        let region = Region::diagram("", &[(0.0, 0.0)]);
        assert_eq!(region.id_str(), None);
    }
}
