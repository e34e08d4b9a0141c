//! Text-image interleaving: put each diagram crop back where it sat on the
//! page, inside a transcript that has no position information of its own.
//!
//! ## How position is recovered
//!
//! 1. Every region with a polygon is placed in one global reading order,
//!    sorted by `(top, left)`.
//! 2. Text regions become *anchors*: the first characters of their OCR text
//!    are searched for literally in the transcript, and the line of the
//!    first hit is remembered together with the region's `top`.
//! 3. A diagram goes before the first anchor that starts at or below it
//!    (within `min_gap_px`), or at the end when it sits below every anchor.
//!
//! This is a best-effort heuristic. If the transcript re-typeset a line
//! differently from the region's OCR text, that anchor is simply missing;
//! only a page with no anchors at all is left untouched.

use crate::config::DEFAULT_SNIPPET_CHARS;
use crate::ocr::{Region, RegionBox, RegionKind};
use crate::output::CropArtifact;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Result of one interleaving pass.
#[derive(Debug, Clone, PartialEq)]
pub struct InterleaveReport {
    pub markdown: String,
    /// Text regions located in the transcript.
    pub anchors_resolved: usize,
    /// Image references spliced in.
    pub diagrams_placed: usize,
}

impl InterleaveReport {
    fn unchanged(transcript: &str) -> Self {
        Self {
            markdown: transcript.to_string(),
            anchors_resolved: 0,
            diagrams_placed: 0,
        }
    }
}

/// A region reduced to what reading order and anchoring need.
#[derive(Debug, Clone, Copy)]
pub struct LayoutNode<'a> {
    pub kind: &'a RegionKind,
    pub id: Option<&'a str>,
    pub bbox: RegionBox,
    pub text: &'a str,
}

impl LayoutNode<'_> {
    pub fn top(&self) -> f64 {
        self.bbox.top()
    }

    pub fn left(&self) -> f64 {
        self.bbox.left()
    }
}

/// A text region resolved to a transcript line.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    top: f64,
    line: usize,
}

/// Splice a `![](path)` reference for every cropped diagram into
/// `transcript`, using the default 50-character search probe.
///
/// Returns `transcript` unchanged when there is nothing to insert or no text
/// region could be located.
pub fn insert_diagrams(
    transcript: &str,
    regions: &[Region],
    crops: &[CropArtifact],
    min_gap_px: f64,
) -> String {
    interleave(transcript, regions, crops, min_gap_px, DEFAULT_SNIPPET_CHARS).markdown
}

/// [`insert_diagrams`] with an explicit probe length, also reporting how
/// many anchors resolved and how many diagrams were placed.
pub fn interleave(
    transcript: &str,
    regions: &[Region],
    crops: &[CropArtifact],
    min_gap_px: f64,
    snippet_chars: usize,
) -> InterleaveReport {
    if regions.is_empty() || crops.is_empty() {
        return InterleaveReport::unchanged(transcript);
    }

    let crop_paths: HashMap<&str, &Path> = crops
        .iter()
        .filter(|c| !c.path.as_os_str().is_empty())
        .filter_map(|c| {
            let id = c.id.as_deref().filter(|id| !id.is_empty())?;
            Some((id, c.path.as_path()))
        })
        .collect();

    let nodes = reading_order(regions);
    let text_nodes: Vec<&LayoutNode> = nodes
        .iter()
        .filter(|n| *n.kind == RegionKind::Text)
        .collect();
    let diagram_nodes: Vec<(&LayoutNode, &Path)> = nodes
        .iter()
        .filter(|n| *n.kind == RegionKind::Diagram)
        .filter_map(|n| Some((n, *crop_paths.get(n.id?)?)))
        .collect();

    if text_nodes.is_empty() || diagram_nodes.is_empty() {
        debug!(
            "Nothing to interleave ({} text nodes, {} diagrams with crops)",
            text_nodes.len(),
            diagram_nodes.len()
        );
        return InterleaveReport::unchanged(transcript);
    }

    let mut lines = split_lines(transcript);
    let haystack = lines.join("\n");

    let mut anchors: Vec<Anchor> = text_nodes
        .iter()
        .filter_map(|n| {
            let line = locate_line(&haystack, n.text, snippet_chars)?;
            Some(Anchor { top: n.top(), line })
        })
        .collect();

    if anchors.is_empty() {
        info!(
            "No text region could be located in the transcript; {} diagrams left out",
            diagram_nodes.len()
        );
        return InterleaveReport::unchanged(transcript);
    }
    anchors.sort_by(|a, b| a.top.total_cmp(&b.top));
    debug!(
        "Resolved {}/{} text anchors",
        anchors.len(),
        text_nodes.len()
    );

    let references: Vec<(usize, usize, String)> = diagram_nodes
        .iter()
        .enumerate()
        .map(|(order, (node, path))| {
            let line = insertion_line(&anchors, node.top(), min_gap_px, lines.len());
            (line, order, format!("![]({})", path.display()))
        })
        .collect();

    // Bottom-up so pending insertion points never shift. Within one line the
    // later diagram goes in first, leaving reading order top to bottom.
    let mut plan: Vec<&(usize, usize, String)> = references.iter().collect();
    plan.sort_by_key(|(line, order, _)| (Reverse(*line), Reverse(*order)));
    for (line, _, reference) in plan {
        lines.splice(*line..*line, ["", reference.as_str(), ""]);
    }

    info!(
        "Placed {} diagrams using {} anchors",
        references.len(),
        anchors.len()
    );

    InterleaveReport {
        markdown: lines.join("\n"),
        anchors_resolved: anchors.len(),
        diagrams_placed: references.len(),
    }
}

/// Regions carrying at least one coordinate pair, stably sorted by
/// `(top, left)`.
///
/// Regions tied on both keys keep their input order.
pub fn reading_order(regions: &[Region]) -> Vec<LayoutNode<'_>> {
    let mut nodes: Vec<LayoutNode> = regions
        .iter()
        .filter_map(|r| {
            Some(LayoutNode {
                kind: &r.kind,
                id: r.id_str(),
                bbox: r.bounding_box()?,
                text: &r.text,
            })
        })
        .collect();
    nodes.sort_by(|a, b| a.top().total_cmp(&b.top()).then(a.left().total_cmp(&b.left())));
    nodes
}

/// Split on `\n`, `\r\n`, and lone `\r`. A trailing terminator does not
/// start an extra empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(i) => {
                lines.push(&rest[..i]);
                let terminator = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + terminator..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

/// Zero-based line of the first literal occurrence of `text`'s leading
/// `snippet_chars` characters (after trimming) in `haystack`.
fn locate_line(haystack: &str, text: &str, snippet_chars: usize) -> Option<usize> {
    let snippet = text.trim();
    if snippet.is_empty() {
        return None;
    }
    let probe = match snippet.char_indices().nth(snippet_chars) {
        Some((end, _)) => &snippet[..end],
        None => snippet,
    };
    let offset = haystack.find(probe)?;
    Some(haystack[..offset].bytes().filter(|&b| b == b'\n').count())
}

/// Line of the first anchor at or below `diagram_top - min_gap_px`, or
/// `line_count` (append) when the diagram is below every anchor.
fn insertion_line(anchors: &[Anchor], diagram_top: f64, min_gap_px: f64, line_count: usize) -> usize {
    anchors
        .iter()
        .find(|a| a.top >= diagram_top - min_gap_px)
        .map_or(line_count, |a| a.line)
}
