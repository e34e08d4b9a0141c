//! Post-processing: deterministic cleanup of the OCR transcript before
//! diagrams are spliced in.
//!
//! The OCR service returns exam pages as flat MMD. Section titles
//! ("Phần I", "Part II") and question stems ("Câu 3:", "Question 3:") carry
//! no Markdown emphasis, which makes the assembled document hard to scan and
//! breaks the downstream question splitter. These rules add that emphasis
//! without touching any other content.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so the per-line rules see every line.
//! Everything else inside a line is left byte-for-byte intact: text regions
//! are later located in this output by literal search.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all exam-formatting rules to a raw transcript.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Trim every line; blank lines stay as empty lines
/// 3. Bold section headings (`Phần I`, `Part II`, …)
/// 4. Bold question stems (`Câu 1:` → `**Câu 1:** …`)
pub fn format_exam_text(input: &str) -> String {
    normalise_line_endings(input)
        .split('\n')
        .map(format_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_line(line: &str) -> String {
    let line = line.trim();
    if line.is_empty() || line.starts_with("**") {
        return line.to_string();
    }
    if is_section_heading(line) {
        return format!("**{line}**");
    }
    if RE_QUESTION_STEM.is_match(line) {
        if let Some((head, rest)) = line.split_once(':') {
            return format!("**{}:** {}", head, rest.trim());
        }
    }
    line.to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Section headings ─────────────────────────────────────────────────
//
// Matches anywhere in the line, case-insensitively: "PHẦN II. TRẮC NGHIỆM",
// "Part I - Multiple choice". "part i" is a prefix of "part ii"/"part iii",
// so one pattern covers all three numerals.

static RE_SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:phần|part) i").unwrap());

fn is_section_heading(line: &str) -> bool {
    RE_SECTION.is_match(&line.to_lowercase())
}

// ── Rule 4: Question stems ───────────────────────────────────────────────────

static RE_QUESTION_STEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Câu|Question) .*:").unwrap());

// ── Tests ────────────────────────────────────────────────────────────────────
