//! Markup stripping and section splitting for raw model output.

use once_cell::sync::Lazy;
use regex::Regex;

use super::rules;

/// Marker that separates sections once markup has been stripped.
const SECTION_BREAK: &str = "---";

static FENCE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[\w+-]*[ \t]*$").expect("fence line regex"));

static INLINE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```(?:sqlite\b|sql\b)?").expect("inline fence regex"));

static CHAT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\|[a-z_]+\|>").expect("chat token regex"));

static BOLD_STARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").expect("bold regex"));

static BOLD_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__([^_\n]+)__").expect("bold regex"));

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").expect("heading regex"));

static CODE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`\n]*\s[^`\n]*)`").expect("code span regex"));

static RULE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:-{3,}|\*{3,}|={3,}|_{3,})\s*$").expect("horizontal rule regex")
});

static HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(output|sql query|sql|query|answer|user'?s question|question|explanation|result)\s*:\s*(.*)$",
    )
    .expect("section header regex")
});

/// A run of lines between section breaks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Lowercased header label, if the section opened with one.
    pub label: Option<String>,
    pub lines: Vec<String>,
}

impl Section {
    fn labeled(label: &str) -> Self {
        Self {
            label: Some(label.to_lowercase()),
            lines: Vec::new(),
        }
    }

    /// Joins the section's lines with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Returns true if no line carries any text.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    /// Returns true if the section narrates reasoning steps.
    pub fn is_narration(&self) -> bool {
        rules::has_narration(&self.text())
    }
}

/// Removes presentation markup from raw model output.
///
/// Code fences and chat-template tokens become section breaks, so text on
/// either side of a fenced block lands in separate sections. Emphasis and
/// headings are dropped; code spans that hold more than one word are
/// unwrapped.
pub fn strip_markup(raw: &str) -> String {
    let brk = format!("\n{SECTION_BREAK}\n");

    let text = FENCE_LINE.replace_all(raw, SECTION_BREAK);
    let text = INLINE_FENCE.replace_all(&text, brk.as_str());
    let text = CHAT_TOKEN.replace_all(&text, brk.as_str());
    let text = BOLD_STARS.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = CODE_SPAN.replace_all(&text, "$1");

    text.into_owned()
}

/// Splits stripped text into sections.
///
/// A horizontal rule closes the current section. A header line such as
/// `SQL Query:` opens a new labeled section, and any text after the colon
/// becomes its first line. Empty sections are dropped.
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section::default();

    for line in text.lines() {
        if RULE_LINE.is_match(line) {
            sections.push(std::mem::take(&mut current));
            continue;
        }

        if let Some(caps) = HEADER_LINE.captures(line) {
            sections.push(std::mem::take(&mut current));
            current = Section::labeled(&caps[1]);
            let rest = caps[2].trim();
            if !rest.is_empty() {
                current.lines.push(rest.to_string());
            }
            continue;
        }

        if current.lines.is_empty() && line.trim().is_empty() {
            continue;
        }
        current.lines.push(line.to_string());
    }
    sections.push(current);

    sections.retain(|section| !section.is_empty());
    for section in &mut sections {
        while section
            .lines
            .last()
            .is_some_and(|line| line.trim().is_empty())
        {
            section.lines.pop();
        }
    }
    sections
}
