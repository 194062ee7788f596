//! SQL candidate extraction from raw model output.
//!
//! The extractor is permissive: it recovers at most one SQL-shaped string
//! from noisy text and leaves every safety decision to the validator.

pub mod markup;
pub mod rules;

use serde::Serialize;
use std::fmt;

pub use markup::{split_sections, strip_markup, Section};

/// Which extraction path produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPath {
    /// A statement shape matched inside a surviving section.
    Section,
    /// The last-resort scan for the first statement-like line.
    LineScan,
}

/// A string believed to hold one SQL statement.
///
/// Carries no guarantees beyond being SQL-shaped; it is untrusted input to
/// the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCandidate {
    sql: String,
    path: ExtractionPath,
}

impl SqlCandidate {
    pub fn new(sql: impl Into<String>, path: ExtractionPath) -> Self {
        Self {
            sql: sql.into(),
            path,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn path(&self) -> ExtractionPath {
        self.path
    }

    pub fn into_string(self) -> String {
        self.sql
    }
}

impl fmt::Display for SqlCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Picks one candidate out of everything the section rules found.
///
/// Candidates arrive normalized and in document order.
pub trait CandidatePolicy: Send + Sync {
    fn choose(&self, candidates: Vec<String>) -> Option<String>;
}

/// Prefers the longest structurally plausible candidate.
///
/// This is a heuristic tie-break with no semantic grounding. On equal
/// length the earliest candidate wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct LongestPlausible;

impl CandidatePolicy for LongestPlausible {
    fn choose(&self, candidates: Vec<String>) -> Option<String> {
        candidates
            .into_iter()
            .filter(|c| rules::is_plausible(c))
            .rev()
            .max_by_key(|c| c.len())
    }
}

/// Takes the first structurally plausible candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstPlausible;

impl CandidatePolicy for FirstPlausible {
    fn choose(&self, candidates: Vec<String>) -> Option<String> {
        candidates.into_iter().find(|c| rules::is_plausible(c))
    }
}

/// Recovers a single SQL candidate from raw model output.
pub struct Extractor {
    policy: Box<dyn CandidatePolicy>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}

impl Extractor {
    /// Creates an extractor using the longest-plausible policy.
    pub fn new() -> Self {
        Self::with_policy(LongestPlausible)
    }

    /// Creates an extractor with a custom candidate policy.
    pub fn with_policy(policy: impl CandidatePolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    /// Extracts at most one SQL candidate from `raw`.
    pub fn extract(&self, raw: &str) -> Option<SqlCandidate> {
        if raw.trim().is_empty() {
            return None;
        }

        let stripped = strip_markup(raw);
        let candidates: Vec<String> = split_sections(&stripped)
            .iter()
            .filter(|section| !section.is_narration())
            .flat_map(section_candidates)
            .map(|c| rules::normalize(&c))
            .collect();

        tracing::debug!(count = candidates.len(), "Section candidates found");

        if let Some(sql) = self.policy.choose(candidates) {
            return Some(SqlCandidate::new(sql, ExtractionPath::Section));
        }

        let fallback = rules::first_statement_line(&stripped)?;
        tracing::debug!(line = %fallback, "Falling back to line scan");
        Some(SqlCandidate::new(fallback, ExtractionPath::LineScan))
    }
}

/// Applies every statement-shape rule to one section, in priority order.
///
/// All matches go into the pool; the policy picks among them.
fn section_candidates(section: &Section) -> Vec<String> {
    let text = section.text();
    [
        rules::cte_statement(&text),
        rules::select_statement(&text),
        rules::line_statement(&section.lines),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Extracts a candidate with the default extractor.
pub fn extract_sql(raw: &str) -> Option<SqlCandidate> {
    Extractor::new().extract(raw)
}
