//! Statement-shape rules used by the extractor.
//!
//! Each rule is a pure function over text or lines. The extractor applies
//! them in priority order; none of them decide whether SQL is safe.

use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords that can open a statement.
///
/// Non-read keywords are included so that a mutating statement reaches the
/// validator and is rejected with a precise reason.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "PRAGMA", "ATTACH",
    "REPLACE", "EXPLAIN",
];

/// Leading tokens that continue a statement onto the next line.
pub const CONTINUATION_KEYWORDS: &[&str] = &[
    "FROM", "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "OUTER", "NATURAL", "ON",
    "USING", "AND", "OR", "GROUP", "ORDER", "HAVING", "LIMIT", "OFFSET", "UNION", "INTERSECT",
    "EXCEPT", "SELECT", "WITH", "AS", "CASE", "WHEN", "THEN", "ELSE", "END", "SET", "VALUES",
    "NOT", "IN", "EXISTS", "BETWEEN", "LIKE", "DESC", "ASC", ",", "(", ")",
];

/// Trailing keywords that leave a line waiting for more SQL.
const OPEN_ENDED_KEYWORDS: &[&str] = &[
    "SELECT", "DISTINCT", "FROM", "WHERE", "AND", "OR", "NOT", "BY", "ON", "JOIN", "AS", "SET",
    "IN", "LIKE", "BETWEEN", "CASE", "WHEN", "THEN", "ELSE", "UNION", "ALL", "HAVING", "LIMIT",
    "OFFSET", "VALUES", "INTO", "WITH",
];

/// Phrases that mark step-by-step narration rather than SQL.
pub const NARRATION_MARKERS: &[&str] = &[
    "thought process",
    "first, i",
    "first i'll",
    "then i'll",
    "then i will",
    "after that",
    "next, i",
    "finally, i",
    "step 1:",
    "step-by-step",
    "i need to",
];

static CTE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bWITH\s+(?:RECURSIVE\s+)?[\w"`\[\]]+\s*(?:\([^)]*\)\s*)?AS\s*(?:NOT\s+)?(?:MATERIALIZED\s+)?\("#,
    )
    .expect("CTE regex")
});

static TERMINAL_SELECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\)\s*SELECT\b").expect("terminal select regex"));

static SELECT_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?i:select)\b|\bSELECT\b").expect("select regex")
});

static FOLLOWING_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?ix)^\s*(?:
            SELECT\b[^;\n]*?\b(?:FROM|JOIN)\b
          | WITH\s+(?:RECURSIVE\s+)?[\w"`\[\]]+\s*(?:\([^)]*\)\s*)?AS\s*\(
          | (?:INSERT(?:\s+OR\s+\w+)?|REPLACE)\s+INTO\b
          | UPDATE\s+\S+\s+SET\b
          | DELETE\s+FROM\b
          | (?:DROP|CREATE|ALTER)\s+(?:(?:TEMP|TEMPORARY|UNIQUE|VIRTUAL)\s+)?(?:TABLE|INDEX|VIEW|TRIGGER)\b
          | PRAGMA\s+\w+
          | ATTACH\s+(?:DATABASE\s+)?\S+\s+AS\b
          | EXPLAIN\s+(?:QUERY\s+PLAN\s+)?(?:SELECT|WITH|INSERT|UPDATE|DELETE|REPLACE)\b
        )"#,
    )
    .expect("following statement regex")
});

static SOURCE_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:FROM|JOIN)\b").expect("source clause regex"));

/// Returns true if the text contains a narration marker.
///
/// Matching is case-insensitive and tolerant of line breaks and typographic
/// apostrophes inside the phrase.
pub fn has_narration(text: &str) -> bool {
    let lowered = text
        .to_lowercase()
        .replace('\u{2019}', "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    NARRATION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Returns the uppercased leading token of a line.
///
/// A token is a run of word characters; a leading punctuation character is
/// returned on its own.
pub fn leading_token(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let word: String = trimmed
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    if word.is_empty() {
        trimmed.chars().next().map(|c| c.to_string())
    } else {
        Some(word.to_uppercase())
    }
}

/// Returns true if the line opens with a statement keyword.
pub fn starts_with_statement_keyword(line: &str) -> bool {
    leading_token(line).is_some_and(|token| STATEMENT_KEYWORDS.contains(&token.as_str()))
}

/// Returns true if the line opens with a continuation keyword.
pub fn starts_with_continuation(line: &str) -> bool {
    leading_token(line).is_some_and(|token| CONTINUATION_KEYWORDS.contains(&token.as_str()))
}

/// Returns true if the text names a row source (`FROM` or `JOIN`).
pub fn has_source_clause(text: &str) -> bool {
    SOURCE_CLAUSE.is_match(text)
}

/// Returns true if a line cannot end a statement as written.
///
/// That is the case when it ends with a separator, an open parenthesis, a
/// comparison or arithmetic operator, or a keyword that needs an operand.
pub fn is_open_ended(line: &str) -> bool {
    let trimmed = line.trim_end();
    if trimmed.ends_with([',', '(', '=', '<', '>', '+', '-', '/', '|']) {
        return true;
    }

    trimmed
        .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .is_some_and(|word| OPEN_ENDED_KEYWORDS.contains(&word.to_uppercase().as_str()))
}

/// Returns true if the text after a `;` opens another SQL statement.
///
/// A statement keyword alone is not enough: "Replace 100 with..." or
/// "With this query..." are prose.
pub fn opens_statement(text: &str) -> bool {
    starts_with_statement_keyword(text) && FOLLOWING_STATEMENT.is_match(text)
}

/// Returns true if the statement on `line` carries on to `next_line`.
fn continues_on(line: &str, next_line: &str, depth: usize) -> bool {
    if next_line.trim().is_empty() || has_narration(next_line) {
        return false;
    }

    // A `;` only reaches the end of a line when another statement follows.
    line.trim_end().ends_with(';')
        || depth > 0
        || is_open_ended(line)
        || starts_with_continuation(next_line)
}

/// Returns the leading slice of `text` that belongs to one statement run.
///
/// The run ends at a blank line, at a line that neither continues the
/// statement nor sits inside open parentheses, or at a `;` that is not
/// followed by another statement. Quoted text is skipped, so terminators and
/// line breaks inside literals do not end the run. A `;` followed by another
/// statement does not end it either: the validator must see both.
pub fn statement_extent(text: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut depth: usize = 0;
    let mut line_start = 0;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' => {
                if !opens_statement(&text[i + 1..]) {
                    return &text[..=i];
                }
            }
            '\n' => {
                let line = &text[line_start..i];
                let next_line = text[i + 1..].split('\n').next().unwrap_or("");
                if !continues_on(line, next_line, depth) {
                    return &text[..i];
                }
                line_start = i + 1;
            }
            _ => {}
        }
    }

    text
}

/// Finds a `WITH ... AS (...) SELECT ...` statement.
pub fn cte_statement(text: &str) -> Option<String> {
    let start = CTE_START.find(text)?.start();
    let extent = statement_extent(&text[start..]);
    TERMINAL_SELECT
        .is_match(extent)
        .then(|| extent.trim().to_string())
}

/// Finds a `SELECT` statement that reads from a source.
///
/// A lowercase `select` only counts at the start of a line, so prose such as
/// "we select the rows from..." is not mistaken for SQL.
pub fn select_statement(text: &str) -> Option<String> {
    SELECT_START.find_iter(text).find_map(|m| {
        let extent = statement_extent(&text[m.start()..]).trim();
        has_source_clause(extent).then(|| extent.to_string())
    })
}

/// Accumulates lines starting at the first statement keyword.
///
/// Accumulation stops at a blank line, a narration marker, or a line that
/// does not continue the statement. The joined run is then cut at its
/// terminator like any other statement.
pub fn line_statement<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();

    for line in lines {
        let line = line.as_ref().trim();

        if collected.is_empty() {
            if starts_with_statement_keyword(line) && !has_narration(line) {
                collected.push(line);
            }
            continue;
        }

        if line.is_empty() || has_narration(line) {
            break;
        }

        let open_ended = collected.last().is_some_and(|prev| is_open_ended(prev));
        if !open_ended && !starts_with_continuation(line) {
            break;
        }

        collected.push(line);
    }

    if collected.is_empty() {
        return None;
    }
    let joined = collected.join(" ");
    Some(statement_extent(&joined).trim().to_string())
}

/// Returns the first line that opens with a statement keyword.
///
/// Last-resort path for output where no section produced a plausible
/// candidate. The line is returned trimmed but otherwise untouched.
pub fn first_statement_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| starts_with_statement_keyword(line) && !has_narration(line))
        .map(str::to_string)
}

/// Structural plausibility check applied before a candidate is chosen.
pub fn is_plausible(candidate: &str) -> bool {
    starts_with_statement_keyword(candidate)
        && has_source_clause(candidate)
        && !has_narration(candidate)
}

/// Collapses whitespace outside quotes and strips one trailing terminator.
pub fn normalize(candidate: &str) -> String {
    let mut out = String::with_capacity(candidate.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    for c in candidate.trim().chars() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;

        if matches!(c, '\'' | '"' | '`') {
            quote = Some(c);
        }
        out.push(c);
    }

    match out.strip_suffix(';') {
        Some(stripped) => stripped.trim_end().to_string(),
        None => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narration_markers() {
        assert!(has_narration("First, I need to find the length of each name."));
        assert!(has_narration("Then I\u{2019}ll join the tables"));
        assert!(has_narration("After   that we\nsort"));
        assert!(has_narration("My thought process:"));
        assert!(!has_narration("SELECT name FROM product"));
    }

    #[test]
    fn test_leading_token() {
        assert_eq!(leading_token("  select * from t"), Some("SELECT".to_string()));
        assert_eq!(leading_token(", price"), Some(",".to_string()));
        assert_eq!(leading_token("   "), None);
    }

    #[test]
    fn test_statement_keyword_detection() {
        assert!(starts_with_statement_keyword("SELECT 1"));
        assert!(starts_with_statement_keyword("  with x as (select 1) select * from x"));
        assert!(starts_with_statement_keyword("DELETE FROM product"));
        assert!(!starts_with_statement_keyword("Selection of rows"));
        assert!(!starts_with_statement_keyword("Here is the query"));
    }

    #[test]
    fn test_extent_stops_at_blank_line() {
        let text = "SELECT name\nFROM product\n\nThis lists every product.";
        assert_eq!(statement_extent(text), "SELECT name\nFROM product");
    }

    #[test]
    fn test_extent_stops_at_terminator_before_prose() {
        let text = "SELECT name FROM product; This lists every product.";
        assert_eq!(statement_extent(text), "SELECT name FROM product;");
    }

    #[test]
    fn test_extent_keeps_following_statement() {
        let text = "SELECT * FROM employee; DROP TABLE employee;";
        assert_eq!(statement_extent(text), text);
    }

    #[test]
    fn test_extent_stops_at_prose_line() {
        let text = "SELECT name FROM product WHERE price > 100\nThis returns the expensive products.";
        assert_eq!(
            statement_extent(text),
            "SELECT name FROM product WHERE price > 100"
        );
        assert_eq!(
            statement_extent("SELECT name FROM product\nIt's that simple."),
            "SELECT name FROM product"
        );
    }

    #[test]
    fn test_extent_follows_open_lines() {
        let text = "SELECT\n  name,\n  price\nFROM product\nWHERE price >\n  100\nDone.";
        assert_eq!(
            statement_extent(text),
            "SELECT\n  name,\n  price\nFROM product\nWHERE price >\n  100"
        );

        let text = "SELECT name FROM product WHERE id IN (\n  SELECT id\n  FROM product\n)\nThat's all.";
        assert_eq!(
            statement_extent(text),
            "SELECT name FROM product WHERE id IN (\n  SELECT id\n  FROM product\n)"
        );
    }

    #[test]
    fn test_extent_stops_before_narration_line() {
        let text = "SELECT name\nFROM product\nThen I'll sort the names.";
        assert_eq!(statement_extent(text), "SELECT name\nFROM product");
    }

    #[test]
    fn test_extent_stops_at_terminator_before_keyword_prose() {
        let text = "SELECT name FROM product; Replace 100 with any threshold you like.";
        assert_eq!(statement_extent(text), "SELECT name FROM product;");

        let text = "SELECT name FROM product; With this query you get every name.";
        assert_eq!(statement_extent(text), "SELECT name FROM product;");

        let text = "SELECT name FROM product;\nSelect a different column if you prefer.";
        assert_eq!(statement_extent(text), "SELECT name FROM product;");
    }

    #[test]
    fn test_extent_keeps_statement_on_next_line() {
        let text = "SELECT * FROM employee;\nDROP TABLE employee;";
        assert_eq!(statement_extent(text), text);
    }

    #[test]
    fn test_opens_statement() {
        assert!(opens_statement(" DROP TABLE employee;"));
        assert!(opens_statement("\ndelete from product"));
        assert!(opens_statement(" INSERT OR REPLACE INTO product VALUES (1)"));
        assert!(opens_statement(" WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(opens_statement(" UPDATE product SET price = 0"));
        assert!(opens_statement(" SELECT name FROM employee"));
        assert!(!opens_statement(" Replace 100 with any threshold."));
        assert!(!opens_statement(" With this query you get every name."));
        assert!(!opens_statement(" Explain it to me."));
        assert!(!opens_statement(" Select whichever columns you need."));
        assert!(!opens_statement(""));
    }

    #[test]
    fn test_open_ended_lines() {
        assert!(is_open_ended("SELECT name,"));
        assert!(is_open_ended("WHERE id IN ("));
        assert!(is_open_ended("WHERE price >"));
        assert!(is_open_ended("ORDER BY"));
        assert!(is_open_ended("WHERE active = 1 and"));
        assert!(!is_open_ended("FROM product"));
        assert!(!is_open_ended("WHERE price > 100"));
        assert!(!is_open_ended("SELECT COUNT(*)"));
    }

    #[test]
    fn test_extent_ignores_terminator_in_literal() {
        let text = "SELECT name FROM product WHERE name = 'a; b'\n\nDone.";
        assert_eq!(
            statement_extent(text),
            "SELECT name FROM product WHERE name = 'a; b'"
        );
    }

    #[test]
    fn test_cte_statement() {
        let text = "Try this:\nWITH expensive AS (\n  SELECT * FROM product WHERE price > 100\n)\nSELECT name FROM expensive";
        assert_eq!(
            cte_statement(text),
            Some(
                "WITH expensive AS (\n  SELECT * FROM product WHERE price > 100\n)\nSELECT name FROM expensive"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_cte_without_terminal_select_is_ignored() {
        assert_eq!(cte_statement("WITH x AS (SELECT 1)"), None);
    }

    #[test]
    fn test_select_statement_requires_source() {
        assert_eq!(
            select_statement("Use SELECT name FROM product WHERE price > 100"),
            Some("SELECT name FROM product WHERE price > 100".to_string())
        );
        assert_eq!(select_statement("SELECT 1"), None);
    }

    #[test]
    fn test_lowercase_select_only_at_line_start() {
        assert_eq!(select_statement("we select the rows from the table"), None);
        assert_eq!(
            select_statement("select name from product"),
            Some("select name from product".to_string())
        );
    }

    #[test]
    fn test_line_statement_accumulates_continuations() {
        let lines = [
            "Here you go",
            "SELECT name, price",
            "FROM product",
            "WHERE price > 100",
            "ORDER BY price DESC",
            "This returns the expensive ones",
        ];
        assert_eq!(
            line_statement(&lines),
            Some("SELECT name, price FROM product WHERE price > 100 ORDER BY price DESC".to_string())
        );
    }

    #[test]
    fn test_line_statement_follows_open_ended_lines() {
        let lines = ["SELECT first_name,", "last_name", "FROM employee"];
        assert_eq!(
            line_statement(&lines),
            Some("SELECT first_name, last_name FROM employee".to_string())
        );
    }

    #[test]
    fn test_line_statement_stops_at_blank_and_narration() {
        let lines = ["DELETE FROM product", "", "WHERE stock_quantity = 0"];
        assert_eq!(line_statement(&lines), Some("DELETE FROM product".to_string()));

        let lines = ["SELECT name", "FROM product", "after that, I sort"];
        assert_eq!(line_statement(&lines), Some("SELECT name FROM product".to_string()));
    }

    #[test]
    fn test_line_statement_cut_at_terminator() {
        let lines = ["SELECT name FROM product; Replace 100 with any threshold you like."];
        assert_eq!(
            line_statement(&lines),
            Some("SELECT name FROM product;".to_string())
        );
    }

    #[test]
    fn test_first_statement_line() {
        let text = "Thinking...\nDROP TABLE employee\nSELECT 1";
        assert_eq!(
            first_statement_line(text),
            Some("DROP TABLE employee".to_string())
        );
        assert_eq!(first_statement_line("no sql here"), None);
    }

    #[test]
    fn test_plausibility() {
        assert!(is_plausible("SELECT name FROM product"));
        assert!(is_plausible("DELETE FROM product"));
        assert!(!is_plausible("SELECT 1"));
        assert!(!is_plausible("The product FROM the list"));
        assert!(!is_plausible("SELECT x FROM t -- then I'll sort"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("  SELECT name\n   FROM product\tWHERE price > 100;  "),
            "SELECT name FROM product WHERE price > 100"
        );
        assert_eq!(
            normalize("SELECT * FROM t WHERE city = 'New  York';"),
            "SELECT * FROM t WHERE city = 'New  York'"
        );
        assert_eq!(normalize("SELECT 1;;"), "SELECT 1;");
    }
}
