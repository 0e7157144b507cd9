//! Lexical statement classification.
//!
//! Classification is pattern based, not grammar based. It strips comments,
//! collapses whitespace and uppercases a working copy of the query, then runs
//! independent scans over that copy:
//!
//! - the leading command token
//! - statement separators
//! - administrative or destructive keywords anywhere in the text
//! - constructs the MySQL 5.x server line does not understand
//!
//! The keyword scan sees literals too. A disallowed word inside a
//! string literal or a quoted identifier (`` `drop` ``) is still reported, so
//! some harmless queries are refused. The text that actually executes is the
//! caller's original, never the working copy.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Commands that always write or administer; their presence anywhere denies a query.
pub const DISALLOWED_KEYWORDS: &[&str] = &[
    "DROP", "CREATE", "ALTER", "TRUNCATE", "RENAME", "REPLACE", "GRANT", "REVOKE", "LOCK",
    "UNLOCK", "CALL", "EXEC", "EXECUTE", "START", "BEGIN", "COMMIT", "ROLLBACK",
    // server-side file access
    "OUTFILE", "DUMPFILE", "LOAD", "LOAD_FILE",
];

// Patterns below are constants covered by tests; compilation cannot fail at runtime.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|e| panic!("Internal error: invalid regex pattern '{}': {}", pattern, e))
}

static DISALLOWED_PATTERN: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"\b({})\b", DISALLOWED_KEYWORDS.join("|"))));

static COMPATIBILITY_PATTERNS: Lazy<Vec<(Regex, Feature)>> = Lazy::new(|| {
    vec![
        (compile(r"\bJSON_[A-Z_]+\s*\("), Feature::Json),
        (compile(r"->>?"), Feature::Json),
        (compile(r"\bOVER\s*\("), Feature::WindowFunctions),
        (compile(r"\bROW_NUMBER\s*\("), Feature::WindowFunctions),
        (compile(r"\bDENSE_RANK\s*\("), Feature::WindowFunctions),
        (compile(r"\bRANK\s*\("), Feature::WindowFunctions),
        (compile(r"\bPARTITION\s+BY\b"), Feature::WindowFunctions),
        (compile(r"\bIN\s+BOOLEAN\s+MODE\b"), Feature::ExtendedFullText),
        (compile(r"\bWITH\s+QUERY\s+EXPANSION\b"), Feature::ExtendedFullText),
    ]
});

/// The leading command of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadingCommand {
    Select,
    Show,
    /// `DESCRIBE` or its `DESC` abbreviation
    Describe,
    Explain,
    Insert,
    Update,
    Delete,
    /// Any other token, kept verbatim (uppercased) for error messages.
    Other(String),
    /// Nothing left after removing comments, whitespace and separators.
    Empty,
}

impl LeadingCommand {
    fn from_token(token: &str) -> Self {
        match token {
            "" => Self::Empty,
            "SELECT" => Self::Select,
            "SHOW" => Self::Show,
            "DESCRIBE" | "DESC" => Self::Describe,
            "EXPLAIN" => Self::Explain,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }

    /// Member of the always-allowed read set.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Self::Select | Self::Show | Self::Describe | Self::Explain
        )
    }

    /// Member of the conditionally-writable set.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Select => "SELECT",
            Self::Show => "SHOW",
            Self::Describe => "DESCRIBE",
            Self::Explain => "EXPLAIN",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Other(token) => token,
            Self::Empty => "",
        }
    }
}

impl fmt::Display for LeadingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A family of server features missing from MySQL 5.x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// JSON functions and the `->` / `->>` path operators (5.7+)
    Json,
    /// Window functions (8.0+)
    WindowFunctions,
    /// Boolean-mode and query-expansion full-text search
    ExtendedFullText,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "JSON functions",
            Self::WindowFunctions => "window functions",
            Self::ExtendedFullText => "extended full-text search",
        }
    }
}

/// A non-fatal note that the query uses an unsupported construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityWarning {
    pub feature: Feature,
    /// The construct as matched, whitespace removed (e.g. `ROW_NUMBER(`).
    pub construct: String,
}

impl fmt::Display for CompatibilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) may not be supported by the target MySQL server",
            self.feature.as_str(),
            self.construct
        )
    }
}

/// Classification of one query text. Independent of any configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub command: LeadingCommand,
    pub multiple_statements: bool,
    /// Disallowed keywords found anywhere in the text, in order of first appearance.
    pub disallowed_keywords: Vec<String>,
    pub compatibility_warnings: Vec<CompatibilityWarning>,
}

/// Classify a query. Deterministic and side-effect free.
pub fn classify(sql: &str) -> Verdict {
    let normalized = normalize(sql);

    Verdict {
        command: leading_command(&normalized),
        multiple_statements: has_multiple_statements(&normalized),
        disallowed_keywords: disallowed_keywords(&normalized),
        compatibility_warnings: compatibility_warnings(&normalized),
    }
}

/// Strip comments, collapse whitespace and uppercase.
pub fn normalize(sql: &str) -> String {
    strip_comments(sql)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Remove `-- `, `#` and `/* */` comments.
///
/// Quoted text is copied verbatim so a comment marker inside a literal cannot
/// hide the rest of the query. MySQL executes the body of `/*! ... */` and
/// `/*!50001 ... */` comments, and MariaDB also runs `/*M! ... */` and
/// `/*M!100000 ... */`, so their body is kept and only the markers go.
pub fn strip_comments(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut executable_depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\'' | '"' | '`' => i = copy_quoted(&chars, i, &mut out),
            '-' if next == Some('-')
                && chars.get(i + 2).is_none_or(|after| after.is_whitespace()) =>
            {
                i = skip_line(&chars, i);
                out.push(' ');
            }
            '#' => {
                i = skip_line(&chars, i);
                out.push(' ');
            }
            '/' if next == Some('*') && executable_marker_len(&chars, i + 2) > 0 => {
                i += 2 + executable_marker_len(&chars, i + 2);
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                executable_depth += 1;
                out.push(' ');
            }
            '/' if next == Some('*') => {
                i = skip_block(&chars, i + 2);
                out.push(' ');
            }
            '*' if next == Some('/') && executable_depth > 0 => {
                executable_depth -= 1;
                i += 2;
                out.push(' ');
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Length of a `!` or `M!` executable-comment marker at `at`, 0 if none.
fn executable_marker_len(chars: &[char], at: usize) -> usize {
    match (chars.get(at), chars.get(at + 1)) {
        (Some('!'), _) => 1,
        (Some('M' | 'm'), Some('!')) => 2,
        _ => 0,
    }
}

/// Copy a quoted run starting at `start`, returning the index after it.
fn copy_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && quote != '`' {
            out.push(c);
            if let Some(&escaped) = chars.get(i + 1) {
                out.push(escaped);
            }
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
        if c == quote {
            if chars.get(i) == Some(&quote) {
                out.push(quote);
                i += 1;
            } else {
                return i;
            }
        }
    }
    i
}

fn skip_line(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i] != '\n' {
        i += 1;
    }
    i
}

fn skip_block(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

fn leading_command(normalized: &str) -> LeadingCommand {
    // A parenthesised query expression like `(SELECT 1) UNION (SELECT 2)`
    // still leads with its first keyword.
    let body = normalized.trim_start_matches(|c: char| c == '(' || c.is_whitespace());
    let token: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if token.is_empty() && !body.trim_matches(|c: char| c == ';' || c.is_whitespace()).is_empty()
    {
        // Punctuation or non-ASCII in leading position.
        let raw: String = body.chars().take_while(|c| !c.is_whitespace()).collect();
        return LeadingCommand::Other(raw);
    }
    LeadingCommand::from_token(&token)
}

/// More than one statement unless the only separator is the final character.
///
/// Every `;` counts, including one inside a string literal. Refusing
/// `SELECT ';'` is preferable to trusting a tokenizer that may disagree with
/// the server's escape rules.
fn has_multiple_statements(normalized: &str) -> bool {
    let trimmed = normalized.trim_end();
    match trimmed.matches(';').count() {
        0 => false,
        1 => !trimmed.ends_with(';'),
        _ => true,
    }
}

fn disallowed_keywords(normalized: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in DISALLOWED_PATTERN.find_iter(normalized) {
        if !found.iter().any(|k| k == m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    found
}

fn compatibility_warnings(normalized: &str) -> Vec<CompatibilityWarning> {
    let mut warnings: Vec<CompatibilityWarning> = Vec::new();
    for (pattern, feature) in COMPATIBILITY_PATTERNS.iter() {
        for m in pattern.find_iter(normalized) {
            let construct: String = m.as_str().split_whitespace().collect::<Vec<_>>().join(
                if m.as_str().ends_with('(') { "" } else { " " },
            );
            if !warnings.iter().any(|w| w.construct == construct) {
                warnings.push(CompatibilityWarning {
                    feature: *feature,
                    construct,
                });
            }
        }
    }
    warnings
}
