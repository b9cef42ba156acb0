//! The classifier seam: string/comment membership and boundaries.
//!
//! The core is generic over any [`Classifier`]; hosts with a real
//! tokenizer or syntax tree supply their own, and [`DelimiterClassifier`]
//! covers the common delimiter-based languages out of the box.

mod scanner;

use std::ops::Range;

pub use scanner::DelimiterClassifier;

/// What kind of construct a classified offset lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructKind {
    Comment,
    Str,
}

/// A classified construct: a comment or string literal, delimiters
/// included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construct {
    pub kind: ConstructKind,
    /// Full byte range, including delimiters.
    pub range: Range<usize>,
    /// Byte length of the opening delimiter.
    pub open_len: usize,
    /// Byte length of the closing delimiter; 0 when the construct runs
    /// to end of input unterminated, or needs none (line comments).
    pub close_len: usize,
}

impl Construct {
    /// The text between the delimiters.
    pub fn interior(&self) -> Range<usize> {
        (self.range.start + self.open_len)..(self.range.end - self.close_len)
    }
}

/// Delimiter tokens of the embedded language, as far as the core needs
/// to understand them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSyntax {
    /// Token opening a comment that runs to end of line, e.g. `//`.
    pub line_comment: Option<String>,
    /// Open/close tokens of a paired comment, e.g. `/*` and `*/`.
    pub block_comment: Option<(String, String)>,
    /// String delimiters; multi-character delimiters are matched
    /// longest-first.
    pub string_delimiters: Vec<String>,
    /// Escape character honored inside string literals.
    pub escape: Option<char>,
}

impl LanguageSyntax {
    pub fn c() -> Self {
        Self {
            line_comment: Some("//".to_string()),
            block_comment: Some(("/*".to_string(), "*/".to_string())),
            string_delimiters: vec!["\"".to_string()],
            escape: Some('\\'),
        }
    }

    pub fn rust() -> Self {
        // Char literals are left unclassified: a lone `'` is far more
        // often a lifetime than a string-like target.
        Self::c()
    }

    pub fn python() -> Self {
        Self {
            line_comment: Some("#".to_string()),
            block_comment: None,
            string_delimiters: vec![
                "\"\"\"".to_string(),
                "'''".to_string(),
                "\"".to_string(),
                "'".to_string(),
            ],
            escape: Some('\\'),
        }
    }

    pub fn shell() -> Self {
        Self {
            line_comment: Some("#".to_string()),
            block_comment: None,
            string_delimiters: vec!["\"".to_string(), "'".to_string()],
            escape: Some('\\'),
        }
    }
}

/// Host-supplied oracle for string/comment membership and boundaries.
pub trait Classifier {
    /// All comment and string constructs in `source`, ordered by start,
    /// non-overlapping.
    fn constructs(&self, source: &str) -> Vec<Construct>;

    /// Delimiter tokens of the language being classified.
    fn syntax(&self) -> &LanguageSyntax;

    /// The construct containing `offset`, if any.
    fn classify(&self, source: &str, offset: usize) -> Option<Construct> {
        self.constructs(source)
            .into_iter()
            .find(|c| c.range.contains(&offset))
    }
}
