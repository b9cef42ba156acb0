//! Generic delimiter-based construct scanner.
//!
//! A single forward pass over the source bytes, consuming comments and
//! strings as they open so that delimiters inside one construct never
//! start another (a quote inside a comment, `//` inside a string).

use super::{Classifier, Construct, ConstructKind, LanguageSyntax};

/// [`Classifier`] implementation driven by a [`LanguageSyntax`]
/// description.
#[derive(Debug, Clone)]
pub struct DelimiterClassifier {
    syntax: LanguageSyntax,
    /// String delimiters sorted longest-first so `"""` wins over `"`.
    delimiters: Vec<String>,
    /// Escape byte, when the escape character is ASCII.
    escape: Option<u8>,
}

impl DelimiterClassifier {
    pub fn new(syntax: LanguageSyntax) -> Self {
        let mut delimiters = syntax.string_delimiters.clone();
        delimiters.sort_by(|a, b| b.len().cmp(&a.len()));
        let escape = syntax.escape.filter(char::is_ascii).map(|c| c as u8);
        Self {
            syntax,
            delimiters,
            escape,
        }
    }

    fn construct_at(&self, source: &str, pos: usize) -> Option<Construct> {
        let bytes = source.as_bytes();
        if let Some(tok) = &self.syntax.line_comment {
            if starts_at(bytes, pos, tok) {
                let mut end = pos + tok.len();
                while end < bytes.len() && bytes[end] != b'\n' {
                    end += 1;
                }
                return Some(Construct {
                    kind: ConstructKind::Comment,
                    range: pos..end,
                    open_len: tok.len(),
                    close_len: 0,
                });
            }
        }
        if let Some((open, close)) = &self.syntax.block_comment {
            if starts_at(bytes, pos, open) {
                let mut p = pos + open.len();
                let mut close_len = 0;
                while p < bytes.len() {
                    if starts_at(bytes, p, close) {
                        p += close.len();
                        close_len = close.len();
                        break;
                    }
                    p += 1;
                }
                return Some(Construct {
                    kind: ConstructKind::Comment,
                    range: pos..p,
                    open_len: open.len(),
                    close_len,
                });
            }
        }
        for delim in &self.delimiters {
            if starts_at(bytes, pos, delim) {
                let mut p = pos + delim.len();
                let mut close_len = 0;
                while p < bytes.len() {
                    if self.escape == Some(bytes[p]) && p + 1 < bytes.len() {
                        p += 2;
                        continue;
                    }
                    if starts_at(bytes, p, delim) {
                        p += delim.len();
                        close_len = delim.len();
                        break;
                    }
                    p += 1;
                }
                return Some(Construct {
                    kind: ConstructKind::Str,
                    range: pos..p,
                    open_len: delim.len(),
                    close_len,
                });
            }
        }
        None
    }
}

fn starts_at(bytes: &[u8], pos: usize, token: &str) -> bool {
    bytes[pos..].starts_with(token.as_bytes())
}

impl Classifier for DelimiterClassifier {
    fn constructs(&self, source: &str) -> Vec<Construct> {
        let mut out = Vec::new();
        let mut pos = 0;
        while pos < source.len() {
            match self.construct_at(source, pos) {
                Some(construct) => {
                    pos = construct.range.end.max(pos + 1);
                    out.push(construct);
                }
                None => pos += 1,
            }
        }
        out
    }

    fn syntax(&self) -> &LanguageSyntax {
        &self.syntax
    }
}
