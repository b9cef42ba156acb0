//! Structural prefix inference.
//!
//! A line is *interesting* when content remains after its structural
//! lead-in (comment tokens, padding, indentation) is removed. The prefix
//! of a fragment is the longest string shared by every interesting
//! line's lead-in; folding is order-independent.

use std::ops::Range;

use regex::Regex;

use crate::document::lines;
use crate::syntax::LanguageSyntax;

/// Longest string that is a literal prefix of both `a` and `b`.
pub(crate) fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut end = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        end += ca.len_utf8();
    }
    &a[..end]
}

/// Fold one candidate into the running prefix.
pub(crate) fn fold_prefix(acc: Option<String>, candidate: &str) -> Option<String> {
    Some(match acc {
        None => candidate.to_string(),
        Some(prefix) => common_prefix(&prefix, candidate).to_string(),
    })
}

/// One comment line split into its structural lead-in and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommentLine<'a> {
    /// Text removed from the line start: whitespace, comment token,
    /// repeated token characters, and the skip pattern.
    pub lead: &'a str,
    /// What remains (a trailing comment-end token already removed).
    pub content: &'a str,
}

impl CommentLine<'_> {
    pub fn is_interesting(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Split a comment line by stripping, in order: the trailing comment-end
/// token, leading whitespace, the comment-start token, repeated token
/// characters, and the skip pattern.
pub(crate) fn dissect_comment_line<'a>(
    line: &'a str,
    syntax: &LanguageSyntax,
    skip: &Regex,
) -> CommentLine<'a> {
    let mut body = line;
    if let Some((_, close)) = &syntax.block_comment {
        let trimmed = body.trim_end();
        if trimmed.ends_with(close.as_str()) {
            body = &trimmed[..trimmed.len() - close.len()];
        }
    }
    let mut rest = body.trim_start_matches([' ', '\t']);
    let mut token: Option<&str> = None;
    if let Some((open, _)) = &syntax.block_comment {
        if let Some(after) = rest.strip_prefix(open.as_str()) {
            rest = after;
            token = Some(open);
        }
    }
    if token.is_none() {
        if let Some(line_token) = &syntax.line_comment {
            if let Some(after) = rest.strip_prefix(line_token.as_str()) {
                rest = after;
                token = Some(line_token);
            }
        }
    }
    // Extra runs of the token's trailing character count as comment
    // syntax, e.g. the third slash of `///`.
    if let Some(tok) = token {
        if let Some(last) = tok.chars().last() {
            rest = rest.trim_start_matches(last);
        }
    }
    if let Some(m) = skip.find(rest) {
        rest = &rest[m.end()..];
    }
    let lead = &line[..body.len() - rest.len()];
    CommentLine {
        lead,
        content: rest,
    }
}

/// Common prefix over the interesting lines of a comment block, or
/// `None` when no line is interesting.
pub(crate) fn comment_prefix(
    source: &str,
    block: &Range<usize>,
    syntax: &LanguageSyntax,
    skip: &Regex,
) -> Option<String> {
    let mut acc = None;
    for seg in lines::line_spans(source, block.clone()) {
        let split = dissect_comment_line(&source[seg], syntax, skip);
        if split.is_interesting() {
            acc = fold_prefix(acc, split.lead);
        }
    }
    acc
}

/// Template prefix for an empty comment block: the second line's
/// structural lead-in, or the first line's when the block has only one.
pub(crate) fn comment_template(
    source: &str,
    block: &Range<usize>,
    syntax: &LanguageSyntax,
    skip: &Regex,
) -> String {
    let segs: Vec<Range<usize>> = lines::line_spans(source, block.clone()).collect();
    let template = segs.get(1).or_else(|| segs.first());
    match template {
        Some(seg) => dissect_comment_line(&source[seg.clone()], syntax, skip)
            .lead
            .to_string(),
        None => String::new(),
    }
}

/// Editable span and prefix of a multi-line string interior.
///
/// The whitespace run following the opening delimiter stays outside the
/// span; it is the first line's prefix candidate when that line has
/// content. Interior lines with content fold their indentation, and the
/// lead-in of the closing delimiter's line folds unconditionally so the
/// delimiters stay aligned. When only whitespace precedes the opening
/// delimiter, the line indentation folds as well.
pub(crate) fn string_prefix(
    source: &str,
    interior: &Range<usize>,
    literal_start: usize,
) -> (Range<usize>, String) {
    let lead = lines::leading_whitespace(&source[interior.clone()]);
    let span = (interior.start + lead.len())..interior.end;
    let text = &source[span.clone()];
    let mut acc = None;

    let indent_start = lines::line_start(source, literal_start);
    let indent = &source[indent_start..literal_start];
    if indent.chars().all(char::is_whitespace) {
        acc = fold_prefix(acc, indent);
    }

    let first_end = text.find('\n').unwrap_or(text.len());
    if !text[..first_end].trim().is_empty() {
        acc = fold_prefix(acc, lead);
    }

    let last_start = text.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let middle = &text[(first_end + 1).min(last_start)..last_start];
    for line in middle.split('\n') {
        if !line.trim().is_empty() {
            acc = fold_prefix(acc, lines::leading_whitespace(line));
        }
    }
    acc = fold_prefix(acc, lines::leading_whitespace(&text[last_start..]));

    (span, acc.unwrap_or_default())
}

/// Common prefix over a region's lines: the entire content of each line
/// with non-whitespace participates, not just its indentation.
pub(crate) fn region_prefix(source: &str, span: &Range<usize>) -> String {
    let mut acc = None;
    for seg in lines::line_spans(source, span.clone()) {
        let line = &source[seg];
        if !line.trim().is_empty() {
            acc = fold_prefix(acc, line);
        }
    }
    acc.unwrap_or_default()
}
