//! Fragment location: find the comment or string around a cursor
//! position and turn it into a concrete editable span.

use std::ops::Range;

use tracing::trace;

use crate::document::lines;
use crate::document::Anchor;
use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::syntax::{Classifier, Construct, ConstructKind, LanguageSyntax};

/// What kind of fragment a span was located as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Comment,
    Str,
    Region,
}

/// A located fragment, before extraction.
///
/// `span` is the editable range; `block` is the surrounding construct
/// the prefix is inferred from (the whole comment block including
/// delimiter-only lines, or the full string literal including its
/// delimiters). For regions the two coincide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub kind: FragmentKind,
    pub span: Range<usize>,
    pub block: Range<usize>,
}

/// A live fragment tracked through stable positions, so its span stays
/// valid across unrelated edits elsewhere in the document.
#[derive(Debug)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub start: Anchor,
    pub end: Anchor,
    /// Read-only overlay state for the interactive layer; the core
    /// transform does not enforce it.
    pub locked: bool,
}

/// An explicit selection; bounds are taken exactly as supplied.
pub fn from_region(start: usize, end: usize) -> Located {
    Located {
        kind: FragmentKind::Region,
        span: start..end,
        block: start..end,
    }
}

/// A string literal with known bounds: `construct` covers the full
/// literal, delimiters included.
pub fn string_interior(construct: Range<usize>, open_len: usize, close_len: usize) -> Located {
    Located {
        kind: FragmentKind::Str,
        span: (construct.start + open_len)..(construct.end - close_len),
        block: construct,
    }
}

/// Find the nearest comment or string around `offset`.
pub fn locate<C: Classifier>(
    source: &str,
    classifier: &C,
    offset: usize,
    settings: &Settings,
) -> Result<Located> {
    let constructs = classifier.constructs(source);
    let found = probe(source, &constructs, offset, settings.probe_limit)
        .ok_or(Error::NotFound { offset })?;
    trace!(kind = ?found.kind, range = ?found.range, "located construct");
    match found.kind {
        ConstructKind::Str => refine_string(source, found, offset),
        ConstructKind::Comment => {
            refine_comment(source, &constructs, found, classifier.syntax(), offset)
        }
    }
}

/// Classify `offset` directly, then skip whitespace and probe a bounded
/// number of adjacent offsets forward, then backward.
fn probe<'a>(
    source: &str,
    constructs: &'a [Construct],
    offset: usize,
    limit: usize,
) -> Option<&'a Construct> {
    let at = |o: usize| constructs.iter().find(|c| c.range.contains(&o));
    if let Some(found) = at(offset) {
        return Some(found);
    }
    let bytes = source.as_bytes();
    let mut fwd = offset;
    while fwd < bytes.len() && bytes[fwd].is_ascii_whitespace() {
        fwd += 1;
    }
    for step in 0..=limit {
        let pos = fwd + step;
        if pos >= source.len() {
            break;
        }
        if let Some(found) = at(pos) {
            return Some(found);
        }
    }
    for step in 1..=limit {
        let pos = offset.checked_sub(step)?;
        if let Some(found) = at(pos) {
            return Some(found);
        }
    }
    None
}

fn refine_string(source: &str, found: &Construct, offset: usize) -> Result<Located> {
    // An unterminated literal has no closing delimiter to reconstruct.
    if found.close_len == 0 {
        return Err(Error::NotFound { offset });
    }
    // A probe-found string preceded by other text on its line is not a
    // valid target; a cursor already inside the literal is unambiguous.
    if !found.range.contains(&offset) {
        let start_of_line = lines::line_start(source, found.range.start);
        if source[start_of_line..found.range.start]
            .chars()
            .any(|c| !c.is_whitespace())
        {
            return Err(Error::NotFound { offset });
        }
    }
    Ok(string_interior(
        found.range.clone(),
        found.open_len,
        found.close_len,
    ))
}

fn refine_comment(
    source: &str,
    constructs: &[Construct],
    found: &Construct,
    syntax: &LanguageSyntax,
    offset: usize,
) -> Result<Located> {
    let comments: Vec<&Construct> = constructs
        .iter()
        .filter(|c| c.kind == ConstructKind::Comment)
        .collect();
    let ix = comments
        .iter()
        .position(|c| c.range == found.range)
        .unwrap_or(0);

    // Merge adjacent comments into one block, crossing blank lines.
    let all_blank = |range: Range<usize>| source[range].chars().all(char::is_whitespace);
    let mut first = ix;
    while first > 0 && all_blank(comments[first - 1].range.end..comments[first].range.start) {
        first -= 1;
    }
    let mut last = ix;
    while last + 1 < comments.len()
        && all_blank(comments[last].range.end..comments[last + 1].range.start)
    {
        last += 1;
    }

    // The comment must sit on otherwise-blank lines at its end.
    let tail_end = lines::line_end(source, comments[last].range.end);
    if !all_blank(comments[last].range.end..tail_end) {
        return Err(Error::NotFound { offset });
    }

    // A first line with code before the comment token is excluded.
    let mut start = lines::line_start(source, comments[first].range.start);
    if !all_blank(start..comments[first].range.start) {
        start = lines::next_line_start(source, comments[first].range.start);
    }
    let mut end = lines::next_line_start(source, comments[last].range.end);

    // Trim blank boundary lines.
    while start < end {
        let line = lines::line_bounds(source, start);
        if lines::is_blank(&source[line]) {
            start = lines::next_line_start(source, start);
        } else {
            break;
        }
    }
    while end > start {
        let line = lines::line_bounds(source, end - 1);
        if lines::is_blank(&source[line.clone()]) {
            end = line.start;
        } else {
            break;
        }
    }
    if start >= end {
        return Err(Error::NotFound { offset });
    }

    let block = start..end;
    let span = comment_span(source, &block, syntax);
    Ok(Located {
        kind: FragmentKind::Comment,
        span,
        block,
    })
}

/// The editable lines of a comment block: delimiter-only boundary lines
/// of a paired comment stay outside the span so editing cannot touch
/// them.
fn comment_span(source: &str, block: &Range<usize>, syntax: &LanguageSyntax) -> Range<usize> {
    let Some((open, close)) = &syntax.block_comment else {
        return block.clone();
    };
    let only_padding = |s: &str| s.chars().all(|c| c == '*' || c.is_whitespace());

    let mut span = block.clone();
    let first = lines::line_bounds(source, span.start);
    let last = lines::line_bounds(source, span.end - 1);

    if first.start == last.start {
        // Single line. An empty `open .. close` pair keeps the closer out
        // of the span so composed text cannot overwrite it.
        let line = &source[first.clone()];
        let trimmed = line.trim();
        let empty_pair = trimmed
            .strip_prefix(open.as_str())
            .and_then(|rest| rest.strip_suffix(close.as_str()))
            .is_some_and(only_padding);
        if empty_pair {
            if let Some(close_at) = line.rfind(close.as_str()) {
                span.end = first.start + close_at;
            }
        }
        return span;
    }

    let first_text = source[first.clone()].trim();
    if first_text
        .strip_prefix(open.as_str())
        .is_some_and(only_padding)
    {
        span.start = lines::next_line_start(source, first.start);
    }
    let last_text = source[last.clone()].trim();
    if last_text
        .strip_suffix(close.as_str())
        .is_some_and(only_padding)
    {
        span.end = last.start;
    }
    span
}
