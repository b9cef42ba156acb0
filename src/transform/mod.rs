//! The bidirectional text transform: prefix extraction and
//! normalization on the way out, reconstruction on the way back.

mod prefix;
mod restore;
mod strip;

use std::ops::Range;

use crate::document::HostDocument;
use crate::error::{Error, Result};
use crate::fragment::{FragmentKind, Located};
use crate::settings::{BlankLinePolicy, Settings};
use crate::syntax::LanguageSyntax;

pub(crate) use restore::render;

/// Output of running the extractor over a located fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub kind: FragmentKind,
    /// Final editable span in the host document.
    pub span: Range<usize>,
    /// Structural prefix removed from (and later restored to) each line.
    pub prefix: String,
    /// Normalized text handed to the editing surface.
    pub text: String,
    /// Offset into `text` corresponding to `host_cursor`.
    pub cursor: usize,
}

/// Extract a located fragment into normalized text.
pub fn extract(
    source: &str,
    located: &Located,
    syntax: &LanguageSyntax,
    settings: &Settings,
    host_cursor: usize,
) -> Result<Extraction> {
    match located.kind {
        FragmentKind::Comment => extract_comment(source, located, syntax, settings, host_cursor),
        FragmentKind::Str => extract_string(source, located, settings, host_cursor),
        FragmentKind::Region => extract_region(source, located, settings, host_cursor),
    }
}

/// Write edited normalized text back over `span`, returning the new
/// span and the host offset corresponding to `cursor`.
pub fn restore<D: HostDocument>(
    doc: &mut D,
    span: Range<usize>,
    normalized: &str,
    prefix: &str,
    kind: FragmentKind,
    policy: BlankLinePolicy,
    cursor: usize,
) -> (Range<usize>, usize) {
    let rendered = restore::render(normalized, prefix, kind, policy, cursor);
    restore::apply(doc, span, &rendered)
}

fn extract_comment(
    source: &str,
    located: &Located,
    syntax: &LanguageSyntax,
    settings: &Settings,
    host_cursor: usize,
) -> Result<Extraction> {
    let skip = settings.skip_pattern();
    match prefix::comment_prefix(source, &located.block, syntax, &skip) {
        Some(prefix) => {
            let stripped = strip::strip(
                source,
                &located.span,
                &prefix,
                FragmentKind::Comment,
                settings.blank_line_policy,
                host_cursor,
            );
            Ok(Extraction {
                kind: FragmentKind::Comment,
                span: located.span.clone(),
                prefix,
                text: stripped.text,
                cursor: stripped.cursor,
            })
        }
        None => {
            // No line has content; offer a template to compose into.
            let prefix = prefix::comment_template(source, &located.block, syntax, &skip);
            Ok(Extraction {
                kind: FragmentKind::Comment,
                span: located.span.clone(),
                prefix,
                text: "\n".to_string(),
                cursor: 0,
            })
        }
    }
}

fn extract_string(
    source: &str,
    located: &Located,
    settings: &Settings,
    host_cursor: usize,
) -> Result<Extraction> {
    let interior = located.span.clone();
    if interior.is_empty() {
        return Err(Error::EmptyStringRefused {
            offset: located.block.start,
        });
    }
    let interior_text = &source[interior.clone()];
    if !interior_text.contains('\n') {
        // Single line: the literal interior, untouched.
        let cursor = host_cursor.clamp(interior.start, interior.end) - interior.start;
        return Ok(Extraction {
            kind: FragmentKind::Str,
            span: interior.clone(),
            prefix: String::new(),
            text: interior_text.to_string(),
            cursor,
        });
    }
    let (span, prefix) = prefix::string_prefix(source, &interior, located.block.start);
    let stripped = strip::strip(
        source,
        &span,
        &prefix,
        FragmentKind::Str,
        settings.blank_line_policy,
        host_cursor,
    );
    Ok(Extraction {
        kind: FragmentKind::Str,
        span,
        prefix,
        text: stripped.text,
        cursor: stripped.cursor,
    })
}

fn extract_region(
    source: &str,
    located: &Located,
    settings: &Settings,
    host_cursor: usize,
) -> Result<Extraction> {
    let prefix = prefix::region_prefix(source, &located.span);
    let stripped = strip::strip(
        source,
        &located.span,
        &prefix,
        FragmentKind::Region,
        settings.blank_line_policy,
        host_cursor,
    );
    Ok(Extraction {
        kind: FragmentKind::Region,
        span: located.span.clone(),
        prefix,
        text: stripped.text,
        cursor: stripped.cursor,
    })
}
