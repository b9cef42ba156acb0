//! Restoration: replay normalized lines with the prefix re-attached and
//! translate a normalized cursor back into the host document.

use std::ops::Range;

use crate::document::{lines, HostDocument};
use crate::fragment::FragmentKind;
use crate::settings::BlankLinePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rendered {
    pub text: String,
    /// Offset into `text` corresponding to the normalized cursor.
    pub cursor: usize,
}

/// Re-attach decoration to normalized text.
///
/// Comments prefix every line and are always newline-terminated. A
/// string's first line continues inline after the opening delimiter and
/// gets no prefix; when the text ends with a newline the prefix is
/// re-emitted so the closing delimiter lines up under the opening one.
/// Regions prefix every line with no special cases.
pub(crate) fn render(
    normalized: &str,
    prefix: &str,
    kind: FragmentKind,
    policy: BlankLinePolicy,
    cursor: usize,
) -> Rendered {
    let segs: Vec<Range<usize>> = lines::line_spans(normalized, 0..normalized.len()).collect();
    let newline_terminated = normalized.ends_with('\n');
    let mut out = String::new();
    let mut mapped = None;

    for (i, seg) in segs.iter().enumerate() {
        let line = &normalized[seg.clone()];
        let line_prefix = if kind == FragmentKind::Str && i == 0 {
            ""
        } else {
            prefix
        };
        let emitted: String = if line.trim().is_empty() {
            match policy {
                BlankLinePolicy::None => format!("{line_prefix}{line}"),
                BlankLinePolicy::Trim => {
                    let full = format!("{line_prefix}{line}");
                    full.trim_end().to_string()
                }
                BlankLinePolicy::Drop => String::new(),
            }
        } else {
            format!("{line_prefix}{line}")
        };
        if mapped.is_none() && cursor >= seg.start && cursor <= seg.end {
            let rel = (line_prefix.len() + (cursor - seg.start)).min(emitted.len());
            mapped = Some(out.len() + rel);
        }
        out.push_str(&emitted);
        if i + 1 < segs.len() || newline_terminated {
            out.push('\n');
        }
    }

    match kind {
        FragmentKind::Comment => {
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
        FragmentKind::Str => {
            if newline_terminated {
                out.push_str(prefix);
            }
        }
        FragmentKind::Region => {}
    }

    let cursor = mapped.unwrap_or(out.len());
    Rendered { text: out, cursor }
}

/// Replace `span` with the rendered text as one atomic edit.
pub(crate) fn apply<D: HostDocument>(
    doc: &mut D,
    span: Range<usize>,
    rendered: &Rendered,
) -> (Range<usize>, usize) {
    doc.replace(span.clone(), &rendered.text);
    let new_span = span.start..span.start + rendered.text.len();
    let cursor = span.start + rendered.cursor;
    (new_span, cursor)
}
