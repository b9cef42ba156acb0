//! Normalization: strip the prefix from every line of the editable span
//! and translate the host cursor into the normalized text.

use std::ops::Range;

use crate::document::lines;
use crate::fragment::FragmentKind;
use crate::settings::BlankLinePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Stripped {
    pub text: String,
    /// Normalized offset corresponding to the host cursor.
    pub cursor: usize,
}

/// Strip `prefix` from each line of `span`.
///
/// A string fragment's first line is copied verbatim: its decoration
/// was excluded from the span, mirroring the injector. A line not
/// starting with the prefix yields an empty line rather than an error.
pub(crate) fn strip(
    source: &str,
    span: &Range<usize>,
    prefix: &str,
    kind: FragmentKind,
    policy: BlankLinePolicy,
    host_cursor: usize,
) -> Stripped {
    let segs: Vec<Range<usize>> = lines::line_spans(source, span.clone()).collect();
    let newline_terminated = source[span.clone()].ends_with('\n');
    let mut text = String::new();
    let mut cursor = if host_cursor <= span.start {
        Some(0)
    } else {
        None
    };

    for (i, seg) in segs.iter().enumerate() {
        let line = &source[seg.clone()];
        let emitted: &str = if kind == FragmentKind::Str && i == 0 {
            line
        } else if let Some(rest) = line.strip_prefix(prefix) {
            if rest.trim().is_empty() && policy != BlankLinePolicy::None {
                ""
            } else {
                rest
            }
        } else {
            ""
        };
        if cursor.is_none() && host_cursor >= seg.start && host_cursor <= seg.end {
            let removed = line.len() - emitted.len();
            let rel = (host_cursor - seg.start)
                .saturating_sub(removed)
                .min(emitted.len());
            cursor = Some(text.len() + rel);
        }
        text.push_str(emitted);
        if i + 1 < segs.len() || newline_terminated {
            text.push('\n');
        }
    }

    let cursor = cursor.unwrap_or(text.len());
    Stripped { text, cursor }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_comment(source: &str, prefix: &str) -> Stripped {
        strip(
            source,
            &(0..source.len()),
            prefix,
            FragmentKind::Comment,
            BlankLinePolicy::None,
            0,
        )
    }

    #[test]
    fn removes_prefix_from_each_line() {
        let out = strip_comment(" * Hello\n * World\n", " * ");
        assert_eq!(out.text, "Hello\nWorld\n");
    }

    #[test]
    fn malformed_line_becomes_empty() {
        let out = strip_comment(" * a\nOOPS\n * b\n", " * ");
        assert_eq!(out.text, "a\n\nb\n");
    }

    #[test]
    fn span_without_trailing_newline() {
        let out = strip_comment("// a\n// b", "// ");
        assert_eq!(out.text, "a\nb");
    }

    #[test]
    fn blank_remainder_kept_verbatim_under_none() {
        let out = strip_comment(" *  \n * x\n", " * ");
        assert_eq!(out.text, " \nx\n");
    }

    #[test]
    fn blank_remainder_dropped_under_trim() {
        let source = " *  \n * x\n";
        let out = strip(
            source,
            &(0..source.len()),
            " * ",
            FragmentKind::Comment,
            BlankLinePolicy::Trim,
            0,
        );
        assert_eq!(out.text, "\nx\n");
    }

    #[test]
    fn string_first_line_is_verbatim() {
        let source = "line one\n  line two";
        let out = strip(
            source,
            &(0..source.len()),
            "  ",
            FragmentKind::Str,
            BlankLinePolicy::None,
            0,
        );
        assert_eq!(out.text, "line one\nline two");
    }

    #[test]
    fn cursor_before_span_maps_to_start() {
        let source = "xx * a\n";
        let out = strip(
            source,
            &(2..source.len()),
            "",
            FragmentKind::Region,
            BlankLinePolicy::None,
            0,
        );
        assert_eq!(out.cursor, 0);
    }

    #[test]
    fn cursor_inside_content_maps_past_prefix() {
        let source = " * Hello\n * World\n";
        // Cursor on the `r` of World: offset 14.
        let out = strip(
            source,
            &(0..source.len()),
            " * ",
            FragmentKind::Comment,
            BlankLinePolicy::None,
            14,
        );
        assert_eq!(&out.text[out.cursor..out.cursor + 3], "rld");
    }

    #[test]
    fn cursor_inside_prefix_clamps_to_line_start() {
        let source = " * Hello\n * World\n";
        // Cursor on the `*` of the second line: offset 10.
        let out = strip(
            source,
            &(0..source.len()),
            " * ",
            FragmentKind::Comment,
            BlankLinePolicy::None,
            10,
        );
        assert_eq!(out.cursor, 6);
        assert_eq!(&out.text[out.cursor..], "World\n");
    }

    #[test]
    fn cursor_after_span_maps_to_end() {
        let source = "// a\nxxx";
        let out = strip(
            source,
            &(0..5),
            "// ",
            FragmentKind::Comment,
            BlankLinePolicy::None,
            7,
        );
        assert_eq!(out.cursor, out.text.len());
    }
}
