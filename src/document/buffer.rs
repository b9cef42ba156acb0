//! The host document seam: an editable text store with stable positions.
//!
//! The core never assumes a particular text representation; everything it
//! needs from the host is expressed by [`HostDocument`]. [`Buffer`] is the
//! reference implementation used by the provided tests and by embedders
//! without their own document type.

use std::ops::Range;

/// Which side of an edit a stable position sticks to when text is
/// inserted exactly at its offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Stay before text inserted at the position.
    Left,
    /// Move after text inserted at the position.
    Right,
}

/// Handle for a stable position issued by a host document.
///
/// The host adjusts the underlying offset on every edit occurring before
/// it, so the handle stays valid across unrelated edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor(u32);

/// An editable text store the core can extract from and restore into.
pub trait HostDocument {
    /// Total length in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the text in `range`.
    fn read_range(&self, range: Range<usize>) -> String;

    /// Insert `text` at `offset`.
    fn insert(&mut self, offset: usize, text: &str);

    /// Delete the text in `range`.
    fn delete_range(&mut self, range: Range<usize>);

    /// Replace `range` with `text` as a single edit: stable positions
    /// outside the range observe one adjustment, never a transient
    /// deleted state.
    fn replace(&mut self, range: Range<usize>, text: &str);

    /// Create a stable position at `offset`.
    fn create_anchor(&mut self, offset: usize, bias: Bias) -> Anchor;

    /// Current offset of `anchor`, or `None` if the host discarded it.
    fn anchor_offset(&self, anchor: Anchor) -> Option<usize>;

    /// Release a stable position.
    fn release_anchor(&mut self, anchor: Anchor);
}

#[derive(Debug, Clone, Copy)]
struct AnchorState {
    offset: usize,
    bias: Bias,
}

/// In-memory host document with marker-style anchor adjustment.
#[derive(Debug, Default)]
pub struct Buffer {
    text: String,
    anchors: Vec<Option<AnchorState>>,
}

impl Buffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            anchors: Vec::new(),
        }
    }

    /// The full document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    fn adjust_anchors(&mut self, range: &Range<usize>, inserted: usize) {
        for state in self.anchors.iter_mut().flatten() {
            state.offset = adjusted_offset(state.offset, state.bias, range, inserted);
        }
    }
}

/// New offset of a stable position after `range` was replaced by
/// `inserted` bytes, applied as one edit.
fn adjusted_offset(offset: usize, bias: Bias, range: &Range<usize>, inserted: usize) -> usize {
    if offset < range.start {
        offset
    } else if offset == range.start {
        match bias {
            Bias::Left => offset,
            Bias::Right => range.start + inserted,
        }
    } else if offset >= range.end {
        offset - (range.end - range.start) + inserted
    } else {
        // Strictly inside the replaced range.
        match bias {
            Bias::Left => range.start,
            Bias::Right => range.start + inserted,
        }
    }
}

impl HostDocument for Buffer {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn read_range(&self, range: Range<usize>) -> String {
        self.text[range].to_string()
    }

    fn insert(&mut self, offset: usize, text: &str) {
        self.replace(offset..offset, text);
    }

    fn delete_range(&mut self, range: Range<usize>) {
        self.replace(range, "");
    }

    fn replace(&mut self, range: Range<usize>, text: &str) {
        self.text.replace_range(range.clone(), text);
        self.adjust_anchors(&range, text.len());
    }

    fn create_anchor(&mut self, offset: usize, bias: Bias) -> Anchor {
        let state = AnchorState {
            offset: offset.min(self.text.len()),
            bias,
        };
        self.anchors.push(Some(state));
        Anchor(self.anchors.len() as u32 - 1)
    }

    fn anchor_offset(&self, anchor: Anchor) -> Option<usize> {
        self.anchors
            .get(anchor.0 as usize)
            .copied()
            .flatten()
            .map(|state| state.offset)
    }

    fn release_anchor(&mut self, anchor: Anchor) {
        if let Some(slot) = self.anchors.get_mut(anchor.0 as usize) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_replace() {
        let mut buf = Buffer::new("hello world");
        assert_eq!(buf.read_range(0..5), "hello");
        buf.replace(0..5, "goodbye");
        assert_eq!(buf.text(), "goodbye world");
    }

    #[test]
    fn anchor_shifts_after_earlier_insert() {
        let mut buf = Buffer::new("abc def");
        let a = buf.create_anchor(4, Bias::Right);
        buf.insert(0, "xy ");
        assert_eq!(buf.anchor_offset(a), Some(7));
    }

    #[test]
    fn anchor_unmoved_by_later_edit() {
        let mut buf = Buffer::new("abc def");
        let a = buf.create_anchor(2, Bias::Left);
        buf.replace(4..7, "xyz123");
        assert_eq!(buf.anchor_offset(a), Some(2));
    }

    #[test]
    fn bias_at_insertion_point() {
        let mut buf = Buffer::new("ab");
        let left = buf.create_anchor(1, Bias::Left);
        let right = buf.create_anchor(1, Bias::Right);
        buf.insert(1, "--");
        assert_eq!(buf.anchor_offset(left), Some(1));
        assert_eq!(buf.anchor_offset(right), Some(3));
    }

    #[test]
    fn anchor_inside_replaced_range_snaps() {
        let mut buf = Buffer::new("0123456789");
        let left = buf.create_anchor(5, Bias::Left);
        let right = buf.create_anchor(5, Bias::Right);
        buf.replace(3..8, "x");
        assert_eq!(buf.anchor_offset(left), Some(3));
        assert_eq!(buf.anchor_offset(right), Some(4));
    }

    #[test]
    fn replace_is_one_edit_not_delete_then_insert() {
        // An anchor at the end of the replaced range shifts with the
        // edit as a whole.
        let mut one = Buffer::new("aaXXbb");
        let a1 = one.create_anchor(4, Bias::Left);
        one.replace(2..4, "Y");
        assert_eq!(one.anchor_offset(a1), Some(3));

        // A separate delete+insert drags the same anchor to the
        // deletion point first, so the insert then lands after it: the
        // second, observable position update the atomic replace avoids.
        let mut two = Buffer::new("aaXXbb");
        let a2 = two.create_anchor(4, Bias::Left);
        two.delete_range(2..4);
        two.insert(2, "Y");
        assert_eq!(two.anchor_offset(a2), Some(2));
    }

    #[test]
    fn released_anchor_resolves_to_none() {
        let mut buf = Buffer::new("abc");
        let a = buf.create_anchor(1, Bias::Left);
        buf.release_anchor(a);
        assert_eq!(buf.anchor_offset(a), None);
    }
}
