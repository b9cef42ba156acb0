//! Session lifecycle: at most one live extraction per host region.
//!
//! The registry owns every active session, hands back the existing one
//! when a request overlaps it, and runs the injector on update/close.

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

use crate::document::{Bias, HostDocument};
use crate::error::{Error, Result};
use crate::fragment::{self, Fragment, FragmentKind, Located};
use crate::settings::Settings;
use crate::syntax::Classifier;
use crate::transform;

/// Identifier of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live association between a fragment, its prefix, and the last
/// normalized text written through it.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    fragment: Fragment,
    prefix: String,
    last_text: String,
    last_span_len: usize,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn kind(&self) -> FragmentKind {
        self.fragment.kind
    }

    /// The structural prefix restored to every line on write-back.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The normalized text most recently written (the extraction output
    /// until the first update).
    pub fn text(&self) -> &str {
        &self.last_text
    }

    /// Read-only overlay state for the interactive layer.
    pub fn locked(&self) -> bool {
        self.fragment.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.fragment.locked = locked;
    }

    /// Current editable span, resolved through the fragment's stable
    /// positions.
    pub fn span<D: HostDocument>(&self, doc: &D) -> Option<Range<usize>> {
        let start = doc.anchor_offset(self.fragment.start)?;
        let end = doc.anchor_offset(self.fragment.end)?;
        (start <= end).then_some(start..end)
    }

    /// Suggested editing width: `full` reduced by the prefix length when
    /// the settings ask for it.
    pub fn fill_width(&self, full: usize, settings: &Settings) -> usize {
        if settings.adjust_fill_width {
            full.saturating_sub(self.prefix.len())
        } else {
            full
        }
    }
}

/// Everything the editing surface needs after opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    pub session: SessionId,
    /// Normalized text to edit.
    pub text: String,
    /// Offset into `text` corresponding to the host cursor.
    pub cursor: usize,
    /// `false` when an existing overlapping session was returned.
    pub created: bool,
}

type Hook = Box<dyn Fn(&Session) + Send + Sync>;

/// Owner of all live sessions.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
    next_id: AtomicU64,
    settings: Settings,
    on_session_ready: Vec<Hook>,
    on_before_close: Vec<Hook>,
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SessionRegistry {
    pub fn new(settings: Settings) -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(0),
            settings,
            on_session_ready: Vec::new(),
            on_before_close: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Borrow a live session. Hooks and callers must not hold this
    /// across registry calls.
    pub fn session(
        &self,
        id: SessionId,
    ) -> Option<dashmap::mapref::one::Ref<'_, SessionId, Session>> {
        self.sessions.get(&id)
    }

    /// Run `hook` for every newly created session, before it is handed
    /// to the caller.
    pub fn on_session_ready(&mut self, hook: impl Fn(&Session) + Send + Sync + 'static) {
        self.on_session_ready.push(Box::new(hook));
    }

    /// Run `hook` just before a session is finalized by `close`.
    pub fn on_before_close(&mut self, hook: impl Fn(&Session) + Send + Sync + 'static) {
        self.on_before_close.push(Box::new(hook));
    }

    /// Open a session on the comment or string nearest `offset`.
    pub fn extract_near<D: HostDocument, C: Classifier>(
        &self,
        doc: &mut D,
        classifier: &C,
        offset: usize,
    ) -> Result<Opened> {
        let source = doc.read_range(0..doc.len());
        let located = fragment::locate(&source, classifier, offset, &self.settings)?;
        self.open_located(doc, &source, classifier, located, offset)
    }

    /// Open a session on an explicit selection.
    pub fn extract_region<D: HostDocument, C: Classifier>(
        &self,
        doc: &mut D,
        classifier: &C,
        start: usize,
        end: usize,
    ) -> Result<Opened> {
        let source = doc.read_range(0..doc.len());
        self.open_located(doc, &source, classifier, fragment::from_region(start, end), start)
    }

    /// Open a session on a fragment the caller has already located,
    /// bypassing the locator's refinements.
    pub fn open_fragment<D: HostDocument, C: Classifier>(
        &self,
        doc: &mut D,
        classifier: &C,
        located: Located,
        cursor: usize,
    ) -> Result<Opened> {
        let source = doc.read_range(0..doc.len());
        self.open_located(doc, &source, classifier, located, cursor)
    }

    fn open_located<D: HostDocument, C: Classifier>(
        &self,
        doc: &mut D,
        source: &str,
        classifier: &C,
        located: Located,
        cursor: usize,
    ) -> Result<Opened> {
        if let Some(existing) = self.reenter(doc, &located.span) {
            return Ok(existing);
        }
        let extraction =
            transform::extract(source, &located, classifier.syntax(), &self.settings, cursor)?;
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let fragment = Fragment {
            kind: extraction.kind,
            start: doc.create_anchor(extraction.span.start, Bias::Right),
            end: doc.create_anchor(extraction.span.end, Bias::Left),
            locked: true,
        };
        let session = Session {
            id,
            fragment,
            prefix: extraction.prefix,
            last_text: extraction.text.clone(),
            last_span_len: extraction.span.len(),
        };
        for hook in &self.on_session_ready {
            hook(&session);
        }
        self.sessions.insert(id, session);
        debug!(%id, kind = ?extraction.kind, span = ?extraction.span, "session opened");
        Ok(Opened {
            session: id,
            text: extraction.text,
            cursor: extraction.cursor,
            created: true,
        })
    }

    /// An open over a span already claimed by a live session re-enters
    /// that session instead of creating a second one.
    fn reenter<D: HostDocument>(&self, doc: &D, requested: &Range<usize>) -> Option<Opened> {
        for entry in self.sessions.iter() {
            let Some(span) = entry.span(doc) else {
                continue;
            };
            if overlaps(&span, requested) {
                debug!(id = %entry.id, "re-entering overlapping session");
                return Some(Opened {
                    session: entry.id,
                    text: entry.last_text.clone(),
                    cursor: 0,
                    created: false,
                });
            }
        }
        None
    }

    /// Write edited text back into the host document.
    ///
    /// A call with text identical to the last write is a no-op and
    /// returns `None`; otherwise the new host cursor offset is returned.
    /// `persist` is forwarded intent for the interactive layer (saving
    /// the host document is not the core's concern); the transform is
    /// identical either way.
    pub fn update<D: HostDocument>(
        &self,
        doc: &mut D,
        id: SessionId,
        edited: &str,
        cursor: usize,
        persist: bool,
    ) -> Result<Option<usize>> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or(Error::StaleSession { session: id })?;
        if edited == entry.last_text {
            debug!(%id, "update with unchanged text; no host mutation");
            return Ok(None);
        }
        let host_cursor = Self::write_back(doc, &mut entry, edited, cursor, &self.settings)?;
        debug!(%id, persist, "session updated");
        Ok(Some(host_cursor))
    }

    /// Finalize: a last write-back, then release the session.
    pub fn close<D: HostDocument>(
        &self,
        doc: &mut D,
        id: SessionId,
        edited: &str,
        cursor: usize,
    ) -> Result<usize> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or(Error::StaleSession { session: id })?;
        for hook in &self.on_before_close {
            hook(&entry);
        }
        let host_cursor = if edited == entry.last_text {
            // Nothing to write; report where the cursor already lands.
            let span = entry.span(doc).ok_or(Error::FragmentVanished { session: id })?;
            let rendered = transform::render(
                edited,
                &entry.prefix,
                entry.fragment.kind,
                self.settings.blank_line_policy,
                cursor,
            );
            span.start + rendered.cursor
        } else {
            Self::write_back(doc, &mut entry, edited, cursor, &self.settings)?
        };
        drop(entry);
        if let Some((_, session)) = self.sessions.remove(&id) {
            doc.release_anchor(session.fragment.start);
            doc.release_anchor(session.fragment.end);
        }
        debug!(%id, "session closed");
        Ok(host_cursor)
    }

    /// Discard a session without touching the host document.
    pub fn abandon<D: HostDocument>(&self, doc: &mut D, id: SessionId) -> Result<()> {
        let (_, session) = self
            .sessions
            .remove(&id)
            .ok_or(Error::StaleSession { session: id })?;
        doc.release_anchor(session.fragment.start);
        doc.release_anchor(session.fragment.end);
        debug!(%id, "session abandoned");
        Ok(())
    }

    fn write_back<D: HostDocument>(
        doc: &mut D,
        session: &mut Session,
        edited: &str,
        cursor: usize,
        settings: &Settings,
    ) -> Result<usize> {
        let id = session.id;
        let span = session
            .span(doc)
            .ok_or(Error::FragmentVanished { session: id })?;
        if span.is_empty() && session.last_span_len > 0 {
            return Err(Error::FragmentVanished { session: id });
        }
        let (new_span, host_cursor) = transform::restore(
            doc,
            span,
            edited,
            &session.prefix,
            session.fragment.kind,
            settings.blank_line_policy,
            cursor,
        );
        doc.release_anchor(session.fragment.start);
        doc.release_anchor(session.fragment.end);
        session.fragment.start = doc.create_anchor(new_span.start, Bias::Right);
        session.fragment.end = doc.create_anchor(new_span.end, Bias::Left);
        session.last_span_len = new_span.len();
        session.last_text = edited.to_string();
        Ok(host_cursor)
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    (a.start < b.end && b.start < a.end) || a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Buffer;
    use crate::syntax::{DelimiterClassifier, LanguageSyntax};

    fn c() -> DelimiterClassifier {
        DelimiterClassifier::new(LanguageSyntax::c())
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Settings::default())
    }

    const BLOCK: &str = "/*\n * Hello\n * World\n */\nint x;\n";

    #[test]
    fn open_update_close() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        assert!(opened.created);
        assert_eq!(opened.text, "Hello\nWorld\n");

        let cursor = registry
            .update(&mut doc, opened.session, "Hello\nWorld\nFoo\n", 0, false)
            .unwrap();
        assert!(cursor.is_some());
        assert_eq!(doc.text(), "/*\n * Hello\n * World\n * Foo\n */\nint x;\n");

        registry
            .close(&mut doc, opened.session, "Hello\nWorld\nFoo\n", 0)
            .unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn unchanged_update_is_a_no_op() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        let before = doc.text().to_string();
        let result = registry
            .update(&mut doc, opened.session, &opened.text, 0, false)
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(doc.text(), before);
    }

    #[test]
    fn overlapping_open_returns_existing_session() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let first = registry.extract_near(&mut doc, &c(), 5).unwrap();
        let second = registry.extract_near(&mut doc, &c(), 14).unwrap();
        assert_eq!(first.session, second.session);
        assert!(!second.created);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn abandon_discards_without_mutation() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        registry
            .update(&mut doc, opened.session, "changed\n", 0, false)
            .unwrap();
        let after_update = doc.text().to_string();
        registry.abandon(&mut doc, opened.session).unwrap();
        assert_eq!(doc.text(), after_update);
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_session_errors() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        registry.abandon(&mut doc, opened.session).unwrap();
        let err = registry
            .update(&mut doc, opened.session, "x\n", 0, false)
            .unwrap_err();
        assert_eq!(
            err,
            Error::StaleSession {
                session: opened.session
            }
        );
    }

    #[test]
    fn vanished_fragment_is_reported() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        // An external edit deletes the whole comment.
        doc.delete_range(0..25);
        let err = registry
            .update(&mut doc, opened.session, "edited\n", 0, false)
            .unwrap_err();
        assert_eq!(
            err,
            Error::FragmentVanished {
                session: opened.session
            }
        );
    }

    #[test]
    fn span_follows_unrelated_edits() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        doc.insert(0, "int before;\n");
        let session = registry.session(opened.session).unwrap();
        let span = session.span(&doc).unwrap();
        assert_eq!(&doc.text()[span], " * Hello\n * World\n");
    }

    #[test]
    fn update_after_unrelated_edit_targets_moved_span() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        doc.insert(0, "int before;\n");
        registry
            .update(&mut doc, opened.session, "Shifted\n", 0, false)
            .unwrap();
        assert_eq!(doc.text(), "int before;\n/*\n * Shifted\n */\nint x;\n");
    }

    #[test]
    fn ready_and_close_hooks_fire() {
        use std::sync::atomic::AtomicUsize;
        use std::sync::Arc;

        let ready = Arc::new(AtomicUsize::new(0));
        let closing = Arc::new(AtomicUsize::new(0));
        let mut registry = registry();
        let r = Arc::clone(&ready);
        registry.on_session_ready(move |_| {
            r.fetch_add(1, Ordering::Relaxed);
        });
        let cl = Arc::clone(&closing);
        registry.on_before_close(move |session| {
            assert!(!session.prefix().is_empty());
            cl.fetch_add(1, Ordering::Relaxed);
        });

        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        registry
            .close(&mut doc, opened.session, &opened.text, 0)
            .unwrap();
        assert_eq!(ready.load(Ordering::Relaxed), 1);
        assert_eq!(closing.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn fill_width_adjusts_by_prefix_length() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        let session = registry.session(opened.session).unwrap();
        assert_eq!(session.fill_width(70, registry.settings()), 67);

        let fixed = Settings {
            adjust_fill_width: false,
            ..Settings::default()
        };
        assert_eq!(session.fill_width(70, &fixed), 70);
    }

    #[test]
    fn sessions_open_locked_for_the_interactive_layer() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        let mut entry = registry.sessions.get_mut(&opened.session).unwrap();
        assert!(entry.locked());
        entry.set_locked(false);
        assert!(!entry.locked());
    }

    #[test]
    fn closing_unmodified_session_leaves_document_intact() {
        let registry = registry();
        let mut doc = Buffer::new(BLOCK);
        let opened = registry.extract_near(&mut doc, &c(), 5).unwrap();
        registry
            .close(&mut doc, opened.session, &opened.text, 0)
            .unwrap();
        assert_eq!(doc.text(), BLOCK);
    }
}
