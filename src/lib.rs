//! Round-trip extraction of embedded text fragments.
//!
//! popedit pulls a program comment, a string literal, or an arbitrary
//! selected region out of a host document into normalized plain text,
//! lets the caller edit it in isolation, and writes the edited text back
//! with the stripped decoration (comment markers, string delimiters,
//! per-line indentation) byte-exactly restored.
//!
//! The crate is generic over its two host seams: [`HostDocument`], the
//! editable text store, and [`Classifier`], the oracle for string and
//! comment boundaries. [`Buffer`] and [`DelimiterClassifier`] are
//! provided implementations. [`SessionRegistry`] ties the forward path
//! (locate, extract, normalize) and the return path (restore) together
//! and enforces at most one live session per host region.

mod document;
mod error;
mod fragment;
mod session;
mod settings;
mod syntax;
mod transform;

pub use document::{Anchor, Bias, Buffer, HostDocument};
pub use error::{Error, Result};
pub use fragment::{from_region, locate, string_interior, Fragment, FragmentKind, Located};
pub use session::{Opened, Session, SessionId, SessionRegistry};
pub use settings::{
    discover_settings, load_settings, BlankLinePolicy, Settings, DEFAULT_COMMENT_SKIP_PATTERN,
    DEFAULT_PROBE_LIMIT, SETTINGS_FILE,
};
pub use syntax::{Classifier, Construct, ConstructKind, DelimiterClassifier, LanguageSyntax};
pub use transform::{extract, restore, Extraction};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_can_be_created() {
        let registry = SessionRegistry::default();
        assert!(registry.is_empty());
    }

    #[test]
    fn end_to_end_comment_edit() {
        let registry = SessionRegistry::default();
        let classifier = DelimiterClassifier::new(LanguageSyntax::c());
        let mut doc = Buffer::new("// greeting\n");
        let opened = registry.extract_near(&mut doc, &classifier, 4).unwrap();
        assert_eq!(opened.text, "greeting\n");
        registry
            .close(&mut doc, opened.session, "farewell\n", 0)
            .unwrap();
        assert_eq!(doc.text(), "// farewell\n");
    }
}
