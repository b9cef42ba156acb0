//! Error kinds surfaced by extraction and session operations.

use thiserror::Error;

use crate::session::SessionId;

/// Everything that can go wrong while locating, extracting, or writing
/// back a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No string or comment was found near the requested offset and no
    /// explicit region was supplied.
    #[error("no string or comment found near offset {offset}")]
    NotFound { offset: usize },

    /// The string literal has no text between its delimiters, so the
    /// editable interior would be ambiguous.
    #[error("string at offset {offset} has no text between its delimiters")]
    EmptyStringRefused { offset: usize },

    /// The host range backing a session no longer exists, e.g. the
    /// surrounding text was deleted by an unrelated edit.
    #[error("the text backing session {session} no longer exists")]
    FragmentVanished { session: SessionId },

    /// The session id was already closed or abandoned.
    #[error("session {session} is not registered")]
    StaleSession { session: SessionId },
}

pub type Result<T> = std::result::Result<T, Error>;
