//! Host document abstraction and text utilities.
//!
//! This module provides:
//! - `HostDocument` for the editable text store the core works against
//! - `Buffer`, an in-memory implementation with stable positions
//! - line-span helpers used by the locator and the transforms

mod buffer;
pub(crate) mod lines;

pub use buffer::{Anchor, Bias, Buffer, HostDocument};
