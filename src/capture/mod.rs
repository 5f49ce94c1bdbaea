//! Capture backend interface
//!
//! The opaque encoder side of a recording session, consumed by the
//! controller through the [`CaptureBackend`] trait.

pub mod traits;

pub use traits::{BackendError, BackendResult, CaptureBackend, CaptureHandle};
